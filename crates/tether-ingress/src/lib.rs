//! Publishes HTTP ingress rules for an owner resource.
//!
//! The owner's spec lists hosts and the paths each should route. This
//! extension rejects malformed hosts and paths, defaults missing paths to
//! `/`, and keeps one `networking.k8s.io/v1` Ingress per owner in sync,
//! routing every path to the owner's service.

pub mod config;
pub mod k8s;

use serde::{Deserialize, Serialize};
use tether_guest::{Client, Extension, GuestError, Host, Owner, ValidationError, ValidationType};

use crate::config::IngressConfig;
use crate::k8s::{
    HttpIngressPath, HttpIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, ObjectHeader, ObjectMeta, OwnerReference, ServiceBackendPort,
};

/// Label added to every owner this extension manages.
pub const CONTROLLED_LABEL: &str = "is-wasm-controlled";

const DEFAULT_PATH: &str = "/";

/// The extension's slice of the owner spec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    #[serde(default)]
    pub ingresses: Vec<HostRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostRule {
    pub host: String,
    /// `None` until defaulting fills it in.
    #[serde(default)]
    pub paths: Option<Vec<String>>,
}

impl HostRule {
    fn paths_or_default(&self) -> Vec<String> {
        match &self.paths {
            Some(paths) if !paths.is_empty() => paths.clone(),
            _ => vec![DEFAULT_PATH.to_string()],
        }
    }
}

// ─── Validation ─────────────────────────────────────────────────────────

fn check_host(index: usize, rule: &HostRule, findings: &mut Vec<ValidationError>) {
    if !rule.host.contains('.') {
        findings.push(ValidationError::new(
            format!("ingresses[{index}].host"),
            "must contain a dot",
            &rule.host,
        ));
    }
}

fn check_path(index: usize, path_index: usize, path: &str, findings: &mut Vec<ValidationError>) {
    if !path.starts_with('/') {
        findings.push(ValidationError::new(
            format!("ingresses[{index}].paths[{path_index}]"),
            "must start with a slash",
            path,
        ));
    }
}

/// Every problem with `spec`, in document order.
pub fn validate_spec(spec: &Spec) -> Vec<ValidationError> {
    let mut findings = Vec::new();
    for (i, rule) in spec.ingresses.iter().enumerate() {
        check_host(i, rule, &mut findings);
        for (j, path) in rule.paths.iter().flatten().enumerate() {
            check_path(i, j, path, &mut findings);
        }
    }
    findings
}

// ─── Desired state ──────────────────────────────────────────────────────

/// The ingress `spec` asks for under `owner`.
pub fn desired_ingress(owner: &Owner, spec: &Spec, config: &IngressConfig) -> Ingress {
    let backend = IngressBackend {
        service: IngressServiceBackend {
            name: owner.name.clone(),
            port: ServiceBackendPort {
                name: config.port_name.clone(),
            },
        },
    };

    let rules = spec
        .ingresses
        .iter()
        .map(|rule| IngressRule {
            host: rule.host.clone(),
            http: HttpIngressRuleValue {
                paths: rule
                    .paths_or_default()
                    .into_iter()
                    .map(|path| HttpIngressPath {
                        path,
                        path_type: config.path_type.clone(),
                        backend: backend.clone(),
                    })
                    .collect(),
            },
        })
        .collect();

    Ingress {
        api_version: k8s::API_VERSION.into(),
        kind: k8s::KIND.into(),
        metadata: ObjectMeta {
            name: config.ingress_name(&owner.name),
            namespace: owner.namespace.clone(),
            resource_version: None,
            labels: [(CONTROLLED_LABEL.to_string(), "true".to_string())].into(),
            owner_references: vec![OwnerReference::controller(owner)],
        },
        spec: k8s::IngressSpec {
            ingress_class_name: Some(config.class_name.clone()),
            rules,
        },
    }
}

/// Create `desired`, or overwrite the existing object of the same name
/// using its resource version as the concurrency token.
pub fn upsert<H: Host + ?Sized>(
    client: &Client<'_, H>,
    desired: &Ingress,
) -> Result<Ingress, GuestError> {
    let gvr = k8s::ingresses();
    let name = &desired.metadata.name;
    match client.create_resource(&gvr, desired) {
        Ok(created) => {
            tracing::info!(%name, "created ingress");
            Ok(created)
        }
        Err(err) if err.is_already_exists() => {
            let current: ObjectHeader = client.get_resource(&gvr, name)?;
            let mut next = desired.clone();
            next.metadata.resource_version = current.metadata.resource_version;
            tracing::debug!(
                %name,
                version = ?next.metadata.resource_version,
                "ingress exists, updating"
            );
            client.update_resource(&gvr, &next)
        }
        Err(err) => Err(err),
    }
}

// ─── Extension ──────────────────────────────────────────────────────────

pub struct IngressExtension;

impl Extension for IngressExtension {
    type Spec = Spec;

    fn validate(kind: ValidationType, spec: &Spec, _old: Option<&Spec>) -> Vec<ValidationError> {
        if kind == ValidationType::Delete {
            return Vec::new();
        }
        validate_spec(spec)
    }

    fn defaulting(spec: &mut Spec) {
        for rule in &mut spec.ingresses {
            if rule.paths.as_ref().map_or(true, Vec::is_empty) {
                rule.paths = Some(vec![DEFAULT_PATH.to_string()]);
            }
        }
    }

    fn sync<H: Host + ?Sized>(
        client: &Client<'_, H>,
        owner: &Owner,
        spec: &Spec,
    ) -> Result<(), GuestError> {
        let config = IngressConfig::from_env();
        client.add_label(CONTROLLED_LABEL, "true")?;
        upsert(client, &desired_ingress(owner, spec, &config))?;
        Ok(())
    }

    fn delete<H: Host + ?Sized>(client: &Client<'_, H>, owner: &Owner) -> Result<(), GuestError> {
        let name = IngressConfig::from_env().ingress_name(&owner.name);
        match client.delete_resource(&k8s::ingresses(), &name) {
            Err(err) if err.is_not_found() => {
                tracing::debug!(%name, "ingress already gone");
                Ok(())
            }
            result => result,
        }
    }
}

tether_guest::register_extension!(IngressExtension);
