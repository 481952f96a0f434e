//! Extension manifest parsing and validation.
//!
//! Parses `extension.toml`, which declares what an extension is, which owner
//! kinds it attaches to, which admission webhooks it takes part in and which
//! resources it may touch through the cross-resource calls.

use serde::{Deserialize, Serialize};

use crate::error::GuestError;
use crate::proto::GroupVersionResource;

/// Extension manifest parsed from `extension.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub extension: ExtensionMeta,
    /// Owner kinds this extension is invoked for.
    pub targets: Vec<String>,
    /// Run for every owner, even when it carries no spec for this extension.
    #[serde(default)]
    pub always: bool,
    #[serde(default)]
    pub webhooks: Webhooks,
    #[serde(default)]
    pub resources: Vec<ResourceGrant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionMeta {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Webhooks {
    #[serde(default)]
    pub validation: bool,
    #[serde(default)]
    pub defaulting: bool,
}

/// Cross-resource methods a grant can allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Create,
    Update,
    Delete,
}

/// Permission to call some methods on one resource collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGrant {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub resource: String,
    pub methods: Vec<Method>,
    /// ConfigMap whose upper-case keys become the extension's environment.
    #[serde(default)]
    pub config_map: Option<String>,
}

impl ResourceGrant {
    pub fn gvr(&self) -> GroupVersionResource {
        GroupVersionResource::new(&self.group, &self.version, &self.resource)
    }

    fn matches(&self, gvr: &GroupVersionResource) -> bool {
        self.group == gvr.group && self.version == gvr.version && self.resource == gvr.resource
    }
}

// ─── Validation helpers ─────────────────────────────────────────────

/// `^[a-z][a-z0-9-]{1,63}$`
fn validate_name(name: &str) -> Result<(), GuestError> {
    let len = name.len();
    if !(2..=64).contains(&len) {
        return Err(GuestError::Manifest(format!(
            "extension name must be 2-64 characters, got {len}"
        )));
    }

    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        if !first.is_ascii_lowercase() {
            return Err(GuestError::Manifest(format!(
                "extension name must start with a lowercase letter, got '{first}'"
            )));
        }
    }

    for ch in chars {
        if !ch.is_ascii_lowercase() && !ch.is_ascii_digit() && ch != '-' {
            return Err(GuestError::Manifest(format!(
                "extension name contains invalid character '{ch}'"
            )));
        }
    }

    Ok(())
}

fn validate_semver(value: &str, field_name: &str) -> Result<(), GuestError> {
    semver::Version::parse(value).map_err(|_| {
        GuestError::Manifest(format!("{field_name} is not valid semver: '{value}'"))
    })?;
    Ok(())
}

fn validate_grant(index: usize, grant: &ResourceGrant) -> Result<(), GuestError> {
    if grant.version.is_empty() || grant.resource.is_empty() {
        return Err(GuestError::Manifest(format!(
            "resources[{index}] needs both version and resource"
        )));
    }
    if grant.methods.is_empty() {
        return Err(GuestError::Manifest(format!(
            "resources[{index}].methods must not be empty"
        )));
    }
    if let Some(ref cm) = grant.config_map {
        if cm.is_empty() {
            return Err(GuestError::Manifest(format!(
                "resources[{index}].config_map must not be empty"
            )));
        }
    }
    Ok(())
}

impl Manifest {
    pub fn parse(toml_str: &str) -> Result<Self, GuestError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn validate(&self) -> Result<(), GuestError> {
        // ── Metadata ────────────────────────────────────────────────
        validate_name(&self.extension.name)?;
        validate_semver(&self.extension.version, "extension.version")?;

        let desc_len = self.extension.description.len();
        if desc_len == 0 || desc_len > 500 {
            return Err(GuestError::Manifest(format!(
                "extension.description must be 1-500 characters, got {desc_len}"
            )));
        }

        // ── Targets ─────────────────────────────────────────────────
        if self.targets.is_empty() {
            return Err(GuestError::Manifest("targets must not be empty".into()));
        }
        if let Some(blank) = self.targets.iter().position(|t| t.trim().is_empty()) {
            return Err(GuestError::Manifest(format!("targets[{blank}] is empty")));
        }

        // ── Resources ───────────────────────────────────────────────
        for (i, grant) in self.resources.iter().enumerate() {
            validate_grant(i, grant)?;
        }

        Ok(())
    }

    pub fn parse_and_validate(toml_str: &str) -> Result<Self, GuestError> {
        let manifest = Self::parse(toml_str)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Whether a cross-resource call is granted.
    pub fn allows(&self, gvr: &GroupVersionResource, method: Method) -> bool {
        self.resources
            .iter()
            .any(|grant| grant.matches(gvr) && grant.methods.contains(&method))
    }

    pub fn version(&self) -> Result<semver::Version, GuestError> {
        Ok(semver::Version::parse(&self.extension.version)?)
    }

    /// Whether this extension handles owners of `kind`.
    pub fn targets_kind(&self, kind: &str) -> bool {
        self.targets.iter().any(|t| t == kind)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
