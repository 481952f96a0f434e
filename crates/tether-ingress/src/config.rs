//! Runtime configuration.
//!
//! The host forwards the upper-case keys of the extension's ConfigMap as
//! environment variables, so configuration is read from the environment
//! with a default for every key.

pub const CLASS_ENV: &str = "INGRESS_CLASS";
pub const PORT_NAME_ENV: &str = "INGRESS_PORT_NAME";
pub const NAME_SUFFIX_ENV: &str = "INGRESS_NAME_SUFFIX";
pub const PATH_TYPE_ENV: &str = "INGRESS_PATH_TYPE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressConfig {
    /// `spec.ingressClassName` of generated ingresses (default: `nginx`).
    pub class_name: String,
    /// Named service port traffic is routed to (default: `http`).
    pub port_name: String,
    /// Appended to the owner name to name the ingress (default: `-ing`).
    pub name_suffix: String,
    /// `pathType` of every generated path (default: `Prefix`).
    pub path_type: String,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            class_name: "nginx".into(),
            port_name: "http".into(),
            name_suffix: "-ing".into(),
            path_type: "Prefix".into(),
        }
    }
}

impl IngressConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };
        Self {
            class_name: get(CLASS_ENV, defaults.class_name),
            port_name: get(PORT_NAME_ENV, defaults.port_name),
            name_suffix: get(NAME_SUFFIX_ENV, defaults.name_suffix),
            path_type: get(PATH_TYPE_ENV, defaults.path_type),
        }
    }

    /// Name of the ingress generated for `owner_name`.
    pub fn ingress_name(&self, owner_name: &str) -> String {
        format!("{owner_name}{}", self.name_suffix)
    }
}
