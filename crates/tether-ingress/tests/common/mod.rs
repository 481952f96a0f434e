// Shared test utilities for integration tests
#![allow(dead_code)]

use serde_json::Value;
use tether_guest::testing::FakeHost;
use tether_guest::{Manifest, Owner};
use tether_ingress::k8s::{self, Ingress};

pub const NAMESPACE: &str = "mynamespace";
pub const OWNER_NAME: &str = "some-app";
pub const INGRESS_NAME: &str = "some-app-ing";

pub fn owner() -> Owner {
    Owner {
        api_version: "tether.dev/v1".into(),
        kind: "Application".into(),
        name: OWNER_NAME.into(),
        uid: "0b6a3c1e-8f5d-4c1a-9a3e-3f4b5c6d7e8f".into(),
        namespace: NAMESPACE.into(),
    }
}

pub fn manifest() -> Manifest {
    Manifest::parse_and_validate(include_str!("../../extension.toml"))
        .expect("extension.toml is valid")
}

/// A host for [`owner`] serving `spec`, enforcing the extension's manifest.
pub fn host_with_spec(spec: Value) -> FakeHost {
    FakeHost::new(owner()).with_spec_json(&spec).with_manifest(manifest())
}

/// The ingress currently stored for [`owner`], if any.
pub fn stored_ingress(host: &FakeHost) -> Option<Ingress> {
    host.store()
        .object(&k8s::ingresses(), NAMESPACE, INGRESS_NAME)
        .map(|value| serde_json::from_value(value).expect("stored ingress decodes"))
}
