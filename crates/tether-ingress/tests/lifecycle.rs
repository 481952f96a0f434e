mod common;

use serde_json::{json, Value};
use tether_guest::abi::import;
use tether_guest::lifecycle::{run_defaulting, run_delete, run_sync, run_validate};
use tether_guest::packing::PackedPtr;
use tether_guest::testing::{FakeHost, FakeStore};
use tether_guest::{ClientError, KeyValue, Memory, ValidationType};
use tether_ingress::k8s;
use tether_ingress::IngressExtension;

use common::*;

fn shop_spec() -> Value {
    json!({"ingresses": [{"host": "shop.example.com", "paths": ["/", "/api"]}]})
}

// ── Validate ────────────────────────────────────────────────────────────

#[test]
fn test_validate_reports_host_and_path() {
    let host = host_with_spec(json!({"ingresses": [{"host": "noTLD", "paths": ["bad"]}]}));

    let count = run_validate::<IngressExtension, _>(&host, ValidationType::Create).unwrap();

    let findings = host.findings();
    assert_eq!(count, 2);
    assert_eq!(findings.len(), 2);
    assert!(findings[0].path.ends_with(".host"));
    assert_eq!(findings[0].detail, "must contain a dot");
    assert_eq!(findings[0].value, "noTLD");
    assert!(findings[1].path.contains(".paths[0]"));
    assert_eq!(findings[1].detail, "must start with a slash");
    assert_eq!(findings[1].value, "bad");
    assert_eq!(host.arena().live(), 0);
}

#[test]
fn test_validate_accepts_good_spec() {
    let host = host_with_spec(shop_spec());
    run_validate::<IngressExtension, _>(&host, ValidationType::Update).unwrap();
    assert!(host.findings().is_empty());
}

#[test]
fn test_validate_skips_delete() {
    let host = host_with_spec(json!({"ingresses": [{"host": "noTLD", "paths": ["bad"]}]}));
    run_validate::<IngressExtension, _>(&host, ValidationType::Delete).unwrap();
    assert!(host.findings().is_empty());
}

#[test]
fn test_validate_rejects_malformed_spec() {
    let host = host_with_spec(json!({"ingresses": "everything"}));
    assert!(run_validate::<IngressExtension, _>(&host, ValidationType::Create).is_err());
    assert!(host.findings().is_empty());
}

// ── Defaulting ──────────────────────────────────────────────────────────

#[test]
fn test_defaulting_sets_root_path() {
    let host = host_with_spec(json!({"ingresses": [{"host": "shop.example.com", "paths": null}]}));

    let raw = run_defaulting::<IngressExtension, _>(&host).unwrap();
    assert_ne!(raw, 0);

    let bytes = host.arena().take(PackedPtr::from_raw(raw));
    let defaulted: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(defaulted["ingresses"][0]["paths"], json!(["/"]));
    assert_eq!(defaulted["ingresses"][0]["host"], "shop.example.com");
    assert_eq!(host.arena().live(), 0);
}

#[test]
fn test_defaulting_complete_spec_is_empty_response() {
    let host = host_with_spec(shop_spec());
    assert_eq!(run_defaulting::<IngressExtension, _>(&host).unwrap(), 0);
}

// ── Sync ────────────────────────────────────────────────────────────────

#[test]
fn test_sync_creates_ingress_and_labels_owner() {
    let host = host_with_spec(shop_spec());

    run_sync::<IngressExtension, _>(&host).unwrap();

    let ingress = stored_ingress(&host).expect("ingress created");
    assert_eq!(ingress.spec.rules.len(), 1);
    assert_eq!(ingress.spec.rules[0].host, "shop.example.com");
    assert_eq!(ingress.spec.rules[0].http.paths.len(), 2);
    assert_eq!(ingress.spec.rules[0].http.paths[0].backend.service.name, OWNER_NAME);
    assert_eq!(ingress.metadata.owner_references[0].name, OWNER_NAME);
    assert_eq!(
        host.mutations().labels,
        vec![KeyValue::new("is-wasm-controlled", "true")]
    );
    assert_eq!(host.arena().live(), 0);
}

#[test]
fn test_sync_twice_is_idempotent() {
    let host = host_with_spec(shop_spec());

    run_sync::<IngressExtension, _>(&host).unwrap();
    let first = stored_ingress(&host).unwrap();

    host.reset_records();
    run_sync::<IngressExtension, _>(&host).unwrap();
    let second = stored_ingress(&host).unwrap();

    assert_eq!(host.store().len(), 1);
    assert_eq!(host.store().creates(), 1);
    assert_eq!(host.store().updates(), 1);
    assert_eq!(first, second, "second pass must not change the object");
    assert_eq!(
        host.calls(),
        vec![
            import::GET_OWNER,
            import::GET_SPEC,
            import::ADD_LABEL,
            import::CREATE_RESOURCE,
            import::GET_RESOURCE,
            import::UPDATE_RESOURCE,
        ]
    );
    assert_eq!(host.arena().live(), 0);
}

#[test]
fn test_sync_upserts_with_resource_version() {
    // A stale ingress already exists under the owner's name.
    let mut store = FakeStore::default();
    store.insert(
        &k8s::ingresses(),
        NAMESPACE,
        json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": {"name": INGRESS_NAME, "namespace": NAMESPACE},
            "spec": {"rules": [{"host": "old.example.com", "http": {"paths": []}}]}
        }),
    );
    let seeded_version = store
        .object(&k8s::ingresses(), NAMESPACE, INGRESS_NAME)
        .unwrap()["metadata"]["resourceVersion"]
        .clone();
    let host = host_with_spec(shop_spec()).with_store(store);

    run_sync::<IngressExtension, _>(&host).unwrap();

    let ingress = stored_ingress(&host).unwrap();
    assert_eq!(host.store().len(), 1);
    assert_eq!(host.store().creates(), 0);
    assert_eq!(host.store().updates(), 1);
    assert_eq!(ingress.spec.rules[0].host, "shop.example.com");
    assert_ne!(
        Value::from(ingress.metadata.resource_version.clone()),
        seeded_version,
        "update must bump the version"
    );
}

#[test]
fn test_sync_overwrites_ingress_without_http_block() {
    let mut store = FakeStore::default();
    store.insert(
        &k8s::ingresses(),
        NAMESPACE,
        json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": {"name": INGRESS_NAME, "namespace": NAMESPACE},
            "spec": {"rules": [{"host": "old.example.com"}]}
        }),
    );
    let host = host_with_spec(shop_spec()).with_store(store);

    run_sync::<IngressExtension, _>(&host).unwrap();
    assert_eq!(host.store().updates(), 1);

    host.reset_records();
    run_sync::<IngressExtension, _>(&host).unwrap();
    assert_eq!(host.store().len(), 1);

    let ingress = stored_ingress(&host).unwrap();
    assert_eq!(ingress.spec.rules[0].host, "shop.example.com");
    assert_eq!(ingress.spec.rules[0].http.paths.len(), 2);
}

#[test]
fn test_sync_spec_change_updates_ingress() {
    let host = host_with_spec(shop_spec());
    run_sync::<IngressExtension, _>(&host).unwrap();

    let host = FakeHost::new(owner())
        .with_spec_json(&json!({"ingresses": [{"host": "shop.example.com", "paths": ["/v2"]}]}))
        .with_manifest(manifest())
        .with_store(host.store().clone());
    run_sync::<IngressExtension, _>(&host).unwrap();

    let ingress = stored_ingress(&host).unwrap();
    let paths: Vec<_> = ingress.spec.rules[0].http.paths.iter().map(|p| p.path.as_str()).collect();
    assert_eq!(paths, vec!["/v2"]);
}

#[test]
fn test_sync_client_error_returns_without_reconciling() {
    let host = host_with_spec(shop_spec());
    host.fail_next(import::CREATE_RESOURCE, ClientError::ServiceUnavailable);

    run_sync::<IngressExtension, _>(&host).unwrap();
    assert!(stored_ingress(&host).is_none());

    // The host retries later and the pass converges.
    run_sync::<IngressExtension, _>(&host).unwrap();
    assert!(stored_ingress(&host).is_some());
    assert_eq!(host.arena().live(), 0);
}

#[test]
fn test_sync_conflict_on_update_is_retried_later() {
    let host = host_with_spec(shop_spec());
    run_sync::<IngressExtension, _>(&host).unwrap();

    host.fail_next(import::UPDATE_RESOURCE, ClientError::Conflict);
    run_sync::<IngressExtension, _>(&host).unwrap();
    assert_eq!(host.store().updates(), 0);

    run_sync::<IngressExtension, _>(&host).unwrap();
    assert_eq!(host.store().updates(), 1);
}

#[test]
fn test_sync_without_grant_is_forbidden_but_not_fatal() {
    let manifest = tether_guest::Manifest::parse_and_validate(
        r#"
targets = ["Application"]
[extension]
name = "ingress"
version = "0.1.0"
description = "no grants"
"#,
    )
    .unwrap();
    let host = FakeHost::new(owner())
        .with_spec_json(&shop_spec())
        .with_manifest(manifest);

    run_sync::<IngressExtension, _>(&host).unwrap();
    assert!(host.store().is_empty());
    assert_eq!(host.calls().last(), Some(&import::CREATE_RESOURCE));
}

// ── Delete ──────────────────────────────────────────────────────────────

#[test]
fn test_delete_removes_ingress() {
    let host = host_with_spec(shop_spec());
    run_sync::<IngressExtension, _>(&host).unwrap();

    run_delete::<IngressExtension, _>(&host).unwrap();
    assert!(stored_ingress(&host).is_none());
    assert_eq!(host.store().deletes(), 1);
}

#[test]
fn test_delete_missing_ingress_is_success() {
    let host = host_with_spec(shop_spec());
    run_delete::<IngressExtension, _>(&host).unwrap();
    assert_eq!(host.store().deletes(), 0);
    assert_eq!(host.calls(), vec![import::GET_OWNER, import::DELETE_RESOURCE]);
}

// ── Memory discipline ───────────────────────────────────────────────────

#[test]
fn test_full_lifecycle_leaks_nothing() {
    let host = host_with_spec(json!({"ingresses": [{"host": "shop.example.com"}]}));

    run_validate::<IngressExtension, _>(&host, ValidationType::Create).unwrap();
    let defaulted = run_defaulting::<IngressExtension, _>(&host).unwrap();
    let spec = host.arena().take(PackedPtr::from_raw(defaulted));

    let host = FakeHost::new(owner())
        .with_spec(spec)
        .with_manifest(manifest())
        .with_store(host.store().clone());
    run_sync::<IngressExtension, _>(&host).unwrap();
    run_sync::<IngressExtension, _>(&host).unwrap();
    run_delete::<IngressExtension, _>(&host).unwrap();

    assert_eq!(host.arena().live(), 0);
    assert!(host.arena().released() > 0);
}
