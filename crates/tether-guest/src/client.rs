//! Typed facade over the host-call surface.
//!
//! Every method follows the same shape: encode the request, stage it in guest
//! memory for exactly the duration of the host call, then take ownership of
//! whatever the host handed back and decode it. Selectors and context travel
//! as protobuf; specs and resource bodies travel as JSON text.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::abi::import;
use crate::client_error::ClientError;
use crate::codec::{self, DecodeFn, Message};
use crate::error::GuestError;
use crate::host::Host;
use crate::packing::{PackedPtr, Returned};
use crate::proto::{Container, EnvFrom, GroupVersionResource, KeyValue, Owner, ValidationError};

/// Typed access to the host for the duration of one invocation.
pub struct Client<'h, H: Host + ?Sized> {
    host: &'h H,
}

impl<H: Host + ?Sized> Clone for Client<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H: Host + ?Sized> Copy for Client<'_, H> {}

impl<H: Host + ?Sized> std::fmt::Debug for Client<'_, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

impl<'h, H: Host + ?Sized> Client<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// The underlying host, for calls the facade does not cover.
    pub fn host(&self) -> &'h H {
        self.host
    }

    // ── Mutators on the in-flight resource ──────────────────────────

    pub fn add_env(&self, name: &str, value: &str) -> Result<(), GuestError> {
        self.push_message(import::ADD_ENV, &KeyValue::new(name, value), H::add_env)
    }

    pub fn add_env_from(&self, env_from: &EnvFrom) -> Result<(), GuestError> {
        self.push_message(import::ADD_ENV_FROM, env_from, H::add_env_from)
    }

    pub fn add_label(&self, name: &str, value: &str) -> Result<(), GuestError> {
        self.push_message(import::ADD_LABEL, &KeyValue::new(name, value), H::add_label)
    }

    pub fn add_annotation(&self, name: &str, value: &str) -> Result<(), GuestError> {
        self.push_message(import::ADD_ANNOTATION, &KeyValue::new(name, value), H::add_annotation)
    }

    pub fn add_init_container(&self, container: &Container) -> Result<(), GuestError> {
        self.push_message(import::ADD_INIT_CONTAINER, container, H::add_init_container)
    }

    pub fn add_sidecar(&self, container: &Container) -> Result<(), GuestError> {
        self.push_message(import::ADD_SIDECAR, container, H::add_sidecar)
    }

    /// Apply a JSON merge patch (RFC 7386) to the in-flight resource.
    pub fn merge_patch(&self, patch: &[u8]) -> Result<(), GuestError> {
        self.push(import::MERGE_PATCH, patch, H::merge_patch)
    }

    pub fn merge_patch_json<T: Serialize>(&self, patch: &T) -> Result<(), GuestError> {
        let text = codec::encode_json(patch)?;
        self.merge_patch(text.as_bytes())
    }

    /// Report one validation finding. May be called any number of times.
    pub fn validation_error(&self, finding: &ValidationError) -> Result<(), GuestError> {
        self.push_message(import::VALIDATION_ERROR, finding, H::validation_error)
    }

    // ── Context ─────────────────────────────────────────────────────

    pub fn owner(&self) -> Result<Owner, GuestError> {
        let bytes = self.host.take(PackedPtr::from_raw(self.host.get_owner()));
        codec::decode(bytes)
    }

    /// The extension's current configuration.
    pub fn spec<T: DeserializeOwned>(&self) -> Result<T, GuestError> {
        self.spec_with(codec::decode_json::<T>)
    }

    pub fn spec_with<T>(&self, decode: DecodeFn<T>) -> Result<T, GuestError> {
        decode(self.spec_bytes())
    }

    /// The raw JSON of the current configuration.
    pub fn spec_bytes(&self) -> Vec<u8> {
        self.host.take(PackedPtr::from_raw(self.host.get_spec()))
    }

    /// The configuration before the change under validation, if any.
    pub fn old_spec<T: DeserializeOwned>(&self) -> Result<Option<T>, GuestError> {
        self.old_spec_with(codec::decode_json::<T>)
    }

    pub fn old_spec_with<T>(&self, decode: DecodeFn<T>) -> Result<Option<T>, GuestError> {
        let bytes = self.host.take(PackedPtr::from_raw(self.host.get_old()));
        if bytes.is_empty() {
            return Ok(None);
        }
        decode(bytes).map(Some)
    }

    // ── Cross-resource CRUD ─────────────────────────────────────────

    pub fn get_resource<T: DeserializeOwned>(
        &self,
        gvr: &GroupVersionResource,
        name: &str,
    ) -> Result<T, GuestError> {
        self.get_resource_with(gvr, name, codec::decode_json::<T>)
    }

    pub fn get_resource_with<T>(
        &self,
        gvr: &GroupVersionResource,
        name: &str,
        decode: DecodeFn<T>,
    ) -> Result<T, GuestError> {
        tracing::debug!(gvr = %gvr, name, "get resource");
        decode(self.exchange(import::GET_RESOURCE, gvr, name.as_bytes(), H::get_resource)?)
    }

    /// Create a resource; returns the object as stored by the host.
    pub fn create_resource<B, T>(
        &self,
        gvr: &GroupVersionResource,
        body: &B,
    ) -> Result<T, GuestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = codec::encode_json(body)?;
        tracing::debug!(gvr = %gvr, "create resource");
        let bytes = self.exchange(
            import::CREATE_RESOURCE,
            gvr,
            body.as_bytes(),
            H::create_resource,
        )?;
        codec::decode_json(bytes)
    }

    /// Replace a resource; the body's `metadata.resourceVersion` is the
    /// optimistic-concurrency token.
    pub fn update_resource<B, T>(
        &self,
        gvr: &GroupVersionResource,
        body: &B,
    ) -> Result<T, GuestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = codec::encode_json(body)?;
        tracing::debug!(gvr = %gvr, "update resource");
        let bytes = self.exchange(
            import::UPDATE_RESOURCE,
            gvr,
            body.as_bytes(),
            H::update_resource,
        )?;
        codec::decode_json(bytes)
    }

    /// Delete a resource by name. Unlike the other calls this import
    /// returns a bare status, where `0` means success.
    pub fn delete_resource(
        &self,
        gvr: &GroupVersionResource,
        name: &str,
    ) -> Result<(), GuestError> {
        tracing::debug!(gvr = %gvr, name, "delete resource");
        let selector = self.host.stage(&codec::encode(gvr))?;
        let name_buf = self.host.stage(name.as_bytes())?;
        // SAFETY: both staged buffers live until the end of this function.
        let status = unsafe {
            self.host.delete_resource(
                selector.offset(),
                selector.len(),
                name_buf.offset(),
                name_buf.len(),
            )
        };
        match status {
            0 => Ok(()),
            code => {
                let err = ClientError::from_code(code);
                tracing::debug!(
                    import = import::DELETE_RESOURCE,
                    gvr = %gvr,
                    error = %err,
                    "host returned status"
                );
                Err(err.into())
            }
        }
    }

    // ── Plumbing ────────────────────────────────────────────────────

    fn push_message<M: Message>(
        &self,
        name: &'static str,
        msg: &M,
        call: unsafe fn(&H, u32, u32),
    ) -> Result<(), GuestError> {
        self.push(name, &codec::encode(msg), call)
    }

    fn push(
        &self,
        name: &'static str,
        bytes: &[u8],
        call: unsafe fn(&H, u32, u32),
    ) -> Result<(), GuestError> {
        let staged = self.host.stage(bytes)?;
        tracing::trace!(import = name, len = staged.len(), "host call");
        // SAFETY: `staged` is alive until after the call returns.
        unsafe { call(self.host, staged.offset(), staged.len()) };
        Ok(())
    }

    fn exchange(
        &self,
        name: &'static str,
        gvr: &GroupVersionResource,
        payload: &[u8],
        call: unsafe fn(&H, u32, u32, u32, u32) -> u64,
    ) -> Result<Vec<u8>, GuestError> {
        let selector = self.host.stage(&codec::encode(gvr))?;
        let payload = self.host.stage(payload)?;
        // SAFETY: both staged buffers outlive the call.
        let raw = unsafe {
            call(
                self.host,
                selector.offset(),
                selector.len(),
                payload.offset(),
                payload.len(),
            )
        };
        match Returned::classify(raw) {
            Returned::Buffer(ptr) => Ok(self.host.take(ptr)),
            Returned::Status(err) => {
                tracing::debug!(import = name, gvr = %gvr, error = %err, "host returned status");
                Err(err.into())
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;
    use crate::proto::EnvFromType;
    use crate::testing::{FakeHost, FakeStore};
    use serde_json::{json, Value};

    fn owner() -> Owner {
        Owner {
            api_version: "tether.dev/v1".into(),
            kind: "Application".into(),
            name: "shop".into(),
            uid: "uid-1".into(),
            namespace: "default".into(),
        }
    }

    fn config_maps() -> GroupVersionResource {
        GroupVersionResource::new("", "v1", "configmaps")
    }

    fn config_map(name: &str) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {"name": name, "namespace": "default"},
            "data": {"key": "value"}
        })
    }

    // ── Mutators ────────────────────────────────────────────────────

    #[test]
    fn test_mutators_are_recorded() {
        let host = FakeHost::new(owner());
        let client = Client::new(&host);

        client.add_env("RUST_LOG", "debug").unwrap();
        client
            .add_env_from(&EnvFrom {
                name: "db".into(),
                optional: false,
                kind: EnvFromType::Secret,
            })
            .unwrap();
        client.add_label("tier", "web").unwrap();
        client.add_annotation("note", "hi").unwrap();
        client
            .add_init_container(&Container {
                name: "migrate".into(),
                image: "shop:1".into(),
                ..Default::default()
            })
            .unwrap();
        client
            .add_sidecar(&Container {
                name: "proxy".into(),
                image: "envoy".into(),
                ..Default::default()
            })
            .unwrap();
        client.merge_patch_json(&json!({"spec": {"replicas": 2}})).unwrap();

        let recorded = host.mutations();
        assert_eq!(recorded.env, vec![KeyValue::new("RUST_LOG", "debug")]);
        assert_eq!(recorded.env_from[0].name, "db");
        assert_eq!(recorded.labels, vec![KeyValue::new("tier", "web")]);
        assert_eq!(recorded.annotations, vec![KeyValue::new("note", "hi")]);
        assert_eq!(recorded.init_containers[0].name, "migrate");
        assert_eq!(recorded.sidecars[0].image, "envoy");
        assert_eq!(recorded.patches, vec![json!({"spec": {"replicas": 2}})]);
        assert_eq!(host.arena().live(), 0);
    }

    #[test]
    fn test_validation_errors_accumulate() {
        let host = FakeHost::new(owner());
        let client = Client::new(&host);
        client.validation_error(&ValidationError::new("a", "b", "c")).unwrap();
        client.validation_error(&ValidationError::new("d", "e", "f")).unwrap();
        assert_eq!(host.findings().len(), 2);
        assert_eq!(host.findings()[1].path, "d");
    }

    // ── Context ─────────────────────────────────────────────────────

    #[test]
    fn test_owner_is_decoded() {
        let host = FakeHost::new(owner());
        assert_eq!(Client::new(&host).owner().unwrap(), owner());
        assert_eq!(host.arena().live(), 0);
    }

    #[test]
    fn test_spec_is_decoded() {
        let host = FakeHost::new(owner()).with_spec_json(&json!({"replicas": 3}));
        let spec: Value = Client::new(&host).spec().unwrap();
        assert_eq!(spec["replicas"], 3);
        assert_eq!(host.arena().live(), 0);
        assert_eq!(host.arena().released(), 1);
    }

    #[test]
    fn test_spec_with_custom_decoder() {
        fn byte_count(bytes: Vec<u8>) -> Result<usize, GuestError> {
            Ok(bytes.len())
        }
        let host = FakeHost::new(owner()).with_spec(b"12345".to_vec());
        assert_eq!(Client::new(&host).spec_with(byte_count).unwrap(), 5);
    }

    #[test]
    fn test_spec_of_wrong_shape_is_fatal() {
        let host = FakeHost::new(owner()).with_spec_json(&json!({"replicas": "three"}));
        #[derive(serde::Deserialize, Debug)]
        struct Spec {
            #[allow(dead_code)]
            replicas: u32,
        }
        let err = Client::new(&host).spec::<Spec>().unwrap_err();
        assert!(matches!(err, GuestError::Json(_)));
        // The buffer is released even when decoding fails.
        assert_eq!(host.arena().live(), 0);
    }

    #[test]
    fn test_old_spec_absent_is_none() {
        let host = FakeHost::new(owner());
        let old: Option<Value> = Client::new(&host).old_spec().unwrap();
        assert!(old.is_none());
    }

    #[test]
    fn test_old_spec_present() {
        let host = FakeHost::new(owner()).with_old_spec_json(&json!({"replicas": 1}));
        let old: Option<Value> = Client::new(&host).old_spec().unwrap();
        assert_eq!(old.unwrap()["replicas"], 1);
        assert_eq!(host.arena().live(), 0);
    }

    // ── Cross-resource CRUD ─────────────────────────────────────────

    #[test]
    fn test_create_then_get() {
        let host = FakeHost::new(owner());
        let client = Client::new(&host);

        let created: Value = client.create_resource(&config_maps(), &config_map("cfg")).unwrap();
        assert_eq!(created["metadata"]["resourceVersion"], "1");

        let fetched: Value = client.get_resource(&config_maps(), "cfg").unwrap();
        assert_eq!(fetched["data"]["key"], "value");
        assert_eq!(host.arena().live(), 0);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let host = FakeHost::new(owner());
        let err = Client::new(&host)
            .get_resource::<Value>(&config_maps(), "nope")
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(host.arena().live(), 0);
    }

    #[test]
    fn test_create_existing_is_already_exists() {
        let mut store = FakeStore::default();
        store.insert(&config_maps(), "default", config_map("cfg"));
        let host = FakeHost::new(owner()).with_store(store);
        let err = Client::new(&host)
            .create_resource::<_, Value>(&config_maps(), &config_map("cfg"))
            .unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(host.store().creates(), 0);
    }

    #[test]
    fn test_update_with_stale_version_conflicts() {
        let host = FakeHost::new(owner());
        let client = Client::new(&host);
        let mut body: Value = client.create_resource(&config_maps(), &config_map("cfg")).unwrap();
        body["data"]["key"] = json!("changed");
        let _: Value = client.update_resource(&config_maps(), &body).unwrap();

        // `body` still carries the version from before the first update.
        body["data"]["key"] = json!("again");
        let err = client.update_resource::<_, Value>(&config_maps(), &body).unwrap_err();
        assert_eq!(err.client(), Some(ClientError::Conflict));
    }

    #[test]
    fn test_injected_failure_is_surfaced_once() {
        let host = FakeHost::new(owner());
        host.fail_next(import::GET_RESOURCE, ClientError::ServiceUnavailable);
        let client = Client::new(&host);
        let err = client.get_resource::<Value>(&config_maps(), "cfg").unwrap_err();
        assert_eq!(err.client(), Some(ClientError::ServiceUnavailable));
        let err = client.get_resource::<Value>(&config_maps(), "cfg").unwrap_err();
        assert_eq!(err.client(), Some(ClientError::NotFound));
    }

    #[test]
    fn test_staged_buffers_released_after_exchange() {
        let host = FakeHost::new(owner());
        let client = Client::new(&host);
        let _ = client.get_resource::<Value>(&config_maps(), "missing");
        let _: Value = client.create_resource(&config_maps(), &config_map("cfg")).unwrap();
        assert_eq!(host.arena().live(), 0);
    }

    // ── Delete ──────────────────────────────────────────────────────

    #[test]
    fn test_delete_zero_status_is_success() {
        let mut store = FakeStore::default();
        store.insert(&config_maps(), "default", config_map("cfg"));
        let host = FakeHost::new(owner()).with_store(store);
        Client::new(&host).delete_resource(&config_maps(), "cfg").unwrap();
        assert_eq!(host.store().deletes(), 1);
        assert!(host.store().is_empty());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let host = FakeHost::new(owner());
        let err = Client::new(&host).delete_resource(&config_maps(), "cfg").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(host.arena().live(), 0);
    }

    #[test]
    fn test_call_log_uses_import_names() {
        let host = FakeHost::new(owner());
        let client = Client::new(&host);
        client.owner().unwrap();
        let _ = client.delete_resource(&config_maps(), "cfg");
        assert_eq!(host.calls(), vec![import::GET_OWNER, import::DELETE_RESOURCE]);
    }

    #[test]
    fn test_raw_host_access() {
        let host = FakeHost::new(owner());
        let client = Client::new(&host);
        let offset = client.host().allocate(4);
        unsafe { client.host().release(offset) };
        assert_eq!(host.arena().live(), 0);
    }
}
