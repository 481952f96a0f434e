//! In-memory stand-ins for the host, for native tests.
//!
//! [`FakeArena`] models guest linear memory with 32-bit offsets and is strict
//! about ownership: releasing an unknown offset twice, or touching bytes
//! outside a live block, panics. [`FakeStore`] is a resource store with
//! Kubernetes-style optimistic concurrency. [`FakeHost`] ties both together
//! behind the [`Host`] trait and records everything a guest asks of it.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use crate::abi::import;
use crate::client_error::ClientError;
use crate::codec::{self, Message};
use crate::host::Host;
use crate::manifest::{Manifest, Method};
use crate::memory::Memory;
use crate::packing::{pack, STATUS_THRESHOLD};
use crate::proto::{
    Container, EnvFrom, GroupVersionResource, KeyValue, Owner, SyncRequest, ValidationError,
};

// ─── FakeArena ──────────────────────────────────────────────────────────

/// First offset handed out; `0` stays reserved for "no buffer".
const ARENA_BASE: u32 = 1024;
/// Gap between blocks so an overrun lands outside every block.
const ARENA_GUARD: u32 = 16;

#[derive(Debug)]
pub struct FakeArena {
    blocks: RefCell<BTreeMap<u32, Vec<u8>>>,
    next: Cell<u32>,
    released: Cell<usize>,
}

impl Default for FakeArena {
    fn default() -> Self {
        Self {
            blocks: RefCell::new(BTreeMap::new()),
            next: Cell::new(ARENA_BASE),
            released: Cell::new(0),
        }
    }
}

impl FakeArena {
    /// Blocks allocated and not yet released.
    pub fn live(&self) -> usize {
        self.blocks.borrow().len()
    }

    /// Successful releases so far.
    pub fn released(&self) -> usize {
        self.released.get()
    }

    /// Allocate a block holding `bytes` and return it packed, the way the
    /// host hands results to the guest.
    pub fn place(&self, bytes: &[u8]) -> u64 {
        let len = u32::try_from(bytes.len()).expect("fake arena payload over 4 GiB");
        let offset = self.allocate(len);
        // SAFETY: freshly allocated with room for `len` bytes.
        unsafe { self.write(offset, bytes) };
        pack(offset, len)
    }

    fn locate(&self, offset: u32, len: u32) -> (u32, usize) {
        let blocks = self.blocks.borrow();
        let (&base, block) = blocks
            .range(..=offset)
            .next_back()
            .unwrap_or_else(|| panic!("offset {offset} is not inside any live block"));
        let start = (offset - base) as usize;
        let end = start + len as usize;
        assert!(
            end <= block.len(),
            "range {offset}+{len} overruns block {base} of {} bytes",
            block.len()
        );
        (base, start)
    }
}

impl Memory for FakeArena {
    fn allocate(&self, size: u32) -> u32 {
        let offset = self.next.get();
        let span = size.max(1).next_multiple_of(8) + ARENA_GUARD;
        self.next.set(offset.checked_add(span).expect("fake arena exhausted"));
        self.blocks.borrow_mut().insert(offset, vec![0; size as usize]);
        offset
    }

    unsafe fn release(&self, offset: u32) {
        if self.blocks.borrow_mut().remove(&offset).is_none() {
            panic!("release of offset {offset}, which is not a live block (double release?)");
        }
        self.released.set(self.released.get() + 1);
    }

    unsafe fn read(&self, offset: u32, len: u32) -> Vec<u8> {
        let (base, start) = self.locate(offset, len);
        self.blocks.borrow()[&base][start..start + len as usize].to_vec()
    }

    unsafe fn write(&self, offset: u32, bytes: &[u8]) {
        let (base, start) = self.locate(offset, bytes.len() as u32);
        let mut blocks = self.blocks.borrow_mut();
        if let Some(block) = blocks.get_mut(&base) {
            block[start..start + bytes.len()].copy_from_slice(bytes);
        }
    }
}

// ─── FakeStore ──────────────────────────────────────────────────────────

type StoreKey = (GroupVersionResource, String, String);

/// Resources by `(gvr, namespace, name)`, each a JSON object.
///
/// Writes assign `metadata.resourceVersion` from a store-wide counter. An
/// update carrying a different version than the stored one is a
/// [`ClientError::Conflict`]. An update that changes nothing keeps the
/// stored version, as the real API server does.
#[derive(Debug, Default, Clone)]
pub struct FakeStore {
    objects: BTreeMap<StoreKey, Value>,
    revision: u64,
    creates: usize,
    updates: usize,
    deletes: usize,
}

fn object_name(body: &Value) -> Option<&str> {
    body.pointer("/metadata/name").and_then(Value::as_str)
}

fn resource_version(body: &Value) -> Option<&str> {
    body.pointer("/metadata/resourceVersion").and_then(Value::as_str)
}

fn without_version(body: &Value) -> Value {
    let mut body = body.clone();
    if let Some(meta) = body.get_mut("metadata").and_then(Value::as_object_mut) {
        meta.remove("resourceVersion");
    }
    body
}

fn key(gvr: &GroupVersionResource, namespace: &str, name: &str) -> StoreKey {
    (gvr.clone(), namespace.to_string(), name.to_string())
}

impl FakeStore {
    fn stamp(&mut self, body: &mut Value) {
        self.revision += 1;
        if let Some(meta) = body.get_mut("metadata").and_then(Value::as_object_mut) {
            meta.insert("resourceVersion".into(), Value::String(self.revision.to_string()));
        }
    }

    /// Seed an object without counting it as a create.
    pub fn insert(&mut self, gvr: &GroupVersionResource, namespace: &str, mut body: Value) {
        let name = object_name(&body).expect("seeded object needs metadata.name").to_string();
        self.stamp(&mut body);
        self.objects.insert(key(gvr, namespace, &name), body);
    }

    pub fn get(
        &self,
        gvr: &GroupVersionResource,
        namespace: &str,
        name: &str,
    ) -> Result<Value, ClientError> {
        self.objects
            .get(&key(gvr, namespace, name))
            .cloned()
            .ok_or(ClientError::NotFound)
    }

    pub fn create(
        &mut self,
        gvr: &GroupVersionResource,
        namespace: &str,
        mut body: Value,
    ) -> Result<Value, ClientError> {
        let name = object_name(&body).ok_or(ClientError::Invalid)?.to_string();
        let key = key(gvr, namespace, &name);
        if self.objects.contains_key(&key) {
            return Err(ClientError::AlreadyExists);
        }
        self.stamp(&mut body);
        self.creates += 1;
        self.objects.insert(key, body.clone());
        Ok(body)
    }

    pub fn update(
        &mut self,
        gvr: &GroupVersionResource,
        namespace: &str,
        mut body: Value,
    ) -> Result<Value, ClientError> {
        let name = object_name(&body).ok_or(ClientError::Invalid)?.to_string();
        let key = key(gvr, namespace, &name);
        let stored = self.objects.get(&key).ok_or(ClientError::NotFound)?;
        if let Some(version) = resource_version(&body) {
            if Some(version) != resource_version(stored) {
                return Err(ClientError::Conflict);
            }
        }
        self.updates += 1;
        if without_version(stored) == without_version(&body) {
            return Ok(stored.clone());
        }
        self.stamp(&mut body);
        self.objects.insert(key, body.clone());
        Ok(body)
    }

    pub fn delete(
        &mut self,
        gvr: &GroupVersionResource,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClientError> {
        self.objects
            .remove(&key(gvr, namespace, name))
            .ok_or(ClientError::NotFound)?;
        self.deletes += 1;
        Ok(())
    }

    pub fn object(&self, gvr: &GroupVersionResource, namespace: &str, name: &str) -> Option<Value> {
        self.get(gvr, namespace, name).ok()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn creates(&self) -> usize {
        self.creates
    }

    pub fn updates(&self) -> usize {
        self.updates
    }

    pub fn deletes(&self) -> usize {
        self.deletes
    }
}

// ─── FakeHost ───────────────────────────────────────────────────────────

/// Mutations a guest applied to the in-flight resource.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Mutations {
    pub env: Vec<KeyValue>,
    pub env_from: Vec<EnvFrom>,
    pub labels: Vec<KeyValue>,
    pub annotations: Vec<KeyValue>,
    pub init_containers: Vec<Container>,
    pub sidecars: Vec<Container>,
    pub patches: Vec<Value>,
}

impl Mutations {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A [`Host`] backed by a [`FakeArena`] and a [`FakeStore`].
///
/// Get and delete address the owner's namespace; create and update use the
/// body's `metadata.namespace`, falling back to the owner's.
#[derive(Debug)]
pub struct FakeHost {
    arena: FakeArena,
    request: SyncRequest,
    old: Option<Vec<u8>>,
    manifest: Option<Manifest>,
    store: RefCell<FakeStore>,
    failures: RefCell<HashMap<&'static str, ClientError>>,
    calls: RefCell<Vec<&'static str>>,
    mutations: RefCell<Mutations>,
    findings: RefCell<Vec<ValidationError>>,
}

impl FakeHost {
    /// A host for `owner` with an empty JSON object as spec.
    pub fn new(owner: Owner) -> Self {
        Self::from_request(SyncRequest {
            owner: Some(owner),
            spec: b"{}".to_vec(),
        })
    }

    /// A host serving the owner and spec of an invocation context. A
    /// request without an owner serves an all-empty one.
    pub fn from_request(request: SyncRequest) -> Self {
        Self {
            arena: FakeArena::default(),
            request,
            old: None,
            manifest: None,
            store: RefCell::new(FakeStore::default()),
            failures: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
            mutations: RefCell::new(Mutations::default()),
            findings: RefCell::new(Vec::new()),
        }
    }

    pub fn with_spec(mut self, spec: Vec<u8>) -> Self {
        self.request.spec = spec;
        self
    }

    pub fn with_spec_json<T: Serialize>(self, spec: &T) -> Self {
        let bytes = serde_json::to_vec(spec).expect("spec serializes");
        self.with_spec(bytes)
    }

    pub fn with_old_spec_json<T: Serialize>(mut self, old: &T) -> Self {
        self.old = Some(serde_json::to_vec(old).expect("old spec serializes"));
        self
    }

    /// Enforce the manifest's resource grants; without one every call is
    /// allowed.
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn with_store(self, store: FakeStore) -> Self {
        *self.store.borrow_mut() = store;
        self
    }

    /// Make the next call to `import` fail with `err`.
    pub fn fail_next(&self, import: &'static str, err: ClientError) {
        self.failures.borrow_mut().insert(import, err);
    }

    pub fn arena(&self) -> &FakeArena {
        &self.arena
    }

    pub fn store(&self) -> Ref<'_, FakeStore> {
        self.store.borrow()
    }

    pub fn store_mut(&self) -> RefMut<'_, FakeStore> {
        self.store.borrow_mut()
    }

    /// Import names in call order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn mutations(&self) -> Mutations {
        self.mutations.borrow().clone()
    }

    pub fn findings(&self) -> Vec<ValidationError> {
        self.findings.borrow().clone()
    }

    /// Forget recorded calls, mutations and findings between invocations.
    pub fn reset_records(&self) {
        self.calls.borrow_mut().clear();
        *self.mutations.borrow_mut() = Mutations::default();
        self.findings.borrow_mut().clear();
    }

    // ── Internals ───────────────────────────────────────────────────

    fn record(&self, import: &'static str) {
        self.calls.borrow_mut().push(import);
    }

    unsafe fn message<M: Message + Default>(&self, ptr: u32, size: u32) -> M {
        codec::decode(self.arena.read(ptr, size)).expect("guest sent a malformed message")
    }

    unsafe fn text(&self, ptr: u32, size: u32) -> String {
        String::from_utf8(self.arena.read(ptr, size)).expect("guest sent non-utf-8 text")
    }

    unsafe fn json(&self, ptr: u32, size: u32) -> Value {
        serde_json::from_slice(&self.arena.read(ptr, size)).expect("guest sent malformed JSON")
    }

    fn admit(
        &self,
        import: &'static str,
        gvr: &GroupVersionResource,
        method: Method,
    ) -> Result<(), ClientError> {
        if let Some(err) = self.failures.borrow_mut().remove(import) {
            return Err(err);
        }
        match &self.manifest {
            Some(manifest) if !manifest.allows(gvr, method) => Err(ClientError::Forbidden),
            _ => Ok(()),
        }
    }

    fn owner_namespace(&self) -> &str {
        self.request
            .owner
            .as_ref()
            .map_or("", |owner| owner.namespace.as_str())
    }

    fn namespace_of(&self, body: &Value) -> String {
        body.pointer("/metadata/namespace")
            .and_then(Value::as_str)
            .unwrap_or(self.owner_namespace())
            .to_string()
    }

    fn respond(&self, result: Result<Value, ClientError>) -> u64 {
        match result {
            Ok(object) => {
                let bytes = serde_json::to_vec(&object).expect("stored object serializes");
                assert!(
                    bytes.len() >= STATUS_THRESHOLD as usize,
                    "a {}-byte body would read as a status code",
                    bytes.len()
                );
                self.arena.place(&bytes)
            }
            Err(err) => u64::from(err.code()),
        }
    }
}

impl Memory for FakeHost {
    fn allocate(&self, size: u32) -> u32 {
        self.arena.allocate(size)
    }

    unsafe fn release(&self, offset: u32) {
        self.arena.release(offset)
    }

    unsafe fn read(&self, offset: u32, len: u32) -> Vec<u8> {
        self.arena.read(offset, len)
    }

    unsafe fn write(&self, offset: u32, bytes: &[u8]) {
        self.arena.write(offset, bytes)
    }
}

impl Host for FakeHost {
    unsafe fn add_env(&self, ptr: u32, size: u32) {
        self.record(import::ADD_ENV);
        let kv = self.message(ptr, size);
        self.mutations.borrow_mut().env.push(kv);
    }

    unsafe fn add_env_from(&self, ptr: u32, size: u32) {
        self.record(import::ADD_ENV_FROM);
        let env_from = self.message(ptr, size);
        self.mutations.borrow_mut().env_from.push(env_from);
    }

    unsafe fn add_label(&self, ptr: u32, size: u32) {
        self.record(import::ADD_LABEL);
        let kv = self.message(ptr, size);
        self.mutations.borrow_mut().labels.push(kv);
    }

    unsafe fn add_annotation(&self, ptr: u32, size: u32) {
        self.record(import::ADD_ANNOTATION);
        let kv = self.message(ptr, size);
        self.mutations.borrow_mut().annotations.push(kv);
    }

    unsafe fn add_init_container(&self, ptr: u32, size: u32) {
        self.record(import::ADD_INIT_CONTAINER);
        let container = self.message(ptr, size);
        self.mutations.borrow_mut().init_containers.push(container);
    }

    unsafe fn add_sidecar(&self, ptr: u32, size: u32) {
        self.record(import::ADD_SIDECAR);
        let container = self.message(ptr, size);
        self.mutations.borrow_mut().sidecars.push(container);
    }

    unsafe fn merge_patch(&self, ptr: u32, size: u32) {
        self.record(import::MERGE_PATCH);
        let patch = self.json(ptr, size);
        self.mutations.borrow_mut().patches.push(patch);
    }

    unsafe fn validation_error(&self, ptr: u32, size: u32) {
        self.record(import::VALIDATION_ERROR);
        let finding = self.message(ptr, size);
        self.findings.borrow_mut().push(finding);
    }

    fn get_owner(&self) -> u64 {
        self.record(import::GET_OWNER);
        let owner = self.request.owner.clone().unwrap_or_default();
        self.arena.place(&codec::encode(&owner))
    }

    fn get_spec(&self) -> u64 {
        self.record(import::GET_SPEC);
        self.arena.place(&self.request.spec)
    }

    fn get_old(&self) -> u64 {
        self.record(import::GET_OLD);
        match &self.old {
            Some(old) => self.arena.place(old),
            None => 0,
        }
    }

    unsafe fn get_resource(
        &self,
        gvr_ptr: u32,
        gvr_size: u32,
        name_ptr: u32,
        name_size: u32,
    ) -> u64 {
        self.record(import::GET_RESOURCE);
        let gvr: GroupVersionResource = self.message(gvr_ptr, gvr_size);
        let name = self.text(name_ptr, name_size);
        let result = self
            .admit(import::GET_RESOURCE, &gvr, Method::Get)
            .and_then(|()| self.store.borrow().get(&gvr, self.owner_namespace(), &name));
        self.respond(result)
    }

    unsafe fn create_resource(
        &self,
        gvr_ptr: u32,
        gvr_size: u32,
        body_ptr: u32,
        body_size: u32,
    ) -> u64 {
        self.record(import::CREATE_RESOURCE);
        let gvr: GroupVersionResource = self.message(gvr_ptr, gvr_size);
        let body = self.json(body_ptr, body_size);
        let namespace = self.namespace_of(&body);
        let result = self
            .admit(import::CREATE_RESOURCE, &gvr, Method::Create)
            .and_then(|()| self.store.borrow_mut().create(&gvr, &namespace, body));
        self.respond(result)
    }

    unsafe fn update_resource(
        &self,
        gvr_ptr: u32,
        gvr_size: u32,
        body_ptr: u32,
        body_size: u32,
    ) -> u64 {
        self.record(import::UPDATE_RESOURCE);
        let gvr: GroupVersionResource = self.message(gvr_ptr, gvr_size);
        let body = self.json(body_ptr, body_size);
        let namespace = self.namespace_of(&body);
        let result = self
            .admit(import::UPDATE_RESOURCE, &gvr, Method::Update)
            .and_then(|()| self.store.borrow_mut().update(&gvr, &namespace, body));
        self.respond(result)
    }

    unsafe fn delete_resource(
        &self,
        gvr_ptr: u32,
        gvr_size: u32,
        name_ptr: u32,
        name_size: u32,
    ) -> u32 {
        self.record(import::DELETE_RESOURCE);
        let gvr: GroupVersionResource = self.message(gvr_ptr, gvr_size);
        let name = self.text(name_ptr, name_size);
        let result = self
            .admit(import::DELETE_RESOURCE, &gvr, Method::Delete)
            .and_then(|()| self.store.borrow_mut().delete(&gvr, self.owner_namespace(), &name));
        match result {
            Ok(()) => 0,
            Err(err) => u32::from(err.code()),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────
