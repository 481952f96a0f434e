//! Host-call surface.
//!
//! [`Host`] mirrors the imported function table one-to-one: raw offsets and
//! lengths in, raw packed values or status codes out. Nothing here encodes,
//! decodes or owns anything; that is the job of [`crate::client::Client`].
//! Keeping the raw table behind a trait lets the client and lifecycle code
//! run against [`crate::testing::FakeHost`] natively.

use crate::memory::Memory;

/// The imported functions, as seen by the guest.
///
/// Every `(ptr, size)` pair names bytes in guest memory that the host reads
/// during the call and never frees. Getters and cross-resource calls return
/// a packed value (see [`crate::packing`]) that the guest owns afterwards.
///
/// # Safety
///
/// Methods taking offsets are `unsafe`: each `(ptr, size)` range must lie in
/// a live allocation for the whole duration of the call.
pub trait Host: Memory {
    unsafe fn add_env(&self, ptr: u32, size: u32);
    unsafe fn add_env_from(&self, ptr: u32, size: u32);
    unsafe fn add_label(&self, ptr: u32, size: u32);
    unsafe fn add_annotation(&self, ptr: u32, size: u32);
    unsafe fn add_init_container(&self, ptr: u32, size: u32);
    unsafe fn add_sidecar(&self, ptr: u32, size: u32);
    unsafe fn merge_patch(&self, ptr: u32, size: u32);
    unsafe fn validation_error(&self, ptr: u32, size: u32);

    /// Packed `Owner` message.
    fn get_owner(&self) -> u64;
    /// Packed JSON spec of the extension.
    fn get_spec(&self) -> u64;
    /// Packed JSON of the previous spec; empty outside update validation.
    fn get_old(&self) -> u64;

    /// Packed JSON body, or a status code below the threshold.
    unsafe fn get_resource(
        &self,
        gvr_ptr: u32,
        gvr_size: u32,
        name_ptr: u32,
        name_size: u32,
    ) -> u64;
    unsafe fn create_resource(
        &self,
        gvr_ptr: u32,
        gvr_size: u32,
        body_ptr: u32,
        body_size: u32,
    ) -> u64;
    unsafe fn update_resource(
        &self,
        gvr_ptr: u32,
        gvr_size: u32,
        body_ptr: u32,
        body_size: u32,
    ) -> u64;

    /// Raw status: `0` is success.
    unsafe fn delete_resource(
        &self,
        gvr_ptr: u32,
        gvr_size: u32,
        name_ptr: u32,
        name_size: u32,
    ) -> u32;
}

// ─── Real imports ───────────────────────────────────────────────────────

#[cfg(target_arch = "wasm32")]
mod imports {
    #[link(wasm_import_module = "tether")]
    extern "C" {
        #[link_name = "addEnv"]
        pub fn add_env(ptr: u32, size: u32);
        #[link_name = "addEnvFrom"]
        pub fn add_env_from(ptr: u32, size: u32);
        #[link_name = "addLabel"]
        pub fn add_label(ptr: u32, size: u32);
        #[link_name = "addAnnotation"]
        pub fn add_annotation(ptr: u32, size: u32);
        #[link_name = "addInitContainer"]
        pub fn add_init_container(ptr: u32, size: u32);
        #[link_name = "addSidecar"]
        pub fn add_sidecar(ptr: u32, size: u32);
        #[link_name = "mergePatch"]
        pub fn merge_patch(ptr: u32, size: u32);
        #[link_name = "validationError"]
        pub fn validation_error(ptr: u32, size: u32);

        #[link_name = "getOwner"]
        pub fn get_owner() -> u64;
        #[link_name = "getSpec"]
        pub fn get_spec() -> u64;
        #[link_name = "getOld"]
        pub fn get_old() -> u64;

        #[link_name = "getResource"]
        pub fn get_resource(ptr: u32, size: u32, name_ptr: u32, name_size: u32) -> u64;
        #[link_name = "createResource"]
        pub fn create_resource(ptr: u32, size: u32, body_ptr: u32, body_size: u32) -> u64;
        #[link_name = "updateResource"]
        pub fn update_resource(ptr: u32, size: u32, body_ptr: u32, body_size: u32) -> u64;
        #[link_name = "deleteResource"]
        pub fn delete_resource(ptr: u32, size: u32, name_ptr: u32, name_size: u32) -> u32;
    }
}

/// The real host, reached through the `tether` import module.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct WasmHost {
    memory: crate::memory::LinearMemory,
}

#[cfg(target_arch = "wasm32")]
impl Memory for WasmHost {
    fn allocate(&self, size: u32) -> u32 {
        self.memory.allocate(size)
    }

    unsafe fn release(&self, offset: u32) {
        self.memory.release(offset)
    }

    unsafe fn read(&self, offset: u32, len: u32) -> Vec<u8> {
        self.memory.read(offset, len)
    }

    unsafe fn write(&self, offset: u32, bytes: &[u8]) {
        self.memory.write(offset, bytes)
    }
}

#[cfg(target_arch = "wasm32")]
impl Host for WasmHost {
    unsafe fn add_env(&self, ptr: u32, size: u32) {
        imports::add_env(ptr, size)
    }

    unsafe fn add_env_from(&self, ptr: u32, size: u32) {
        imports::add_env_from(ptr, size)
    }

    unsafe fn add_label(&self, ptr: u32, size: u32) {
        imports::add_label(ptr, size)
    }

    unsafe fn add_annotation(&self, ptr: u32, size: u32) {
        imports::add_annotation(ptr, size)
    }

    unsafe fn add_init_container(&self, ptr: u32, size: u32) {
        imports::add_init_container(ptr, size)
    }

    unsafe fn add_sidecar(&self, ptr: u32, size: u32) {
        imports::add_sidecar(ptr, size)
    }

    unsafe fn merge_patch(&self, ptr: u32, size: u32) {
        imports::merge_patch(ptr, size)
    }

    unsafe fn validation_error(&self, ptr: u32, size: u32) {
        imports::validation_error(ptr, size)
    }

    fn get_owner(&self) -> u64 {
        // SAFETY: no arguments; the host writes into memory it allocated
        // through our exported allocator.
        unsafe { imports::get_owner() }
    }

    fn get_spec(&self) -> u64 {
        // SAFETY: as above.
        unsafe { imports::get_spec() }
    }

    fn get_old(&self) -> u64 {
        // SAFETY: as above.
        unsafe { imports::get_old() }
    }

    unsafe fn get_resource(
        &self,
        gvr_ptr: u32,
        gvr_size: u32,
        name_ptr: u32,
        name_size: u32,
    ) -> u64 {
        imports::get_resource(gvr_ptr, gvr_size, name_ptr, name_size)
    }

    unsafe fn create_resource(
        &self,
        gvr_ptr: u32,
        gvr_size: u32,
        body_ptr: u32,
        body_size: u32,
    ) -> u64 {
        imports::create_resource(gvr_ptr, gvr_size, body_ptr, body_size)
    }

    unsafe fn update_resource(
        &self,
        gvr_ptr: u32,
        gvr_size: u32,
        body_ptr: u32,
        body_size: u32,
    ) -> u64 {
        imports::update_resource(gvr_ptr, gvr_size, body_ptr, body_size)
    }

    unsafe fn delete_resource(
        &self,
        gvr_ptr: u32,
        gvr_size: u32,
        name_ptr: u32,
        name_size: u32,
    ) -> u32 {
        imports::delete_resource(gvr_ptr, gvr_size, name_ptr, name_size)
    }
}
