//! Guest linear-memory allocator and buffer ownership.
//!
//! Every block carries a small header recording its size, so `release`
//! only needs the offset the host was given. Offsets handed out by
//! [`allocate`] stay valid until passed to [`release`]; releasing twice is
//! undefined behaviour and corrupts the arena for the rest of the instance.
//!
//! Ownership rules at the boundary:
//!
//! - Outgoing buffers are staged with [`Memory::stage`]. The returned
//!   [`Staged`] guard keeps the block alive while the host call runs and
//!   releases it when dropped.
//! - Incoming buffers arrive as a [`PackedPtr`]. [`Memory::take`] copies the
//!   bytes out and releases the block; it consumes the handle, so the same
//!   buffer cannot be taken twice.

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::mem::ManuallyDrop;
use std::ptr::null_mut;

use crate::error::GuestError;
use crate::packing::PackedPtr;

/// Bytes reserved in front of every block for its size.
const HEADER: usize = 8;
const ALIGN: usize = 8;

fn block_layout(size: usize) -> Option<Layout> {
    let total = size.checked_add(HEADER)?;
    Layout::from_size_align(total, ALIGN).ok()
}

/// Reserve `size` bytes. Returns null only when `size` overflows the
/// address space.
pub fn allocate(size: usize) -> *mut u8 {
    let Some(layout) = block_layout(size) else {
        return null_mut();
    };
    // SAFETY: the layout is never zero-sized (it includes the header), and
    // the header slot is aligned for `usize` because ALIGN >= align_of::<usize>().
    unsafe {
        let base = alloc(layout);
        if base.is_null() {
            handle_alloc_error(layout);
        }
        base.cast::<usize>().write(size);
        base.add(HEADER)
    }
}

/// Return a block to the allocator. Null is ignored.
///
/// # Safety
///
/// `ptr` must have been returned by [`allocate`] and not released since.
pub unsafe fn release(ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }
    let base = ptr.sub(HEADER);
    let size = base.cast::<usize>().read();
    if let Some(layout) = block_layout(size) {
        dealloc(base, layout);
    }
}

/// Size recorded for a live block.
///
/// # Safety
///
/// Same contract as [`release`].
pub unsafe fn block_size(ptr: *const u8) -> usize {
    ptr.sub(HEADER).cast::<usize>().read()
}

// ─── Memory seam ────────────────────────────────────────────────────────

/// Access to the guest arena as seen from the boundary, in 32-bit offsets.
///
/// Offset `0` is never a live allocation.
pub trait Memory {
    /// Reserve `size` bytes and return their offset.
    fn allocate(&self, size: u32) -> u32;

    /// Release a block.
    ///
    /// # Safety
    ///
    /// `offset` must be a live allocation owned by the caller.
    unsafe fn release(&self, offset: u32);

    /// Copy `len` bytes starting at `offset` out of the arena.
    ///
    /// # Safety
    ///
    /// The range must lie inside a live allocation.
    unsafe fn read(&self, offset: u32, len: u32) -> Vec<u8>;

    /// Copy `bytes` into the arena starting at `offset`.
    ///
    /// # Safety
    ///
    /// The range must lie inside a live allocation.
    unsafe fn write(&self, offset: u32, bytes: &[u8]);

    /// Copy `bytes` into a fresh block for an outgoing host call.
    fn stage(&self, bytes: &[u8]) -> Result<Staged<'_, Self>, GuestError> {
        let len = u32::try_from(bytes.len()).map_err(|_| GuestError::BufferTooLarge(bytes.len()))?;
        let offset = self.allocate(len);
        if offset == 0 {
            return Err(GuestError::BufferTooLarge(bytes.len()));
        }
        // SAFETY: `offset` was just allocated with room for `len` bytes.
        unsafe { self.write(offset, bytes) };
        Ok(Staged {
            memory: self,
            offset,
            len,
        })
    }

    /// Take ownership of a host-written buffer: copy it out, then release it.
    fn take(&self, ptr: PackedPtr) -> Vec<u8> {
        if ptr.offset() == 0 {
            return Vec::new();
        }
        // SAFETY: the host allocated this block through our exported
        // allocator and handed ownership to us; `ptr` is consumed here, so
        // the block is read and released exactly once.
        unsafe {
            let bytes = self.read(ptr.offset(), ptr.len());
            self.release(ptr.offset());
            bytes
        }
    }
}

/// An outgoing buffer that stays valid until dropped.
#[must_use = "dropping a staged buffer releases it immediately"]
pub struct Staged<'m, M: Memory + ?Sized> {
    memory: &'m M,
    offset: u32,
    len: u32,
}

impl<M: Memory + ?Sized> Staged<'_, M> {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Give the block away; whoever receives the packed value frees it.
    pub fn into_packed(self) -> PackedPtr {
        let this = ManuallyDrop::new(self);
        PackedPtr::new(this.offset, this.len)
    }
}

impl<M: Memory + ?Sized> Drop for Staged<'_, M> {
    fn drop(&mut self) {
        // SAFETY: the block was allocated by `stage` and ownership never left
        // this guard.
        unsafe { self.memory.release(self.offset) }
    }
}

impl<M: Memory + ?Sized> std::fmt::Debug for Staged<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Staged")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

// ─── Real linear memory ─────────────────────────────────────────────────

/// The module's own linear memory; offsets are addresses.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearMemory;

#[cfg(target_arch = "wasm32")]
impl Memory for LinearMemory {
    fn allocate(&self, size: u32) -> u32 {
        allocate(size as usize) as usize as u32
    }

    unsafe fn release(&self, offset: u32) {
        release(offset as usize as *mut u8)
    }

    unsafe fn read(&self, offset: u32, len: u32) -> Vec<u8> {
        std::slice::from_raw_parts(offset as usize as *const u8, len as usize).to_vec()
    }

    unsafe fn write(&self, offset: u32, bytes: &[u8]) {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), offset as usize as *mut u8, bytes.len())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────
