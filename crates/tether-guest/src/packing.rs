//! Pointer packing for the guest/host boundary.
//!
//! A buffer in guest linear memory travels across the boundary as a single
//! `u64`: the offset in the high 32 bits, the byte length in the low 32 bits.
//!
//! Cross-resource calls share that return channel with status codes. Any
//! returned value whose length half is below [`STATUS_THRESHOLD`] is a
//! status code, not a buffer. The threshold is a protocol constant shared
//! with the host; do not derive it from payload sizes.

use crate::client_error::ClientError;

/// Smallest length that denotes a real buffer on a status-sharing channel.
pub const STATUS_THRESHOLD: u32 = 20;

const LENGTH_MASK: u64 = 0xffff_ffff;

/// Combine an offset and a length into one boundary value.
pub const fn pack(offset: u32, length: u32) -> u64 {
    ((offset as u64) << 32) | length as u64
}

/// Split a boundary value back into `(offset, length)`.
pub const fn unpack(value: u64) -> (u32, u32) {
    ((value >> 32) as u32, (value & LENGTH_MASK) as u32)
}

/// A buffer handed over by the host.
///
/// Deliberately neither `Copy` nor `Clone`: the referenced allocation is
/// owned by the guest and [`crate::memory::Memory::take`] consumes the
/// handle, which is what makes "released exactly once" hold.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a host buffer leaks unless it is taken"]
pub struct PackedPtr {
    offset: u32,
    len: u32,
}

impl PackedPtr {
    /// Wrap a value from a channel that always carries a buffer.
    pub fn from_raw(value: u64) -> Self {
        let (offset, len) = unpack(value);
        Self { offset, len }
    }

    pub fn new(offset: u32, len: u32) -> Self {
        Self { offset, len }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Hand the buffer over to the other side, giving up ownership.
    pub fn into_raw(self) -> u64 {
        pack(self.offset, self.len)
    }
}

/// What a status-sharing host call returned.
#[derive(Debug, PartialEq, Eq)]
pub enum Returned {
    /// The call failed; the low bits carried a status code.
    Status(ClientError),
    /// The call succeeded and left a buffer in guest memory.
    Buffer(PackedPtr),
}

impl Returned {
    /// Disambiguate a raw return value using [`STATUS_THRESHOLD`].
    pub fn classify(value: u64) -> Self {
        let (_, len) = unpack(value);
        if len < STATUS_THRESHOLD {
            Self::Status(ClientError::from_code(len))
        } else {
            Self::Buffer(PackedPtr::from_raw(value))
        }
    }
}
