//! Guest-side runtime for tether extensions.
//!
//! An extension is a wasm module the orchestration host loads and calls at
//! four points of an owner resource's lifecycle: `Validate`, `Defaulting`,
//! `Sync` and `Delete`. The module and the host share nothing but linear
//! memory and a table of integer-only functions; this crate turns that into
//! a typed API:
//!
//! 1. [`memory`] and [`packing`]: the allocator, buffer ownership and the
//!    `(offset, length)` packing shared by arguments and results.
//! 2. [`codec`] and [`proto`]: protobuf for addressing metadata, JSON for
//!    application payloads.
//! 3. [`host`]: the raw import table as a trait.
//! 4. [`client`]: typed calls, with [`ClientError`] as the failure taxonomy.
//! 5. [`lifecycle`]: the [`Extension`] trait and the export glue.
//!
//! # Example
//!
//! ```rust,ignore
//! use tether_guest::{Extension, ValidationError, ValidationType};
//!
//! #[derive(Clone, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Spec { replicas: Option<u32> }
//!
//! struct Scaler;
//!
//! impl Extension for Scaler {
//!     type Spec = Spec;
//!
//!     fn defaulting(spec: &mut Spec) {
//!         spec.replicas.get_or_insert(1);
//!     }
//! }
//!
//! tether_guest::register_extension!(Scaler);
//! ```

pub mod abi;
pub mod client;
pub mod client_error;
pub mod codec;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod logging;
pub mod manifest;
pub mod memory;
pub mod packing;
pub mod proto;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::Client;
pub use client_error::ClientError;
pub use error::GuestError;
pub use host::Host;
pub use lifecycle::Extension;
pub use manifest::Manifest;
pub use memory::Memory;
pub use packing::{PackedPtr, STATUS_THRESHOLD};
pub use proto::{
    Container, ContainerPort, EnvFrom, EnvFromType, EnvVar, GroupVersionResource, KeyValue, Owner,
    SyncRequest, ValidationError, ValidationType,
};
