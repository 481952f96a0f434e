//! The extension lifecycle contract.
//!
//! The host drives a loaded module through four entry points. For one
//! change it always calls `Validate` before anything that mutates, and
//! `Defaulting` before `Sync` on creation; `Delete` is the last call an
//! owner ever sees. Each call runs to completion before the next begins.
//!
//! Extension authors implement [`Extension`] and hand the type to
//! [`register_extension!`](crate::register_extension), which emits the wasm
//! exports. The `run_*` functions hold the logic behind those exports and
//! are generic over [`Host`], so they are exercised natively against
//! [`crate::testing::FakeHost`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::Client;
use crate::codec;
use crate::error::GuestError;
use crate::host::Host;
use crate::memory::Memory;
use crate::proto::{Owner, ValidationError, ValidationType};

/// What an extension module implements.
///
/// Every method has a no-op default, so an extension only writes the phases
/// it takes part in.
pub trait Extension {
    /// The extension's slice of the owner's spec, as JSON.
    type Spec: DeserializeOwned + Serialize + Clone + PartialEq;

    /// Check the spec without side effects and return every finding.
    /// `old` is the previous spec, present only for [`ValidationType::Update`].
    fn validate(
        _kind: ValidationType,
        _spec: &Self::Spec,
        _old: Option<&Self::Spec>,
    ) -> Vec<ValidationError> {
        Vec::new()
    }

    /// Fill unset optional fields in place.
    fn defaulting(_spec: &mut Self::Spec) {}

    /// Reconcile dependent resources. Must converge: running it again with
    /// nothing changed may only issue no-op updates.
    fn sync<H: Host + ?Sized>(
        _client: &Client<'_, H>,
        _owner: &Owner,
        _spec: &Self::Spec,
    ) -> Result<(), GuestError> {
        Ok(())
    }

    /// Remove whatever `sync` created. A dependent that is already gone
    /// counts as removed.
    fn delete<H: Host + ?Sized>(_client: &Client<'_, H>, _owner: &Owner) -> Result<(), GuestError> {
        Ok(())
    }
}

// ─── Entry points ───────────────────────────────────────────────────────

/// Validate the current spec and report findings to the host.
///
/// A spec that does not decode is fatal. Findings are not.
pub fn run_validate<E: Extension, H: Host + ?Sized>(
    host: &H,
    kind: ValidationType,
) -> Result<usize, GuestError> {
    let client = Client::new(host);
    let spec: E::Spec = client.spec()?;
    let old: Option<E::Spec> = match kind {
        ValidationType::Update => client.old_spec()?,
        ValidationType::Create | ValidationType::Delete => None,
    };

    let findings = E::validate(kind, &spec, old.as_ref());
    for finding in &findings {
        tracing::debug!(path = %finding.path, detail = %finding.detail, "validation finding");
        client.validation_error(finding)?;
    }
    if !findings.is_empty() {
        tracing::info!(?kind, count = findings.len(), "spec rejected");
    }
    Ok(findings.len())
}

/// Apply defaults and hand the result back as a packed buffer.
///
/// Returns `0` when defaulting changed nothing. Otherwise the buffer belongs
/// to the host from here on, and the host frees it through the exported
/// `release`.
pub fn run_defaulting<E: Extension, H: Host + ?Sized>(host: &H) -> Result<u64, GuestError> {
    let client = Client::new(host);
    let spec: E::Spec = client.spec()?;

    let mut defaulted = spec.clone();
    E::defaulting(&mut defaulted);
    if defaulted == spec {
        tracing::debug!("defaulting left the spec unchanged");
        return Ok(0);
    }

    let text = codec::encode_json(&defaulted)?;
    let packed = host.stage(text.as_bytes())?.into_packed();
    tracing::debug!(len = packed.len(), "returning defaulted spec");
    Ok(packed.into_raw())
}

/// Reconcile dependent resources.
///
/// A host status error stops reconciliation for this pass and is logged;
/// the host retries `Sync` later. Decode faults propagate.
pub fn run_sync<E: Extension, H: Host + ?Sized>(host: &H) -> Result<(), GuestError> {
    let client = Client::new(host);
    let owner = client.owner()?;
    let spec: E::Spec = client.spec()?;
    tolerate_client_errors("sync", &owner, E::sync(&client, &owner, &spec))
}

/// Remove dependent resources. Same error policy as [`run_sync`].
pub fn run_delete<E: Extension, H: Host + ?Sized>(host: &H) -> Result<(), GuestError> {
    let client = Client::new(host);
    let owner = client.owner()?;
    tolerate_client_errors("delete", &owner, E::delete(&client, &owner))
}

fn tolerate_client_errors(
    phase: &'static str,
    owner: &Owner,
    result: Result<(), GuestError>,
) -> Result<(), GuestError> {
    match result {
        Err(err) => match err.client() {
            Some(code) => {
                tracing::error!(
                    phase,
                    owner = %owner.name,
                    namespace = %owner.namespace,
                    error = %code,
                    "incomplete, waiting for the host to retry"
                );
                Ok(())
            }
            None => Err(err),
        },
        Ok(()) => Ok(()),
    }
}

/// Unwrap an entry point's result inside an export. A wasm export cannot
/// return an error to the host; the only failure signal is a trap.
pub fn trap_on_fault<T>(export: &'static str, result: Result<T, GuestError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(export, error = %err, "aborting invocation");
            panic!("{export} failed: {err}");
        }
    }
}

// ─── Export glue ────────────────────────────────────────────────────────

/// Emit the wasm exports for an [`Extension`] type.
///
/// ```rust,ignore
/// struct MyExtension;
///
/// impl tether_guest::Extension for MyExtension {
///     type Spec = MySpec;
/// }
///
/// tether_guest::register_extension!(MyExtension);
/// ```
///
/// On non-wasm targets the macro expands to nothing, so the extension crate
/// still builds and tests natively.
#[macro_export]
macro_rules! register_extension {
    ($ext:ty) => {
        #[cfg(target_arch = "wasm32")]
        #[export_name = "allocate"]
        pub extern "C" fn __tether_allocate(size: u32) -> u32 {
            $crate::memory::allocate(size as usize) as usize as u32
        }

        #[cfg(target_arch = "wasm32")]
        #[export_name = "release"]
        pub unsafe extern "C" fn __tether_release(offset: u32) {
            $crate::memory::release(offset as usize as *mut u8)
        }

        #[cfg(target_arch = "wasm32")]
        #[export_name = "Validate"]
        pub extern "C" fn __tether_validate(kind: i32) {
            $crate::logging::init();
            let host = $crate::host::WasmHost::default();
            let kind = $crate::proto::ValidationType::from_raw(kind);
            $crate::lifecycle::trap_on_fault(
                $crate::abi::export::VALIDATE,
                $crate::lifecycle::run_validate::<$ext, _>(&host, kind),
            );
        }

        #[cfg(target_arch = "wasm32")]
        #[export_name = "Defaulting"]
        pub extern "C" fn __tether_defaulting() -> u64 {
            $crate::logging::init();
            let host = $crate::host::WasmHost::default();
            $crate::lifecycle::trap_on_fault(
                $crate::abi::export::DEFAULTING,
                $crate::lifecycle::run_defaulting::<$ext, _>(&host),
            )
        }

        #[cfg(target_arch = "wasm32")]
        #[export_name = "Sync"]
        pub extern "C" fn __tether_sync() {
            $crate::logging::init();
            let host = $crate::host::WasmHost::default();
            $crate::lifecycle::trap_on_fault(
                $crate::abi::export::SYNC,
                $crate::lifecycle::run_sync::<$ext, _>(&host),
            );
        }

        #[cfg(target_arch = "wasm32")]
        #[export_name = "Delete"]
        pub extern "C" fn __tether_delete() {
            $crate::logging::init();
            let host = $crate::host::WasmHost::default();
            $crate::lifecycle::trap_on_fault(
                $crate::abi::export::DELETE,
                $crate::lifecycle::run_delete::<$ext, _>(&host),
            );
        }
    };
}

// ─── Tests ──────────────────────────────────────────────────────────────
