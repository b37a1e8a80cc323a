//! Handle reference counting - C API for the registry
//!
//! Native shims call these with handles they received or are about to hand
//! over. Calls made before install are logged and ignored.

use crate::call::ForeignError;
use crate::logging::error;
use crate::marshal::NString;
use crate::refnum::{Handle, Payload, NULL_HANDLE};
use crate::service;

/// Register a foreign identity token (global reference, object pointer)
/// and return its positive handle. Repeated registration of the same token
/// returns the same handle. Returns 0 when no registry is installed or the
/// foreign handle space is exhausted.
#[no_mangle]
pub extern "C" fn seqbind_register_foreign(token: u64) -> Handle {
    match service::registry() {
        // Exhaustion is logged by the registry.
        Ok(registry) => registry
            .try_register(Payload::Foreign(token))
            .unwrap_or(NULL_HANDLE),
        Err(err) => {
            error!(event = "ffi_register", token, %err, "register before install");
            NULL_HANDLE
        }
    }
}

/// Foreign-initiated release of one reference
#[no_mangle]
pub extern "C" fn seqbind_release(handle: Handle) {
    match service::registry() {
        // Violations are logged and counted by the registry.
        Ok(registry) => {
            let _ = registry.release(handle);
        }
        Err(err) => error!(event = "ffi_release", handle, %err, "release before install"),
    }
}

/// Pin a handle for an outgoing call; returns it unchanged
#[no_mangle]
pub extern "C" fn seqbind_inc_ref(handle: Handle) -> Handle {
    match service::registry() {
        Ok(registry) => registry.bind_and_increment(handle),
        Err(err) => {
            error!(event = "ffi_inc_ref", handle, %err, "pin before install");
            handle
        }
    }
}

/// Description of a managed exception a stub entry point returned, for the
/// foreign side to rethrow it. Empty for any other handle. The caller frees
/// the buffer and still owns one reference to `handle`.
#[no_mangle]
pub extern "C" fn seqbind_error_description(handle: Handle) -> NString {
    let registry = match service::registry() {
        Ok(registry) => registry,
        Err(err) => {
            error!(event = "ffi_error_description", handle, %err, "describe before install");
            return NString::EMPTY;
        }
    };
    match registry.resolve(handle) {
        Some(Payload::Managed { object, .. }) => object
            .downcast_ref::<ForeignError>()
            .map_or(NString::EMPTY, |err| NString::encode(err.description())),
        _ => NString::EMPTY,
    }
}
