//! Host embedding over the C ABI
//!
//! Hosts written in C or Objective-C describe their runtime with a table of
//! callbacks. [`HostRuntime`] adapts that table to [`ForeignRuntime`] so the
//! registry can be installed without any Rust on the host side.

use crate::foreign::ForeignRuntime;
use crate::logging::{error, info};
use crate::marshal::{decode_bool, NString};
use crate::refnum::{Handle, Registry};
use crate::service;
use std::sync::Arc;

/// Callbacks supplied by a C host
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SeqbindHostVTable {
    pub notify_release: extern "C" fn(Handle),
    /// Returns a buffer from `seqbind_alloc_string`; the runtime frees it
    pub describe: extern "C" fn(Handle) -> NString,
    /// Class name as UTF-8 pointer+length; returns a boolean sentinel
    pub is_instance_of: Option<extern "C" fn(Handle, *const u8, usize) -> u8>,
    pub push_local_frame: Option<extern "C" fn(usize)>,
    pub pop_local_frame: Option<extern "C" fn()>,
}

/// [`ForeignRuntime`] backed by a C callback table
#[derive(Debug)]
pub struct HostRuntime {
    vtable: SeqbindHostVTable,
}

impl HostRuntime {
    pub fn new(vtable: SeqbindHostVTable) -> Self {
        Self { vtable }
    }
}

impl ForeignRuntime for HostRuntime {
    fn notify_release(&self, handle: Handle) {
        (self.vtable.notify_release)(handle);
    }

    fn describe(&self, handle: Handle) -> String {
        // SAFETY: the host allocates descriptions with seqbind_alloc_string.
        unsafe { (self.vtable.describe)(handle).decode() }
    }

    fn is_instance_of(&self, handle: Handle, class: &str) -> bool {
        match self.vtable.is_instance_of {
            Some(check) => decode_bool(check(handle, class.as_ptr(), class.len())),
            None => false,
        }
    }

    fn push_local_frame(&self, capacity: usize) {
        if let Some(push) = self.vtable.push_local_frame {
            push(capacity);
        }
    }

    fn pop_local_frame(&self) {
        if let Some(pop) = self.vtable.pop_local_frame {
            pop();
        }
    }
}

/// Construct a registry around the host's callbacks and install it.
///
/// Returns 0 on success, -1 for a null table, -2 if a registry is already
/// installed.
///
/// # Safety
/// `vtable` must be null or point to a valid table; it is copied.
#[no_mangle]
pub unsafe extern "C" fn seqbind_runtime_install(vtable: *const SeqbindHostVTable) -> i32 {
    let Some(vtable) = vtable.as_ref() else {
        error!(event = "ffi_install", "null host vtable");
        return -1;
    };
    let registry = Arc::new(Registry::new(Arc::new(HostRuntime::new(*vtable))));
    match service::install(registry) {
        Ok(()) => {
            info!(event = "ffi_install", "host runtime installed");
            0
        }
        Err(err) => {
            error!(event = "ffi_install", %err, "install failed");
            -2
        }
    }
}
