//! C FFI - stable ABI for native shims and host embeddings
//!
//! Design: plain `extern "C"` entry points with:
//! 1. Runtime lifecycle (init, install, cleanup)
//! 2. Handle reference counting (register, inc_ref, release) and managed
//!    exception descriptions
//! 3. Buffer allocation shared with the string and byte codecs
//!
//! Entry points never unwind into C; protocol violations are logged and
//! counted by the registry.

mod buffers;
mod host;
mod refnum;

pub use buffers::{
    seqbind_alloc_bytes, seqbind_alloc_string, seqbind_alloc_string16, seqbind_free_bytes,
    seqbind_free_string, seqbind_free_string16,
};
pub use host::{seqbind_runtime_install, HostRuntime, SeqbindHostVTable};
pub use refnum::{seqbind_error_description, seqbind_inc_ref, seqbind_register_foreign, seqbind_release};

use crate::logging::{self, log_runtime_init, log_runtime_shutdown};
use crate::service;

/// Initialize logging (called once at program start, before install)
#[no_mangle]
pub extern "C" fn seqbind_runtime_init() {
    logging::init();
    log_runtime_init();
}

/// Shut the installed registry down (called before the foreign runtime
/// goes away)
#[no_mangle]
pub extern "C" fn seqbind_runtime_cleanup() {
    log_runtime_shutdown();
    service::shutdown();
}

#[cfg(test)]
mod tests;
