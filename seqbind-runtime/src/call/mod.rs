//! Call boundary - return values, foreign exceptions and dispatch
//!
//! Design: every fallible native shim returns its result together with an
//! exception handle (0 on success). Generated code hands that handle to this
//! module, which turns it into either an `Err(ForeignError)` for signatures
//! that can fail or a panic carrying the same `ForeignError` for signatures
//! that cannot.
//!
//! - `dispatch.rs` - run-time overload resolution over `Value` tags
//! - `stubs.rs` - managed implementations invoked by foreign dispatch

mod dispatch;
pub mod stubs;

pub use dispatch::{OverloadError, Overloads, Signature};
pub use stubs::{Receiver, StubError, StubFn, StubRegistry, StubResult};

use crate::logging::log_foreign_exception;
use crate::refnum::{Handle, ObjectRef, Registry, NULL_HANDLE};
use crate::service;
use std::panic;
use std::sync::Arc;

/// Value returned by a native shim together with the pending exception
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ret<T> {
    pub res: T,
    pub exc: Handle,
}

impl<T> Ret<T> {
    /// Successful result
    #[inline]
    pub fn ok(res: T) -> Self {
        Self { res, exc: NULL_HANDLE }
    }
}

impl<T: Default> Ret<T> {
    /// Pending exception with an empty result
    #[inline]
    pub fn raised(exc: Handle) -> Self {
        Self { res: T::default(), exc }
    }
}

/// Error raised by a foreign runtime, surfaced in managed code.
///
/// Displays as the foreign description (`toString()`,
/// `localizedDescription`) and keeps the exception object alive.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{description}")]
pub struct ForeignError {
    handle: Handle,
    description: String,
    object: Option<ObjectRef>,
}

impl ForeignError {
    /// Adopt the exception handle returned by a shim
    pub fn from_handle_in(registry: &Arc<Registry>, handle: Handle) -> Self {
        let description = registry.foreign().describe(handle);
        let object = ObjectRef::from_refnum_in(registry, handle);
        Self {
            handle,
            description,
            object,
        }
    }

    /// Error built on the managed side, with no foreign object behind it
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            handle: NULL_HANDLE,
            description: description.into(),
            object: None,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The exception object itself
    pub fn object(&self) -> Option<&ObjectRef> {
        self.object.as_ref()
    }
}

/// Decode a pending exception for a signature that can fail
pub fn check_in(registry: &Arc<Registry>, exc: Handle) -> Result<(), ForeignError> {
    if exc == NULL_HANDLE {
        return Ok(());
    }
    let err = ForeignError::from_handle_in(registry, exc);
    log_foreign_exception(exc, err.description(), false);
    Err(err)
}

/// [`check_in`] against the installed registry
pub fn check(exc: Handle) -> Result<(), ForeignError> {
    if exc == NULL_HANDLE {
        return Ok(());
    }
    check_in(&service::installed(), exc)
}

/// Result of a shim for a signature that can fail
#[inline]
pub fn check_ret<T>(ret: Ret<T>) -> Result<T, ForeignError> {
    check(ret.exc).map(|()| ret.res)
}

/// Turn a pending exception into a fault for a signature that cannot fail.
///
/// The panic payload is the [`ForeignError`] itself, so a catching frame can
/// downcast it and read the foreign description.
pub fn fault_on_exception_in(registry: &Arc<Registry>, exc: Handle) {
    if exc == NULL_HANDLE {
        return;
    }
    let err = ForeignError::from_handle_in(registry, exc);
    log_foreign_exception(exc, err.description(), true);
    panic::panic_any(err);
}

/// [`fault_on_exception_in`] against the installed registry
pub fn fault_on_exception(exc: Handle) {
    if exc != NULL_HANDLE {
        fault_on_exception_in(&service::installed(), exc);
    }
}

/// Result of a shim for a signature that cannot fail
#[inline]
pub fn fault_ret<T>(ret: Ret<T>) -> T {
    fault_on_exception(ret.exc);
    ret.res
}

/// Overload resolution fell through every variant
pub fn no_overload_matched(class: &str, method: &str) -> ! {
    panic!("no overloaded method found for {class}.{method} that matched the arguments")
}

/// Checked cast failed
pub fn not_an_instance(object: &ObjectRef, class: &str) -> ! {
    panic!("{object:?} is not an instance of {class}")
}

#[cfg(test)]
mod tests;
