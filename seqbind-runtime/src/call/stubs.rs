//! Stubs - managed implementations of foreign methods
//!
//! A managed type that extends a foreign class registers one stub per
//! overridden variant when its bindings initialize. The foreign runtime's
//! dynamic dispatch lands in a generated entry point that forwards here with
//! the receiver handle and the decoded arguments. A failed call reaches the
//! foreign caller as an exception handle, never as an unwind.

use super::dispatch::{OverloadError, Overloads, Signature};
use super::ForeignError;
use crate::foreign::LocalFrame;
use crate::logging::{debug, error, log_stub_failure, log_stub_invoke};
use crate::marshal::Value;
use crate::refnum::{Handle, ManagedObject, ObjectRef, Payload, Registry, NULL_HANDLE};
use crate::service::{self, RuntimeError};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Class managed-side exceptions are registered under
pub const MANAGED_ERROR: &str = "seqbind.Error";

/// Result of one stub call
pub type StubResult = Result<Value, StubError>;

/// Managed implementation of one variant: receiver and arguments in, result out
pub type StubFn = Arc<dyn Fn(&Receiver<'_>, &[Value]) -> StubResult + Send + Sync>;

/// Managed object a foreign call was dispatched to
pub struct Receiver<'a> {
    handle: Handle,
    object: &'a ManagedObject,
}

impl<'a> Receiver<'a> {
    pub fn new(handle: Handle, object: &'a ManagedObject) -> Self {
        Self { handle, object }
    }

    #[inline]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn object(&self) -> &'a ManagedObject {
        self.object
    }

    /// The receiver as the managed type implementing the stub
    pub fn downcast<T: Any>(&self) -> Result<&'a T, StubError> {
        self.object
            .downcast_ref::<T>()
            .ok_or(StubError::UnknownReceiver(self.handle))
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StubError {
    #[error("no stub registered for {class}.{method}")]
    UnknownMethod { class: String, method: String },
    #[error("handle {0} does not name a managed object")]
    UnknownReceiver(Handle),
    #[error(transparent)]
    NoOverload(#[from] OverloadError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    /// The managed implementation returned an error
    #[error(transparent)]
    Raised(#[from] ForeignError),
    #[error("stub panicked: {0}")]
    Panicked(String),
}

impl StubError {
    /// Exception handle to hand the foreign caller.
    ///
    /// A foreign exception object comes back pinned. Everything else is
    /// registered as a managed [`ForeignError`] under [`MANAGED_ERROR`],
    /// readable through `seqbind_error_description`. Returns 0 only when
    /// the handle space is exhausted.
    pub fn into_exception_in(self, registry: &Registry) -> Handle {
        let err = match self {
            Self::Raised(err) => err,
            other => ForeignError::new(other.to_string()),
        };
        let payload = match err.object().cloned() {
            Some(ObjectRef::Foreign(proxy)) => return proxy.bind_proxy_refnum(),
            Some(ObjectRef::Managed { object, class }) => Payload::Managed { object, class },
            None => Payload::managed(Arc::new(err), MANAGED_ERROR),
        };
        // Exhaustion is logged by the registry.
        registry.try_register(payload).unwrap_or(NULL_HANDLE)
    }
}

/// [`StubError::into_exception_in`] against the installed registry.
/// Returns 0 when no registry is installed.
pub fn exception(err: StubError) -> Handle {
    match service::registry() {
        Ok(registry) => err.into_exception_in(&registry),
        Err(runtime) => {
            error!(event = "stub_exception", %err, %runtime, "stub failed before install");
            NULL_HANDLE
        }
    }
}

struct StubSet {
    overloads: Overloads,
    impls: Vec<StubFn>,
}

/// Concurrent table of stubs keyed by foreign class and method name
#[derive(Default)]
pub struct StubRegistry {
    table: DashMap<(String, String), StubSet>,
}

static GLOBAL: Lazy<StubRegistry> = Lazy::new(StubRegistry::default);

/// Process-wide stub table used by generated bindings
pub fn global() -> &'static StubRegistry {
    &GLOBAL
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the implementation of one variant. Variants of the same
    /// method are resolved in registration order.
    pub fn register<F>(&self, class: &str, method: &str, signature: Signature, stub: F)
    where
        F: Fn(&Receiver<'_>, &[Value]) -> StubResult + Send + Sync + 'static,
    {
        let mut set = self
            .table
            .entry((class.to_string(), method.to_string()))
            .or_insert_with(|| StubSet {
                overloads: Overloads::new(class, method),
                impls: Vec::new(),
            });
        set.overloads.push(signature);
        set.impls.push(Arc::new(stub));
        debug!(
            event = "stub_register",
            class,
            method,
            variants = set.impls.len(),
            "stub registered"
        );
    }

    pub fn contains(&self, class: &str, method: &str) -> bool {
        self.table
            .contains_key(&(class.to_string(), method.to_string()))
    }

    /// Dispatch a foreign call to the managed receiver behind `receiver`.
    ///
    /// A local frame sized for the arguments plus the receiver is held for
    /// the duration of the call. A panic in the stub is caught; one carrying
    /// a [`ForeignError`], a fault from a nested foreign call, comes back as
    /// [`StubError::Raised`].
    pub fn invoke_in(
        &self,
        registry: &Registry,
        receiver: Handle,
        class: &str,
        method: &str,
        args: &[Value],
    ) -> Result<Value, StubError> {
        log_stub_invoke(class, method, args.len());

        let stub = {
            let key = (class.to_string(), method.to_string());
            let set = self.table.get(&key).ok_or_else(|| StubError::UnknownMethod {
                class: class.to_string(),
                method: method.to_string(),
            })?;
            let index = set.overloads.resolve(args)?;
            let stub = set.impls[index].clone();
            stub
        };

        let object = match registry.resolve(receiver) {
            Some(Payload::Managed { object, .. }) => object,
            _ => return Err(StubError::UnknownReceiver(receiver)),
        };

        let _frame = LocalFrame::push(registry.foreign(), args.len() + 1);
        let this = Receiver::new(receiver, &object);
        let result = match panic::catch_unwind(AssertUnwindSafe(|| stub(&this, args))) {
            Ok(result) => result,
            Err(payload) => Err(panicked(payload)),
        };
        if let Err(err) = &result {
            log_stub_failure(class, method, &err.to_string());
        }
        result
    }

    /// [`Self::invoke_in`] against the installed registry
    pub fn invoke(
        &self,
        receiver: Handle,
        class: &str,
        method: &str,
        args: &[Value],
    ) -> Result<Value, StubError> {
        let registry = service::registry()?;
        self.invoke_in(&registry, receiver, class, method, args)
    }
}

fn panicked(payload: Box<dyn Any + Send>) -> StubError {
    let payload = match payload.downcast::<ForeignError>() {
        Ok(err) => return StubError::Raised(*err),
        Err(payload) => payload,
    };
    let message = match payload.downcast::<String>() {
        Ok(text) => *text,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map_or_else(|| "unknown panic".to_string(), |text| text.to_string()),
    };
    StubError::Panicked(message)
}
