//! Managed-side views of handles
//!
//! `Ref` is the proxy a managed value holds for a foreign-owned object; its
//! drop is the finalization hook that tells the foreign runtime the object is
//! no longer referenced. `ObjectRef` is the value generated bindings pass
//! around for any object or interface slot.

use super::handle::{Direction, Handle, NULL_HANDLE};
use super::registry::{ManagedObject, Payload, Registry};
use crate::logging::trace;
use crate::service;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Proxy owning one registry reference to a foreign-owned handle
pub struct Ref {
    handle: Handle,
    registry: Arc<Registry>,
}

impl Ref {
    /// Adopt one reference to `handle`. The count must already include it.
    pub fn adopt(registry: Arc<Registry>, handle: Handle) -> Self {
        debug_assert!(Direction::is_foreign(handle), "proxy for non-foreign handle {handle}");
        trace!(event = "proxy_adopt", handle);
        Self { handle, registry }
    }

    /// Raw handle, without pinning
    #[inline]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Pin the handle for an outgoing call and return it
    #[inline]
    pub fn bind_proxy_refnum(&self) -> Handle {
        self.registry.bind_and_increment(self.handle)
    }

    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl Drop for Ref {
    fn drop(&mut self) {
        // Violations are already reported by the registry.
        let _ = self.registry.finalize(self.handle);
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&self.handle).finish()
    }
}

/// Any object reference as seen by managed code
#[derive(Clone)]
pub enum ObjectRef {
    /// Proxy to an object owned by a foreign runtime
    Foreign(Arc<Ref>),
    /// Managed object exposed as the foreign class or interface `class`
    Managed { object: ManagedObject, class: Arc<str> },
}

impl ObjectRef {
    /// Wrap a managed value for exposure as `class`
    pub fn managed<T: Any + Send + Sync>(value: T, class: &str) -> Self {
        Self::Managed {
            object: Arc::new(value),
            class: Arc::from(class),
        }
    }

    pub fn from_object(object: ManagedObject, class: &str) -> Self {
        Self::Managed {
            object,
            class: Arc::from(class),
        }
    }

    /// Handle for passing this object into a foreign call.
    ///
    /// Foreign proxies are pinned; managed objects are registered (or their
    /// existing handle retrieved and bumped).
    pub fn to_refnum_in(&self, registry: &Registry) -> Handle {
        match self {
            Self::Foreign(proxy) => proxy.bind_proxy_refnum(),
            Self::Managed { object, class } => {
                registry.register(Payload::managed(object.clone(), class.clone()))
            }
        }
    }

    /// Decode a handle received from a foreign call; 0 and unknown handles
    /// yield `None`.
    pub fn from_refnum_in(registry: &Arc<Registry>, handle: Handle) -> Option<Self> {
        match Direction::of(handle)? {
            Direction::Foreign => match registry.resolve(handle)? {
                Payload::Foreign(_) => Some(Self::Foreign(Arc::new(Ref::adopt(registry.clone(), handle)))),
                Payload::Managed { .. } => None,
            },
            Direction::Managed => match registry.take(handle)? {
                Payload::Managed { object, class } => Some(Self::Managed { object, class }),
                Payload::Foreign(_) => None,
            },
        }
    }

    /// [`Self::to_refnum_in`] against the installed registry.
    ///
    /// # Panics
    /// If no registry is installed.
    pub fn to_refnum(&self) -> Handle {
        match self {
            Self::Foreign(proxy) => proxy.bind_proxy_refnum(),
            Self::Managed { .. } => self.to_refnum_in(&service::installed()),
        }
    }

    /// [`Self::from_refnum_in`] against the installed registry.
    ///
    /// # Panics
    /// If `handle` is non-null and no registry is installed.
    pub fn from_refnum(handle: Handle) -> Option<Self> {
        if handle == NULL_HANDLE {
            return None;
        }
        Self::from_refnum_in(&service::installed(), handle)
    }

    /// Runtime type assertion used by overload resolution and casts
    pub fn is_instance_of(&self, class: &str) -> bool {
        match self {
            Self::Foreign(proxy) => proxy.registry().foreign().is_instance_of(proxy.handle(), class),
            Self::Managed { class: own, .. } => own.as_ref() == class,
        }
    }

    /// Borrow the managed value behind this reference
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Managed { object, .. } => object.downcast_ref::<T>(),
            Self::Foreign(_) => None,
        }
    }

    /// Foreign handle, `None` for managed objects
    pub fn foreign_handle(&self) -> Option<Handle> {
        match self {
            Self::Foreign(proxy) => Some(proxy.handle()),
            Self::Managed { .. } => None,
        }
    }

    /// Reference equality
    pub fn same_object(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Foreign(a), Self::Foreign(b)) => a.handle() == b.handle(),
            (Self::Managed { object: a, .. }, Self::Managed { object: b, .. }) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Foreign(proxy) => f.debug_tuple("Foreign").field(&proxy.handle()).finish(),
            Self::Managed { class, .. } => f.debug_struct("Managed").field("class", class).finish(),
        }
    }
}
