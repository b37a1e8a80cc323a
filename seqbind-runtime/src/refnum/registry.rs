//! Handle table - the sole authority on object identity and lifetime
//!
//! Thread-safe: every operation takes the single table lock, so operations on
//! the same handle observe a total order. Foreign-runtime notifications are
//! always sent after the lock is released.

use super::handle::{Direction, Handle, NULL_HANDLE};
use crate::foreign::ForeignRuntime;
use crate::logging::{error, log_finalize, log_protocol_violation, log_register, log_release};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Managed object stored behind a negative handle
pub type ManagedObject = Arc<dyn Any + Send + Sync>;

/// Object registered under a handle
#[derive(Clone)]
pub enum Payload {
    /// Managed object, identified by its allocation address.
    /// `class` names the foreign class or interface it is exposed as.
    Managed { object: ManagedObject, class: Arc<str> },
    /// Opaque identity token handed over by a foreign runtime
    /// (a global reference, an object pointer).
    Foreign(u64),
}

impl Payload {
    pub fn managed(object: ManagedObject, class: impl Into<Arc<str>>) -> Self {
        Self::Managed {
            object,
            class: class.into(),
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        match self {
            Self::Managed { .. } => Direction::Managed,
            Self::Foreign(_) => Direction::Foreign,
        }
    }

    fn identity(&self) -> Identity {
        match self {
            Self::Managed { object, .. } => {
                Identity::Managed(Arc::as_ptr(object) as *const () as usize)
            }
            Self::Foreign(token) => Identity::Foreign(*token),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Managed { object, class } => f
                .debug_struct("Managed")
                .field("address", &(Arc::as_ptr(object) as *const ()))
                .field("class", class)
                .finish(),
            Self::Foreign(token) => f.debug_tuple("Foreign").field(token).finish(),
        }
    }
}

/// Key preserving reference equality across repeated crossings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Identity {
    Managed(usize),
    Foreign(u64),
}

/// Foreign-runtime protocol violations. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("release of null handle")]
    NullHandle,
    #[error("release of unknown or already released handle {0}")]
    UnknownHandle(Handle),
    #[error("{0:?} handle space exhausted")]
    Exhausted(Direction),
}

/// Registry counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub live: usize,
    pub registrations: u64,
    pub releases: u64,
    pub protocol_violations: u64,
}

struct Entry {
    payload: Payload,
    refcount: u32,
}

struct Table {
    entries: HashMap<Handle, Entry>,
    handles: HashMap<Identity, Handle>,
    next_managed: Option<Handle>,
    next_foreign: Option<Handle>,
    stats: RegistryStats,
}

impl Table {
    fn new() -> Self {
        Self {
            entries: HashMap::with_capacity(64),
            handles: HashMap::with_capacity(64),
            next_managed: Some(-1),
            next_foreign: Some(1),
            stats: RegistryStats::default(),
        }
    }

    /// Allocate the next handle for a direction. Handles are never reused;
    /// `None` once the direction's half of the handle space is used up.
    fn allocate(&mut self, direction: Direction) -> Option<Handle> {
        let next = match direction {
            Direction::Managed => &mut self.next_managed,
            Direction::Foreign => &mut self.next_foreign,
        };
        let handle = (*next)?;
        *next = match direction {
            Direction::Managed => handle.checked_sub(1),
            Direction::Foreign => handle.checked_add(1),
        };
        Some(handle)
    }
}

/// Process-wide reference registry.
///
/// Constructed explicitly around a live foreign runtime and installed with
/// [`crate::service::install`]; generated code reaches it through the
/// service slot.
pub struct Registry {
    table: Mutex<Table>,
    foreign: Arc<dyn ForeignRuntime>,
}

impl Registry {
    pub fn new(foreign: Arc<dyn ForeignRuntime>) -> Self {
        Self {
            table: Mutex::new(Table::new()),
            foreign,
        }
    }

    /// Registry whose next handles are `managed` and `foreign`
    #[cfg(test)]
    pub(crate) fn starting_at(foreign: Arc<dyn ForeignRuntime>, managed: Handle, foreign_next: Handle) -> Self {
        let registry = Self::new(foreign);
        {
            let mut table = registry.table.lock();
            table.next_managed = Some(managed);
            table.next_foreign = Some(foreign_next);
        }
        registry
    }

    /// Foreign runtime this registry notifies
    #[inline]
    pub fn foreign(&self) -> &dyn ForeignRuntime {
        self.foreign.as_ref()
    }

    /// Register a payload or retrieve its existing handle.
    ///
    /// A payload already registered in the same direction gets its existing
    /// handle back with the refcount bumped, so repeated crossings preserve
    /// reference equality.
    ///
    /// # Panics
    /// When the handle space for the payload's direction is exhausted.
    /// C entry points use [`Self::try_register`] instead.
    pub fn register(&self, payload: Payload) -> Handle {
        match self.try_register(payload) {
            Ok(handle) => handle,
            Err(err) => panic!("{err}"),
        }
    }

    /// [`Self::register`], reporting exhaustion as an error. Nothing is
    /// recorded for a payload that could not get a handle.
    pub fn try_register(&self, payload: Payload) -> Result<Handle, RegistryError> {
        let identity = payload.identity();
        let direction = payload.direction();
        let mut guard = self.table.lock();
        let table = &mut *guard;

        if let Some(&handle) = table.handles.get(&identity) {
            if let Some(entry) = table.entries.get_mut(&handle) {
                entry.refcount = entry.refcount.saturating_add(1);
                table.stats.registrations += 1;
                log_register(handle, entry.refcount, false);
                return Ok(handle);
            }
        }

        let Some(handle) = table.allocate(direction) else {
            error!(event = "handle_exhausted", ?direction, live = table.entries.len(), "no handles left");
            return Err(RegistryError::Exhausted(direction));
        };
        table.stats.registrations += 1;
        table.entries.insert(handle, Entry { payload, refcount: 1 });
        table.handles.insert(identity, handle);
        log_register(handle, 1, true);
        Ok(handle)
    }

    /// Payload registered under `handle`, `None` for null or unknown handles
    pub fn resolve(&self, handle: Handle) -> Option<Payload> {
        if handle == NULL_HANDLE {
            return None;
        }
        self.table
            .lock()
            .entries
            .get(&handle)
            .map(|entry| entry.payload.clone())
    }

    /// Foreign-initiated release notification.
    ///
    /// Drops one reference; the entry is removed when the count reaches zero.
    /// Unknown handles are reported as protocol violations.
    pub fn release(&self, handle: Handle) -> Result<(), RegistryError> {
        if handle == NULL_HANDLE {
            self.record_violation();
            log_protocol_violation(handle, "release of null handle");
            return Err(RegistryError::NullHandle);
        }

        let mut guard = self.table.lock();
        let table = &mut *guard;
        let remaining = table.entries.get_mut(&handle).map(|entry| {
            entry.refcount -= 1;
            entry.refcount
        });
        let Some(remaining) = remaining else {
            table.stats.protocol_violations += 1;
            drop(guard);
            log_protocol_violation(handle, "release of unknown handle");
            return Err(RegistryError::UnknownHandle(handle));
        };

        table.stats.releases += 1;
        if remaining == 0 {
            if let Some(entry) = table.entries.remove(&handle) {
                table.handles.remove(&entry.payload.identity());
            }
        }
        log_release(handle, remaining);
        Ok(())
    }

    /// Pin a handle for an outgoing call and return it unchanged.
    ///
    /// The pin is one more reference the receiving side releases. It is taken
    /// under the table lock, before the handle reaches the call.
    pub fn bind_and_increment(&self, handle: Handle) -> Handle {
        if handle == NULL_HANDLE {
            return handle;
        }
        let mut guard = self.table.lock();
        let pinned = match guard.entries.get_mut(&handle) {
            Some(entry) => {
                entry.refcount = entry.refcount.saturating_add(1);
                true
            }
            None => false,
        };
        if !pinned {
            guard.stats.protocol_violations += 1;
            drop(guard);
            log_protocol_violation(handle, "pin of unknown handle");
        }
        handle
    }

    /// Managed-side finalization of a foreign-owned handle.
    ///
    /// Releases the registry reference and notifies the foreign runtime that
    /// the managed side no longer uses the object.
    pub fn finalize(&self, handle: Handle) -> Result<(), RegistryError> {
        let result = self.release(handle);
        if result.is_ok() && Direction::is_foreign(handle) {
            log_finalize(handle);
            self.foreign.notify_release(handle);
        }
        result
    }

    /// Resolve a handle the other side pinned for this crossing and consume
    /// that pin.
    pub fn take(&self, handle: Handle) -> Option<Payload> {
        let payload = self.resolve(handle)?;
        // The entry was just resolved; a concurrent final release is the only
        // way this fails and it is already reported.
        let _ = self.release(handle);
        Some(payload)
    }

    /// Current reference count, 0 for unknown handles
    pub fn refcount(&self, handle: Handle) -> u32 {
        self.table
            .lock()
            .entries
            .get(&handle)
            .map_or(0, |entry| entry.refcount)
    }

    pub fn len(&self) -> usize {
        self.table.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> RegistryStats {
        let table = self.table.lock();
        RegistryStats {
            live: table.entries.len(),
            ..table.stats
        }
    }

    fn record_violation(&self) {
        self.table.lock().stats.protocol_violations += 1;
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("stats", &self.stats()).finish()
    }
}
