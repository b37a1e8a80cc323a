//! Foreign runtime seam
//!
//! The host embedding implements [`ForeignRuntime`] on top of JNI or the
//! Objective-C runtime. The registry only needs a handful of callbacks from
//! it: release notifications, exception descriptions, instance checks and
//! local reference frames.

use crate::refnum::Handle;
use tracing::trace;

/// Callbacks into a live foreign runtime
pub trait ForeignRuntime: Send + Sync {
    /// The managed side dropped its last proxy to a foreign-owned handle
    fn notify_release(&self, handle: Handle);

    /// Human-readable description of a foreign exception or error object
    /// (`toString()`, `localizedDescription`)
    fn describe(&self, handle: Handle) -> String;

    /// Whether the foreign object behind `handle` extends or implements `class`
    fn is_instance_of(&self, handle: Handle, class: &str) -> bool {
        let _ = (handle, class);
        false
    }

    /// Reserve room for `capacity` new local references
    fn push_local_frame(&self, capacity: usize) {
        let _ = capacity;
    }

    /// Free every local reference created since the matching push
    fn pop_local_frame(&self) {}
}

/// Scoped local reference frame.
///
/// Pushed with room for the call's parameters plus the receiver and popped on
/// every exit path, unwinding included.
pub struct LocalFrame<'a> {
    runtime: &'a dyn ForeignRuntime,
    capacity: usize,
}

impl<'a> LocalFrame<'a> {
    pub fn push(runtime: &'a dyn ForeignRuntime, capacity: usize) -> Self {
        trace!(event = "local_frame_push", capacity);
        runtime.push_local_frame(capacity);
        Self { runtime, capacity }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for LocalFrame<'_> {
    fn drop(&mut self) {
        trace!(event = "local_frame_pop", capacity = self.capacity);
        self.runtime.pop_local_frame();
    }
}
