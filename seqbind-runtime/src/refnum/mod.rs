//! Reference registry - identity and lifetime of objects crossing the boundary
//!
//! Design: an arena-style table keyed by signed 32-bit handles with external
//! reference counting. Objects never cross as pointers; only handles do.
//!
//! - `handle.rs` - handle type, null handle, ownership direction
//! - `registry.rs` - the synchronized table (register, resolve, release, pin)
//! - `proxy.rs` - managed-side views of handles (`Ref`, `ObjectRef`)

mod handle;
mod proxy;
mod registry;

pub use handle::{Direction, Handle, NULL_HANDLE};
pub use proxy::{ObjectRef, Ref};
pub use registry::{ManagedObject, Payload, Registry, RegistryError, RegistryStats};
