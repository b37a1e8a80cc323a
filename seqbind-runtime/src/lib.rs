//! seqbind runtime - reference registry and marshaling for generated bindings
//!
//! This crate is linked into every binding produced by the `seqbind`
//! generator. It owns the process-wide handle table that gives objects a
//! stable identity across the runtime boundary, and the codecs the generated
//! shims call to move values across it.
//!
//! Initialization order: the foreign runtime must be live first, then a
//! [`Registry`] is constructed around it and installed with
//! [`service::install`]. Generated code only calls into the registry after
//! that point.

pub mod call;
pub mod ffi;
pub mod foreign;
pub mod logging;
pub mod marshal;
pub mod refnum;
pub mod service;

pub use call::{
    no_overload_matched, ForeignError, Overloads, Ret, Signature, StubError, StubRegistry,
    StubResult,
};
pub use foreign::{ForeignRuntime, LocalFrame};
pub use marshal::{Expect, Mode, NByteSlice, NString, NString16, Value, ValueKind};
pub use refnum::{Direction, Handle, ObjectRef, Payload, Ref, Registry, RegistryError, NULL_HANDLE};
pub use service::RuntimeError;

/// Everything generated bindings need in scope.
pub mod prelude {
    pub use crate::call::{self, stubs, ForeignError, Ret, Signature};
    pub use crate::marshal::{self, Expect, Mode, NByteSlice, NString, NString16, Value, ValueKind};
    pub use crate::refnum::{Handle, ObjectRef, Ref, NULL_HANDLE};
}
