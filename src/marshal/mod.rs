//! Marshaling rules - generation side
//!
//! Design: one closed table per foreign runtime answering, for each
//! boundary type, which native ABI type carries it, which Rust FFI type
//! mirrors that, what the managed side sees, and which conversion snippets
//! move a value between them. The run-time half of these rules lives in
//! `seqbind_runtime::marshal`; the snippets emitted here call into it.
//!
//! - `abi.rs`: ABI, FFI and managed type names
//! - `convert.rs`: conversion snippets for both sides of a shim

mod abi;
mod convert;

pub use abi::{abi, expect, managed_param, managed_ret, ret_struct, slot_param, slot_ret, value_accessor, Abi};
pub use convert::{decode, encode, from_foreign, to_foreign};
pub(crate) use convert::declare;

use crate::model::{Func, Param, Runtime, Type};

/// Ownership of a buffer crossing the boundary.
///
/// Generation-time counterpart of `seqbind_runtime::marshal::Mode`: it picks
/// which run-time codec the emitted snippet calls and the copy flag passed
/// to the native helpers. The two enums must keep the same variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Borrowed for the duration of one call
    Transient,
    /// Independently owned by the receiver
    Retained,
}

/// Position of a value in a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Argument,
    Return,
}

impl Role {
    pub const fn ownership(self) -> Ownership {
        match self {
            Self::Argument => Ownership::Transient,
            Self::Return => Ownership::Retained,
        }
    }
}

impl Ownership {
    /// Copy flag passed to the native conversion helpers
    pub const fn copy_flag(self) -> u8 {
        match self {
            Self::Transient => 0,
            Self::Retained => 1,
        }
    }
}

/// Whether `ty` may cross the boundary of `runtime`
pub fn is_supported(runtime: Runtime, ty: &Type) -> bool {
    abi(runtime, ty).is_some()
}

pub fn is_supported_param(runtime: Runtime, param: &Param) -> bool {
    if !is_supported(runtime, &param.ty) {
        return false;
    }
    match (&param.ty, &param.decl) {
        // Pointers to protocol references are out-parameters
        (Type::Protocol(_), Some(decl)) => !decl.trim_end().ends_with('*'),
        _ => true,
    }
}

/// A variant is generated only if every parameter and its return type are
/// supported
pub fn supports(runtime: Runtime, func: &Func) -> bool {
    func.params.iter().all(|p| is_supported_param(runtime, p))
        && func.ret.as_ref().map_or(true, |ty| is_supported(runtime, ty))
}

/// Whether `param` is the trailing `NSError **` out-parameter
pub fn is_error_param(param: &Param) -> bool {
    match &param.ty {
        Type::Indirect(inner) => matches!(inner.as_ref(), Type::Object(class) if class == "NSError"),
        _ => false,
    }
}
