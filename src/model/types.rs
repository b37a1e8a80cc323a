//! Boundary types
//!
//! The set is closed: primitives, strings, byte arrays and object references
//! cross the boundary; arrays of anything but bytes, indirections and
//! unrecognized declarations are representable only so they can be
//! rejected at generation time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Foreign runtime a model describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    /// VM-hosted object model over JNI, native shims in C
    Java,
    /// Message-passing object model, native shims in Objective-C
    Objc,
}

impl Runtime {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Objc => "objc",
        }
    }

    /// Root of the class hierarchy objects unify to, if the runtime has one
    pub const fn root_class(self) -> Option<&'static str> {
        match self {
            Self::Java => Some("java.lang.Object"),
            Self::Objc => None,
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    /// Pointer-width signed integer (`NSInteger`)
    Long,
    /// Pointer-width unsigned integer (`NSUInteger`)
    #[serde(rename = "ulong")]
    ULong,
    F32,
    F64,
    String,
    Bytes,
    /// Instance of a foreign class
    Object(String),
    /// Conformer of a foreign protocol
    Protocol(String),
    Array(Box<Type>),
    Indirect(Box<Type>),
    Unknown(String),
}

impl Type {
    pub fn object(class: &str) -> Self {
        Self::Object(class.to_string())
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Protocol(_))
    }

    /// Class or protocol name of a reference type
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Object(name) | Self::Protocol(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::I8 => f.write_str("i8"),
            Self::U8 => f.write_str("u8"),
            Self::I16 => f.write_str("i16"),
            Self::U16 => f.write_str("u16"),
            Self::I32 => f.write_str("i32"),
            Self::U32 => f.write_str("u32"),
            Self::I64 => f.write_str("i64"),
            Self::U64 => f.write_str("u64"),
            Self::Long => f.write_str("long"),
            Self::ULong => f.write_str("ulong"),
            Self::F32 => f.write_str("f32"),
            Self::F64 => f.write_str("f64"),
            Self::String => f.write_str("string"),
            Self::Bytes => f.write_str("bytes"),
            Self::Object(name) => write!(f, "object {name}"),
            Self::Protocol(name) => write!(f, "protocol {name}"),
            Self::Array(elem) => write!(f, "[{elem}]"),
            Self::Indirect(inner) => write!(f, "*{inner}"),
            Self::Unknown(decl) => write!(f, "unknown {decl:?}"),
        }
    }
}

/// Unified parameter or return slot of an overload set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Every variant agrees on (a supertype of) this type
    Typed(Type),
    /// Variants disagree; rendered as the tagged union `Value`
    Any,
}

impl Slot {
    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Self::Typed(ty) => Some(ty),
            Self::Any => None,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}
