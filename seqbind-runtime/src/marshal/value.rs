//! Tagged union for multi-kind slots
//!
//! When the variants of an overloaded method disagree on a parameter or
//! return type, the unified slot carries a [`Value`]. The set of kinds is
//! closed: exactly the kinds that may cross the boundary.

use crate::refnum::ObjectRef;
use std::fmt;

/// Value of any supported kind
#[derive(Debug, Clone)]
pub enum Value {
    /// No value: a null object or a variant without a return
    Null,
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    Isize(isize),
    Usize(usize),
    F32(f32),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    Object(ObjectRef),
}

/// Type tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    Isize,
    Usize,
    F32,
    F64,
    Str,
    Bytes,
    Object,
}

impl ValueKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::Isize => "isize",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Str => "string",
            Self::Bytes => "bytes",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameter expectation checked by run-time overload resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expect {
    /// Any value of this kind
    Kind(ValueKind),
    /// Null, or an object that is an instance of the named foreign class
    Object(String),
    /// Anything, including null
    Any,
}

impl Expect {
    pub fn object(class: &str) -> Self {
        Self::Object(class.to_string())
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::I8(_) => ValueKind::I8,
            Self::U8(_) => ValueKind::U8,
            Self::I16(_) => ValueKind::I16,
            Self::U16(_) => ValueKind::U16,
            Self::I32(_) => ValueKind::I32,
            Self::U32(_) => ValueKind::U32,
            Self::I64(_) => ValueKind::I64,
            Self::U64(_) => ValueKind::U64,
            Self::Isize(_) => ValueKind::Isize,
            Self::Usize(_) => ValueKind::Usize,
            Self::F32(_) => ValueKind::F32,
            Self::F64(_) => ValueKind::F64,
            Self::Str(_) => ValueKind::Str,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Object(_) => ValueKind::Object,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Type assertion against an expectation
    pub fn satisfies(&self, expect: &Expect) -> bool {
        match expect {
            Expect::Any => true,
            Expect::Kind(kind) => self.kind() == *kind,
            Expect::Object(class) => self.object_of(class).is_some(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Any object, regardless of class
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Object that is an instance of `class`
    pub fn as_object_of(&self, class: &str) -> Option<ObjectRef> {
        self.as_object()
            .filter(|o| o.is_instance_of(class))
            .cloned()
    }

    /// Narrow to a nullable object slot of `class`. Null narrows to
    /// `Some(None)`; anything that is not an instance of `class` to `None`.
    pub fn object_of(&self, class: &str) -> Option<Option<ObjectRef>> {
        match self {
            Self::Null => Some(None),
            Self::Object(o) => o.is_instance_of(class).then(|| Some(o.clone())),
            _ => None,
        }
    }

    /// Nullable object slot
    pub fn into_object(self) -> Option<ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }
}

macro_rules! scalar_access {
    ($($as:ident => $variant:ident($ty:ty)),* $(,)?) => {
        impl Value {
            $(
                #[inline]
                pub fn $as(&self) -> Option<$ty> {
                    match self {
                        Self::$variant(v) => Some(*v),
                        _ => None,
                    }
                }
            )*
        }

        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

scalar_access! {
    as_bool => Bool(bool),
    as_i8 => I8(i8),
    as_u8 => U8(u8),
    as_i16 => I16(i16),
    as_u16 => U16(u16),
    as_i32 => I32(i32),
    as_u32 => U32(u32),
    as_i64 => I64(i64),
    as_u64 => U64(u64),
    as_isize => Isize(isize),
    as_usize => Usize(usize),
    as_f32 => F32(f32),
    as_f64 => F64(f64),
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Self::Object(v)
    }
}

impl From<Option<ObjectRef>> for Value {
    fn from(v: Option<ObjectRef>) -> Self {
        v.map_or(Self::Null, Self::Object)
    }
}

/// Narrow a nullable object slot to `class`, keeping null
pub fn narrow(slot: &Option<ObjectRef>, class: &str) -> Option<Option<ObjectRef>> {
    match slot {
        None => Some(None),
        Some(o) => o.is_instance_of(class).then(|| Some(o.clone())),
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Null
    }
}
