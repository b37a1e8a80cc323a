use crate::model::{Runtime, Slot, Type};

/// How one boundary type is carried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abi {
    /// Native type of the wire value in C/Objective-C shims
    pub c_type: &'static str,
    /// Rust mirror of `c_type` in `extern "C"` declarations
    pub ffi_type: &'static str,
    /// Type of the foreign-side local a shim converts to or from
    pub foreign_type: String,
    /// JNI `Call<X>Method` infix; empty for Objective-C
    pub jni_call: &'static str,
}

impl Abi {
    fn java(c_type: &'static str, ffi_type: &'static str, foreign: &str, jni_call: &'static str) -> Self {
        Self {
            c_type,
            ffi_type,
            foreign_type: foreign.to_string(),
            jni_call,
        }
    }

    fn objc(c_type: &'static str, ffi_type: &'static str, foreign: impl Into<String>) -> Self {
        Self {
            c_type,
            ffi_type,
            foreign_type: foreign.into(),
            jni_call: "",
        }
    }
}

/// ABI of `ty` for `runtime`; `None` when the type cannot cross
pub fn abi(runtime: Runtime, ty: &Type) -> Option<Abi> {
    match runtime {
        Runtime::Java => java_abi(ty),
        Runtime::Objc => objc_abi(ty),
    }
}

fn java_abi(ty: &Type) -> Option<Abi> {
    let abi = match ty {
        Type::Bool => Abi::java("jboolean", "u8", "jboolean", "Boolean"),
        Type::I8 => Abi::java("jbyte", "i8", "jbyte", "Byte"),
        Type::U16 => Abi::java("jchar", "u16", "jchar", "Char"),
        Type::I16 => Abi::java("jshort", "i16", "jshort", "Short"),
        Type::I32 => Abi::java("jint", "i32", "jint", "Int"),
        Type::I64 => Abi::java("jlong", "i64", "jlong", "Long"),
        Type::F32 => Abi::java("jfloat", "f32", "jfloat", "Float"),
        Type::F64 => Abi::java("jdouble", "f64", "jdouble", "Double"),
        Type::String => Abi::java("nstring", "NString16", "jstring", "Object"),
        Type::Bytes => Abi::java("nbyteslice", "NByteSlice", "jbyteArray", "Object"),
        Type::Object(_) => Abi::java("jint", "Handle", "jobject", "Object"),
        _ => return None,
    };
    Some(abi)
}

fn objc_abi(ty: &Type) -> Option<Abi> {
    let abi = match ty {
        Type::Bool => Abi::objc("char", "u8", "BOOL"),
        Type::I8 => Abi::objc("char", "i8", "char"),
        Type::U8 => Abi::objc("unsigned char", "u8", "unsigned char"),
        Type::I16 => Abi::objc("short", "i16", "short"),
        Type::U16 => Abi::objc("unsigned short", "u16", "unsigned short"),
        Type::I32 => Abi::objc("int", "i32", "int"),
        Type::U32 => Abi::objc("unsigned int", "u32", "unsigned int"),
        Type::I64 => Abi::objc("long long", "i64", "long long"),
        Type::U64 => Abi::objc("unsigned long long", "u64", "unsigned long long"),
        Type::Long => Abi::objc("long", "isize", "NSInteger"),
        Type::ULong => Abi::objc("unsigned long", "usize", "NSUInteger"),
        Type::F32 => Abi::objc("float", "f32", "float"),
        Type::F64 => Abi::objc("double", "f64", "double"),
        Type::String => Abi::objc("nstring", "NString", "NSString *"),
        Type::Bytes => Abi::objc("nbyteslice", "NByteSlice", "NSData *"),
        Type::Object(class) if class != "SEL" && class != "void" => {
            Abi::objc("int", "Handle", format!("{class} *"))
        }
        Type::Protocol(name) => Abi::objc("int", "Handle", format!("id<{name}>")),
        _ => return None,
    };
    Some(abi)
}

/// Name of the `{res, exc}` struct returning `ty` from a native shim
pub fn ret_struct(runtime: Runtime, ty: &Type) -> Option<String> {
    abi(runtime, ty).map(|abi| format!("ret_{}", abi.c_type.replace(' ', "_")))
}

/// Managed type of a parameter
pub fn managed_param(ty: &Type) -> &'static str {
    match ty {
        Type::String => "&str",
        Type::Bytes => "&[u8]",
        other => owned_scalar(other),
    }
}

/// Managed type of a return value
pub fn managed_ret(ty: &Type) -> &'static str {
    match ty {
        Type::String => "String",
        Type::Bytes => "Vec<u8>",
        other => owned_scalar(other),
    }
}

fn owned_scalar(ty: &Type) -> &'static str {
    match ty {
        Type::Bool => "bool",
        Type::I8 => "i8",
        Type::U8 => "u8",
        Type::I16 => "i16",
        Type::U16 => "u16",
        Type::I32 => "i32",
        Type::U32 => "u32",
        Type::I64 => "i64",
        Type::U64 => "u64",
        Type::Long => "isize",
        Type::ULong => "usize",
        Type::F32 => "f32",
        Type::F64 => "f64",
        _ => "Option<ObjectRef>",
    }
}

pub fn slot_param(slot: &Slot) -> &'static str {
    slot.as_type().map_or("Value", managed_param)
}

pub fn slot_ret(slot: &Slot) -> &'static str {
    slot.as_type().map_or("Value", managed_ret)
}

/// Type assertion on a `Value`, yielding the parameter shape of `ty`
pub fn value_accessor(ty: &Type) -> String {
    let method = match ty {
        Type::Bool => "as_bool",
        Type::I8 => "as_i8",
        Type::U8 => "as_u8",
        Type::I16 => "as_i16",
        Type::U16 => "as_u16",
        Type::I32 => "as_i32",
        Type::U32 => "as_u32",
        Type::I64 => "as_i64",
        Type::U64 => "as_u64",
        Type::Long => "as_isize",
        Type::ULong => "as_usize",
        Type::F32 => "as_f32",
        Type::F64 => "as_f64",
        Type::String => "as_str",
        Type::Bytes => "as_bytes",
        other => {
            let class = other.class_name().unwrap_or_default();
            return format!("object_of({class:?})");
        }
    };
    format!("{method}()")
}

/// Run-time overload expectation for a parameter of type `ty`
pub fn expect(ty: &Type) -> String {
    let kind = match ty {
        Type::Bool => "Bool",
        Type::I8 => "I8",
        Type::U8 => "U8",
        Type::I16 => "I16",
        Type::U16 => "U16",
        Type::I32 => "I32",
        Type::U32 => "U32",
        Type::I64 => "I64",
        Type::U64 => "U64",
        Type::Long => "Isize",
        Type::ULong => "Usize",
        Type::F32 => "F32",
        Type::F64 => "F64",
        Type::String => "Str",
        Type::Bytes => "Bytes",
        other => {
            let class = other.class_name().unwrap_or_default();
            return format!("Expect::object({class:?})");
        }
    };
    format!("Expect::Kind(ValueKind::{kind})")
}
