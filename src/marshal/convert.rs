//! Conversion snippets
//!
//! Rust side: `encode` turns a managed value into its wire form before a
//! shim call, `decode` turns a wire value back into the managed form.
//! Native side: `to_foreign` turns a wire value into a JNI/Objective-C
//! local, `from_foreign` does the reverse. Every snippet declares its
//! destination as a fresh local.

use super::abi::abi;
use super::Ownership;
use crate::model::{Runtime, Type};

/// Rust statements binding `dst` to the wire form of `src`
pub fn encode(runtime: Runtime, ty: &Type, src: &str, dst: &str, ownership: Ownership) -> Vec<String> {
    match ty {
        Type::Bool => vec![format!("let {dst} = marshal::encode_bool({src});")],
        Type::String => {
            let codec = match runtime {
                Runtime::Java => "NString16",
                Runtime::Objc => "NString",
            };
            vec![format!("let {dst} = {codec}::encode({src});")]
        }
        Type::Bytes => match ownership {
            Ownership::Transient => vec![
                format!("let {dst}_view = NByteSlice::view({src});"),
                format!("let {dst} = {dst}_view.raw();"),
            ],
            Ownership::Retained => vec![format!("let {dst} = NByteSlice::copy_of({src});")],
        },
        Type::Object(_) | Type::Protocol(_) => vec![format!(
            "let {dst} = {src}.as_ref().map_or(NULL_HANDLE, ObjectRef::to_refnum);"
        )],
        _ => vec![format!("let {dst} = {src};")],
    }
}

/// Rust expression for the managed form of wire value `src`
pub fn decode(ty: &Type, src: &str, ownership: Ownership) -> String {
    match ty {
        Type::Bool => format!("marshal::decode_bool({src})"),
        Type::String => format!("unsafe {{ {src}.decode() }}"),
        Type::Bytes => match ownership {
            Ownership::Retained => format!("unsafe {{ {src}.into_vec() }}"),
            Ownership::Transient => format!("unsafe {{ {src}.copy_to_vec() }}"),
        },
        Type::Object(_) | Type::Protocol(_) => format!("ObjectRef::from_refnum({src})"),
        _ => src.to_string(),
    }
}

/// Native statement converting wire value `name` into foreign local `_name`
pub fn to_foreign(runtime: Runtime, ty: &Type, name: &str, ownership: Ownership) -> Option<String> {
    let foreign = abi(runtime, ty)?.foreign_type;
    let copy = ownership.copy_flag();
    let line = match (runtime, ty) {
        (Runtime::Java, Type::String) => {
            format!("jstring _{name} = seqbind_to_java_string(env, {name});")
        }
        (Runtime::Java, Type::Bytes) => {
            format!("jbyteArray _{name} = seqbind_to_java_bytearray(env, {name}, {copy});")
        }
        (Runtime::Java, Type::Object(_)) => {
            format!("jobject _{name} = seqbind_from_refnum(env, {name}, NULL, NULL);")
        }
        (Runtime::Java, Type::Bool) => {
            format!("jboolean _{name} = {name} ? JNI_TRUE : JNI_FALSE;")
        }
        (Runtime::Objc, Type::String) => {
            format!("NSString *_{name} = seqbind_to_objc_string({name});")
        }
        (Runtime::Objc, Type::Bytes) => {
            format!("NSData *_{name} = seqbind_to_objc_bytearray({name}, {copy});")
        }
        (Runtime::Objc, Type::Object(_) | Type::Protocol(_)) => {
            format!("{} = seqbind_from_refnum({name});", declare(&foreign, &format!("_{name}")))
        }
        (Runtime::Objc, Type::Bool) => format!("BOOL _{name} = {name} ? YES : NO;"),
        _ => format!("{foreign} _{name} = ({foreign}){name};"),
    };
    Some(line)
}

/// Native statement converting foreign local `name` into wire value `_name`
pub fn from_foreign(runtime: Runtime, ty: &Type, name: &str, ownership: Ownership) -> Option<String> {
    let c_type = abi(runtime, ty)?.c_type;
    let copy = ownership.copy_flag();
    let line = match (runtime, ty) {
        (Runtime::Java, Type::String) => {
            format!("nstring _{name} = seqbind_from_java_string(env, {name});")
        }
        (Runtime::Java, Type::Bytes) => {
            format!("nbyteslice _{name} = seqbind_from_java_bytearray(env, {name}, {copy});")
        }
        (Runtime::Java, Type::Object(_)) => {
            format!("jint _{name} = seqbind_to_refnum(env, {name});")
        }
        (Runtime::Java, Type::Bool) => format!("jboolean _{name} = {name} ? 1 : 0;"),
        (Runtime::Objc, Type::String) => {
            format!("nstring _{name} = seqbind_from_objc_string({name});")
        }
        (Runtime::Objc, Type::Bytes) => {
            format!("nbyteslice _{name} = seqbind_from_objc_bytearray({name}, {copy});")
        }
        (Runtime::Objc, Type::Object(_) | Type::Protocol(_)) => {
            format!("int _{name} = seqbind_to_refnum({name});")
        }
        _ => format!("{c_type} _{name} = ({c_type}){name};"),
    };
    Some(line)
}

/// `T *` types bind as `T *name`, everything else as `T name`
pub(crate) fn declare(ty: &str, name: &str) -> String {
    match ty.strip_suffix(" *") {
        Some(base) => format!("{base} *{name}"),
        None => format!("{ty} {name}"),
    }
}
