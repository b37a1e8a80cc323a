//! Shim symbols and signatures
//!
//! Both halves of a shim must agree on its symbol, parameter list and
//! return shape; this module is the single place deriving them.

use crate::marshal::{abi, ret_struct};
use crate::model::{names, Class, Func, Implementation, Runtime, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShimKind {
    /// Dynamic dispatch on a foreign receiver
    Proxy,
    /// Dispatch to the receiver's superclass implementation
    Super,
    /// Static function or constructor
    Static,
}

impl ShimKind {
    pub(crate) const fn prefix(self) -> &'static str {
        match self {
            Self::Proxy => "cproxy",
            Self::Super => "csuper",
            Self::Static => "cproxy_s",
        }
    }

    pub(crate) fn has_receiver(self) -> bool {
        self != Self::Static
    }
}

pub(crate) fn symbol(kind: ShimKind, class: &Class, func: &Func) -> String {
    format!("{}_{}_{}", kind.prefix(), class.native_name, func.native_name)
}

/// What a shim hands back: an optional value and an optional exception
#[derive(Debug, Clone, Copy)]
pub(crate) struct Shape<'a> {
    pub ret: Option<&'a Type>,
    pub exc: bool,
}

/// Every JNI call may raise; Objective-C calls report errors only through
/// an `NSError **` out-parameter
pub(crate) fn shape(runtime: Runtime, func: &Func) -> Shape<'_> {
    Shape {
        ret: func.ret.as_ref(),
        exc: runtime == Runtime::Java || func.error_param.is_some(),
    }
}

pub(crate) fn ffi_type(runtime: Runtime, ty: &Type) -> &'static str {
    abi(runtime, ty).map_or("()", |abi| abi.ffi_type)
}

pub(crate) fn c_type(runtime: Runtime, ty: &Type) -> &'static str {
    abi(runtime, ty).map_or("void", |abi| abi.c_type)
}

/// Native type of the exception handle
pub(crate) const fn exc_type(runtime: Runtime) -> &'static str {
    match runtime {
        Runtime::Java => "jint",
        Runtime::Objc => "int",
    }
}

/// `fn cproxy_..(this: Handle, a0: i32) -> Ret<i32>;` for an extern block
pub(crate) fn ffi_decl(runtime: Runtime, kind: ShimKind, class: &Class, func: &Func) -> String {
    let shape = shape(runtime, func);
    let ret = match (shape.ret, shape.exc) {
        (Some(ty), true) => format!(" -> Ret<{}>", ffi_type(runtime, ty)),
        (Some(ty), false) => format!(" -> {}", ffi_type(runtime, ty)),
        (None, true) => " -> Handle".to_string(),
        (None, false) => String::new(),
    };
    format!(
        "fn {}({}){ret};",
        symbol(kind, class, func),
        ffi_params(runtime, kind.has_receiver(), func)
    )
}

fn ffi_params(runtime: Runtime, receiver: bool, func: &Func) -> String {
    let mut params = Vec::with_capacity(func.params.len() + 1);
    if receiver {
        params.push("this: Handle".to_string());
    }
    for (i, param) in func.params.iter().enumerate() {
        params.push(format!("a{i}: {}", ffi_type(runtime, &param.ty)));
    }
    params.join(", ")
}

/// Native return type of a shim
pub(crate) fn c_ret(runtime: Runtime, func: &Func) -> String {
    let shape = shape(runtime, func);
    match (shape.ret, shape.exc) {
        (Some(ty), true) => ret_struct(runtime, ty).unwrap_or_else(|| "void".to_string()),
        (Some(ty), false) => c_type(runtime, ty).to_string(),
        (None, true) => exc_type(runtime).to_string(),
        (None, false) => "void".to_string(),
    }
}

/// Native prototype without the trailing `;`
pub(crate) fn c_proto(runtime: Runtime, kind: ShimKind, class: &Class, func: &Func) -> String {
    format!(
        "{} {}({})",
        c_ret(runtime, func),
        symbol(kind, class, func),
        c_params(runtime, kind.has_receiver(), func)
    )
}

fn c_params(runtime: Runtime, receiver: bool, func: &Func) -> String {
    let mut params = Vec::with_capacity(func.params.len() + 1);
    if receiver {
        params.push(format!("{} this", exc_type(runtime)));
    }
    for (i, param) in func.params.iter().enumerate() {
        params.push(format!("{} a{i}", c_type(runtime, &param.ty)));
    }
    if params.is_empty() {
        "void".to_string()
    } else {
        params.join(", ")
    }
}

/// Entry point the foreign side of a managed implementation calls for one
/// variant: `cstub_<exported>_<variant>`
pub(crate) fn stub_symbol(imp: &Implementation, func: &Func) -> String {
    format!("cstub_{}_{}", names::flatten(imp.exported_name()), func.native_name)
}

/// Rust signature of a stub entry point. Stubs can always fail, so the
/// result carries an exception handle in both runtimes.
pub(crate) fn stub_ffi_sig(runtime: Runtime, imp: &Implementation, func: &Func) -> String {
    let ret = match &func.ret {
        Some(ty) => format!("Ret<{}>", ffi_type(runtime, ty)),
        None => "Handle".to_string(),
    };
    format!(
        "pub extern \"C\" fn {}({}) -> {ret}",
        stub_symbol(imp, func),
        ffi_params(runtime, true, func)
    )
}

/// Native prototype of a stub entry point without the trailing `;`
pub(crate) fn stub_c_proto(runtime: Runtime, imp: &Implementation, func: &Func) -> String {
    let ret = match &func.ret {
        Some(ty) => ret_struct(runtime, ty).unwrap_or_else(|| "void".to_string()),
        None => exc_type(runtime).to_string(),
    };
    format!("{ret} {}({})", stub_symbol(imp, func), c_params(runtime, true, func))
}
