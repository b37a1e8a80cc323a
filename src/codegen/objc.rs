//! Objective-C shims
//!
//! `interfaces.h` imports the wrapped modules and declares the return
//! structs and shims; `interfaces.m` holds the bodies. Every call goes
//! through `objc_msgSend` (or `objc_msgSendSuper` for super shims) cast to
//! the exact method type. A trailing `NSError **` is passed as the address
//! of a local and handed back as the exception handle.

use super::managed::Managed;
use super::shape::{c_proto, stub_c_proto, ShimKind};
use super::{has_super, Generator, Options, Output, HEADER};
use crate::emit::{render, Fragment, Style};
use crate::marshal::{abi, declare, from_foreign, ret_struct, to_foreign, Role};
use crate::model::{Class, Func, Model, Runtime, Type};
use std::collections::BTreeSet;
use tracing::debug;

/// Wire types an Objective-C shim can return together with an error
const RET_TYPES: [&str; 14] = [
    "int",
    "nstring",
    "nbyteslice",
    "long",
    "unsigned long",
    "long long",
    "unsigned long long",
    "short",
    "unsigned short",
    "unsigned int",
    "char",
    "unsigned char",
    "float",
    "double",
];

pub struct ObjcGenerator<'a> {
    model: &'a Model,
    options: &'a Options,
}

impl<'a> ObjcGenerator<'a> {
    pub fn new(model: &'a Model, options: &'a Options) -> Self {
        Self { model, options }
    }

    fn supered(&self, class: &Class) -> bool {
        has_super(self.model, self.options, class)
    }

    /// `interfaces.h`
    pub fn header(&self) -> String {
        let mut out = Fragment::new();
        out.line(HEADER).blank();
        out.line("#include \"seqbind.h\"");
        out.blank();

        let mut seen = BTreeSet::new();
        for class in &self.model.classes {
            let Some(module) = &class.module else { continue };
            if !seen.insert((class.generated, module.as_str())) {
                continue;
            }
            if class.generated {
                out.line(format!("#import \"{module}.objc.h\""));
            } else {
                out.line(format!("@import {module};"));
            }
        }
        if !seen.is_empty() {
            out.blank();
        }

        for ty in RET_TYPES {
            let name = ty.replace(' ', "_");
            out.block_with(format!("typedef struct ret_{name} {{"), format!("}} ret_{name};"), |s| {
                s.line(format!("{ty} res;"));
                s.line("int exc;");
            });
        }
        out.blank();
        for class in &self.model.classes {
            for set in &class.methods {
                for func in &set.funcs {
                    out.line(format!("extern {};", c_proto(Runtime::Objc, ShimKind::Proxy, class, func)));
                    if self.supered(class) {
                        out.line(format!("extern {};", c_proto(Runtime::Objc, ShimKind::Super, class, func)));
                    }
                }
            }
        }
        for class in &self.model.classes {
            for set in &class.funcs {
                for func in &set.funcs {
                    out.line(format!("extern {};", c_proto(Runtime::Objc, ShimKind::Static, class, func)));
                }
            }
        }
        for class in &self.model.classes {
            for imp in self.model.implementations_of(class) {
                for set in &class.methods {
                    for func in &set.funcs {
                        out.line(format!("extern {};", stub_c_proto(Runtime::Objc, imp, func)));
                    }
                }
            }
        }
        render(&out, &Style::c())
    }

    /// `interfaces.m`
    pub fn source(&self) -> String {
        let mut out = Fragment::new();
        out.line(HEADER).blank();
        out.line("@import ObjectiveC.message;");
        out.line("#include \"seqbind.h\"");
        out.line("#include \"interfaces.h\"");

        for class in &self.model.classes {
            for set in &class.funcs {
                for func in &set.funcs {
                    out.blank();
                    out.append(self.body(class, func, ShimKind::Static));
                }
            }
            for set in &class.methods {
                for func in &set.funcs {
                    out.blank();
                    out.append(self.body(class, func, ShimKind::Proxy));
                    if self.supered(class) {
                        out.blank();
                        out.append(self.body(class, func, ShimKind::Super));
                    }
                }
            }
        }
        render(&out, &Style::c())
    }

    fn body(&self, class: &Class, func: &Func, kind: ShimKind) -> Fragment {
        let proto = c_proto(Runtime::Objc, kind, class, func);
        let mut out = Fragment::new();
        out.block_with(format!("{proto} {{"), "}", |shim| {
            shim.block_with("@autoreleasepool {", "}", |body| {
                let this_type = receiver_type(class);
                match kind {
                    ShimKind::Proxy | ShimKind::Super => {
                        body.line(format!("{} = seqbind_from_refnum(this);", declare(&this_type, "_this")));
                    }
                    ShimKind::Static if func.constructor => {
                        body.line(format!("{} = [{} alloc];", declare(&this_type, "_this"), class.name));
                    }
                    ShimKind::Static => {}
                }
                for (i, param) in func.params.iter().enumerate() {
                    if let Some(line) = to_foreign(Runtime::Objc, &param.ty, &format!("a{i}"), Role::Argument.ownership()) {
                        body.line(line);
                    }
                }
                if func.error_param.is_some() {
                    body.line("NSError *err = nil;");
                }
                if kind == ShimKind::Super {
                    body.block_with("struct objc_super _super = {", "};", |s| {
                        s.line(".receiver = _this,");
                        s.line(format!(".super_class = class_getSuperclass([{} class]),", class.name));
                    });
                }
                body.line(self.send(class, func, kind));
                body.append(finish(func));
            });
        });
        out
    }

    /// `res = ((R (*)(id, SEL, ...))objc_msgSend)(receiver, @selector(..), ...);`
    fn send(&self, class: &Class, func: &Func, kind: ShimKind) -> String {
        let call_ret = func.declared_ret();
        let ret_type = call_ret
            .and_then(|ty| abi(Runtime::Objc, ty))
            .map_or_else(|| "void".to_string(), |abi| abi.foreign_type);

        let mut types = vec![
            if kind == ShimKind::Super { "struct objc_super *" } else { "id" }.to_string(),
            "SEL".to_string(),
        ];
        let mut args = vec![
            match kind {
                ShimKind::Super => "&_super".to_string(),
                ShimKind::Static if !func.constructor => format!("[{} class]", class.name),
                _ => "_this".to_string(),
            },
            format!("@selector({})", selector(func)),
        ];
        for (i, param) in func.params.iter().enumerate() {
            let foreign = abi(Runtime::Objc, &param.ty).map_or_else(|| "id".to_string(), |abi| abi.foreign_type);
            types.push(foreign);
            args.push(format!("_a{i}"));
        }
        if func.error_param.is_some() {
            types.push("NSError **".to_string());
            args.push("&err".to_string());
        }

        let send = if kind == ShimKind::Super { "objc_msgSendSuper" } else { "objc_msgSend" };
        let call = format!(
            "(({ret_type} (*)({})){send})({});",
            types.join(", "),
            args.join(", ")
        );
        match call_ret {
            Some(_) => format!("{} = {call}", declare(&ret_type, "res")),
            None => call,
        }
    }
}

impl Generator for ObjcGenerator<'_> {
    fn runtime(&self) -> Runtime {
        Runtime::Objc
    }

    fn generate(&self) -> Output {
        let mut output = Output::new();
        output.insert("interfaces.h", self.header());
        output.insert("interfaces.m", self.source());
        for (path, text) in Managed::new(self.model, self.options).files() {
            output.insert(path, text);
        }
        debug!(event = "objc_generated", files = output.len());
        output
    }
}

/// Declared type of `_this`
fn receiver_type(class: &Class) -> String {
    let ty = if class.interface {
        Type::Protocol(class.name.clone())
    } else {
        Type::Object(class.name.clone())
    };
    abi(Runtime::Objc, &ty).map_or_else(|| "id".to_string(), |abi| abi.foreign_type)
}

fn selector(func: &Func) -> &str {
    if func.sig.is_empty() {
        &func.name
    } else {
        &func.sig
    }
}

/// Error capture, result conversion and return
fn finish(func: &Func) -> Fragment {
    let mut out = Fragment::new();
    if func.error_param.is_some() {
        out.line("NSError *_err = nil;");
        let failed = if func.declared_ret().is_some() {
            "if (!res && err != nil) {"
        } else {
            "if (err != nil) {"
        };
        out.block_with(failed, "}", |b| {
            b.line("_err = err;");
        });
        out.line("int __err = seqbind_to_refnum(_err);");
    }
    if let Some(ty) = &func.ret {
        if let Some(line) = from_foreign(Runtime::Objc, ty, "res", Role::Return.ownership()) {
            out.line(line);
        }
    }
    match (&func.ret, func.error_param.is_some()) {
        (Some(ty), true) => {
            let ret_ty = ret_struct(Runtime::Objc, ty).unwrap_or_default();
            out.line(format!("{ret_ty} _sres = {{_res, __err}};"));
            out.line("return _sres;");
        }
        (Some(_), false) => {
            out.line("return _res;");
        }
        (None, true) => {
            out.line("return __err;");
        }
        (None, false) => {}
    }
    out
}
