//! Managed (Rust) side of the bindings
//!
//! Per class: an interface trait, a proxy struct implementing it over a
//! foreign handle, a super forwarder for classes extended by managed types,
//! and a module of static functions with `cast`. Per package path: a module
//! re-exporting the class types and functions and declaring constants.

use super::overload::{self, CallSite};
use super::shape::{ffi_decl, ShimKind};
use super::stubs;
use super::{has_super, Options, HEADER};
use crate::emit::{render, Fragment, Style};
use crate::model::{names, Class, Model, Runtime, Type, Var};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use tracing::debug;

/// Module paths of the generated files
pub(crate) struct Paths {
    pub interfaces: String,
    pub proxies: String,
    /// File name prefix, `java` or `objc`
    pub prefix: &'static str,
}

impl Paths {
    pub(crate) fn new(runtime: Runtime, options: &Options) -> Self {
        let prefix = runtime.name();
        Self {
            interfaces: format!("{}::{prefix}_interfaces", options.module_root),
            proxies: format!("{}::{prefix}_proxies", options.module_root),
            prefix,
        }
    }
}

pub(crate) struct Managed<'a> {
    model: &'a Model,
    options: &'a Options,
    paths: Paths,
}

impl<'a> Managed<'a> {
    pub(crate) fn new(model: &'a Model, options: &'a Options) -> Self {
        Self {
            model,
            options,
            paths: Paths::new(model.runtime, options),
        }
    }

    fn runtime(&self) -> Runtime {
        self.model.runtime
    }

    /// Every managed file, keyed by output path
    pub(crate) fn files(&self) -> Vec<(String, String)> {
        let prefix = self.paths.prefix;
        let mut files = vec![
            (format!("{prefix}_interfaces.rs"), self.interfaces()),
            (format!("{prefix}_proxies.rs"), self.proxies()),
        ];
        files.extend(self.packages());
        files
    }

    /// `<prefix>_interfaces.rs`: one trait per class
    pub(crate) fn interfaces(&self) -> String {
        let mut out = Fragment::new();
        out.line(HEADER).blank();
        out.line("#![allow(non_snake_case, clippy::all)]").blank();
        out.line("use seqbind_runtime::prelude::*;");

        for class in &self.model.classes {
            out.blank();
            out.line(format!("/// {}", class.name));
            out.block_with(format!("pub trait {} {{", class.type_name), "}", |body| {
                for set in &class.methods {
                    body.line(format!("{};", overload::signature(set, true)));
                }
                if class.throwable {
                    body.line("fn error(&self) -> String;");
                }
            });
        }
        render(&out, &Style::rust())
    }

    /// `<prefix>_proxies.rs`: shim declarations, proxies, forwarders,
    /// static modules, stubs with their entry points and `init_classes`
    pub(crate) fn proxies(&self) -> String {
        let runtime = self.runtime();
        let mut out = Fragment::new();
        out.line(HEADER).blank();
        out.line("#![allow(non_snake_case, unused_variables, unreachable_code, clippy::all)]");
        out.blank();
        out.line(format!("use {}::*;", self.paths.interfaces));
        out.line("use seqbind_runtime::prelude::*;");
        out.line("use std::fmt;");
        out.line("use std::sync::Arc;");
        out.blank();

        out.block_with("extern \"C\" {", "}", |decls| {
            if runtime == Runtime::Java {
                decls.line("fn init_proxies();");
                decls.line("fn seqbind_unwrap(handle: Handle) -> Handle;");
            }
            for class in &self.model.classes {
                let supered = has_super(self.model, self.options, class);
                for set in &class.methods {
                    for func in &set.funcs {
                        decls.line(ffi_decl(runtime, ShimKind::Proxy, class, func));
                        if supered {
                            decls.line(ffi_decl(runtime, ShimKind::Super, class, func));
                        }
                    }
                }
                for set in &class.funcs {
                    for func in &set.funcs {
                        decls.line(ffi_decl(runtime, ShimKind::Static, class, func));
                    }
                }
            }
        });

        out.blank();
        out.line("/// Resolve native class handles and register managed implementations.");
        out.line("/// Call once, after the runtime registry is installed.");
        out.block_with("pub fn init_classes() {", "}", |body| {
            if runtime == Runtime::Java {
                body.line("unsafe { init_proxies() };");
            }
            for imp in &self.model.implementations {
                body.line(format!("{}();", stubs::register_fn_name(imp)));
            }
        });

        for class in &self.model.classes {
            out.blank();
            out.append(self.proxy(class));
        }

        for class in &self.model.classes {
            for imp in self.model.implementations_of(class) {
                out.blank();
                out.append(stubs::register_fn(class, imp, &self.paths));
                out.blank();
                out.append(stubs::entry_points(runtime, class, imp));
            }
        }
        render(&out, &Style::rust())
    }

    fn proxy(&self, class: &Class) -> Fragment {
        let runtime = self.runtime();
        let proxy = class.proxy_name();
        let supered = has_super(self.model, self.options, class);
        let mut out = Fragment::new();

        out.line(format!("/// {} owned by the foreign runtime", class.name));
        out.line("#[derive(Debug, Clone)]");
        out.line(format!("pub struct {proxy}(pub Arc<Ref>);"));
        out.blank();

        out.block_with(format!("impl {proxy} {{"), "}", |body| {
            body.block_with("pub fn bind_proxy_refnum(&self) -> Handle {", "}", |f| {
                f.line("self.0.bind_proxy_refnum()");
            });
            if supered {
                body.blank();
                body.line("/// Calls dispatched to the superclass implementation");
                body.block_with(format!("pub fn super_(&self) -> {} {{", class.super_name()), "}", |f| {
                    f.line(format!("{}(self.clone())", class.super_name()));
                });
                if runtime == Runtime::Java {
                    body.blank();
                    body.line("/// Managed object this foreign object wraps, if any");
                    body.block_with("pub fn unwrap(&self) -> Option<ObjectRef> {", "}", |f| {
                        f.line("ObjectRef::from_refnum(unsafe { seqbind_unwrap(self.bind_proxy_refnum()) })");
                    });
                }
            }
        });
        out.blank();

        out.block_with(format!("impl From<{proxy}> for ObjectRef {{"), "}", |body| {
            body.block_with(format!("fn from(proxy: {proxy}) -> Self {{"), "}", |f| {
                f.line("ObjectRef::Foreign(proxy.0)");
            });
        });
        out.blank();

        out.append(self.trait_impl(class, &proxy, ShimKind::Proxy, "self.bind_proxy_refnum()"));

        if class.throwable {
            out.blank();
            out.block_with(format!("impl fmt::Display for {proxy} {{"), "}", |body| {
                body.block_with("fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {", "}", |f| {
                    f.line(format!("f.write_str(&{}::error(self))", class.type_name));
                });
            });
            out.blank();
            out.line(format!("impl std::error::Error for {proxy} {{}}"));
        }

        if supered {
            let forwarder = class.super_name();
            out.blank();
            out.line(format!("/// Superclass view of a {proxy}"));
            out.line("#[derive(Debug, Clone)]");
            out.line(format!("pub struct {forwarder}({proxy});"));
            out.blank();
            out.append(self.trait_impl(class, &forwarder, ShimKind::Super, "self.0.bind_proxy_refnum()"));
        }

        out.blank();
        out.append(self.statics(class));
        out
    }

    fn trait_impl(&self, class: &Class, target: &str, kind: ShimKind, receiver: &str) -> Fragment {
        let site = CallSite {
            runtime: self.runtime(),
            class,
            kind,
            receiver,
        };
        let mut out = Fragment::new();
        out.block_with(format!("impl {} for {target} {{", class.type_name), "}", |body| {
            let mut first = true;
            for set in &class.methods {
                if !first {
                    body.blank();
                }
                first = false;
                body.block(
                    format!("{} {{", overload::signature(set, true)),
                    "}",
                    overload::body(set, &site),
                );
            }
            if class.throwable {
                if !first {
                    body.blank();
                }
                body.block_with("fn error(&self) -> String {", "}", |f| {
                    match kind {
                        ShimKind::Super => f.line(format!("{}::error(&self.0)", class.type_name)),
                        _ => f.line(error_text(class)),
                    };
                });
            }
        });
        out
    }

    /// `pub mod <class>` holding static functions, constructors and `cast`
    fn statics(&self, class: &Class) -> Fragment {
        let site = CallSite {
            runtime: self.runtime(),
            class,
            kind: ShimKind::Static,
            receiver: "",
        };
        let proxy = class.proxy_name();
        let mut out = Fragment::new();
        out.line(format!("/// Static functions of {}", class.name));
        out.block_with(format!("pub mod {} {{", class.statics_module()), "}", |body| {
            body.line("use super::*;");
            for set in &class.funcs {
                body.blank();
                body.block(
                    format!("pub {} {{", overload::signature(set, false)),
                    "}",
                    overload::body(set, &site),
                );
            }
            body.blank();
            body.line(format!("/// Reinterpret `object` as a {}", class.name));
            body.line("///");
            body.line("/// # Panics");
            body.line("/// If `object` is not a foreign instance of the class.");
            body.block_with(format!("pub fn cast(object: &ObjectRef) -> {proxy} {{"), "}", |f| {
                f.block_with("match object {", "}", |arms| {
                    arms.line(format!(
                        "ObjectRef::Foreign(proxy) if object.is_instance_of({:?}) => {proxy}(proxy.clone()),",
                        class.name
                    ));
                    arms.line(format!("_ => call::not_an_instance(object, {:?}),", class.name));
                });
            });
        });
        out
    }

    /// One module per package path, plus a `mod.rs` mounting them
    pub(crate) fn packages(&self) -> Vec<(String, String)> {
        let runtime = self.runtime();
        let mut packages: BTreeMap<String, Package<'_>> = BTreeMap::new();
        for class in &self.model.classes {
            let type_pkg = class.type_package(runtime);
            if !type_pkg.is_empty() {
                packages.entry(type_pkg).or_default().types.push(class);
            }
            packages
                .entry(class.package_path(runtime))
                .or_default()
                .members
                .push(class);
        }

        let prefix = self.paths.prefix;
        let mut files = Vec::with_capacity(packages.len() + 1);
        let mut index = Fragment::new();
        index.line(HEADER);
        for (path, package) in &packages {
            let module = package_module(path);
            index.blank();
            index.line(format!("#[path = \"{path}.rs\"]"));
            index.line(format!("pub mod {module};"));
            files.push((format!("{prefix}/{path}.rs"), self.package(path, package)));
        }
        files.push((format!("{prefix}/mod.rs"), render(&index, &Style::rust())));
        files
    }

    fn package(&self, path: &str, package: &Package<'_>) -> String {
        let mut out = Fragment::new();
        out.line(HEADER).blank();
        out.line(format!("//! {}", path.replace('/', ".")));

        if !package.types.is_empty() {
            out.blank();
            for class in &package.types {
                out.line(format!(
                    "pub use {}::{} as {};",
                    self.paths.interfaces, class.type_name, class.pkg_name
                ));
            }
        }
        for class in &package.members {
            out.blank();
            out.line(format!(
                "pub use {}::{}::*;",
                self.paths.proxies,
                class.statics_module()
            ));
            let constants: Vec<String> = class.vars.iter().filter_map(constant).collect();
            if !constants.is_empty() {
                out.blank();
                out.lines(constants);
            }
        }
        render(&out, &Style::rust())
    }
}

#[derive(Default)]
struct Package<'a> {
    /// Classes whose type alias lives here
    types: Vec<&'a Class>,
    /// Classes whose functions and constants live here
    members: Vec<&'a Class>,
}

/// `java/lang/Integer` → `java_lang_integer`
fn package_module(path: &str) -> String {
    names::escape(names::snake_case(&path.replace('/', "_")))
}

/// Text of a throwable's `error()`: its `toString`/`description` when the
/// class has one, otherwise its class and handle
fn error_text(class: &Class) -> String {
    let describing = class.methods.iter().find(|set| {
        (set.name == "toString" || set.name == "description")
            && set.funcs.len() == 1
            && set.params.is_empty()
            && !set.throws
            && set.ret.as_ref().and_then(|slot| slot.as_type()) == Some(&Type::String)
    });
    match describing {
        Some(set) => format!("{}::{}(self)", class.type_name, set.managed_name),
        None => format!("format!(\"{} {{}}\", self.0.handle())", class.name),
    }
}

/// `pub const NAME: T = value;`, or `None` when the literal does not fit
fn constant(var: &Var) -> Option<String> {
    let name = if var.name.chars().all(|c| !c.is_lowercase()) {
        var.name.clone()
    } else {
        names::snake_case(&var.name).to_uppercase()
    };
    let (ty, literal) = match (&var.ty, &var.value) {
        (Type::Bool, Json::Bool(b)) => ("bool", b.to_string()),
        (Type::String, Json::String(s)) => ("&str", format!("{s:?}")),
        (Type::F32 | Type::F64, Json::Number(n)) => {
            let text = n.to_string();
            let text = if text.contains(['.', 'e', 'E']) { text } else { format!("{text}.0") };
            (if var.ty == Type::F32 { "f32" } else { "f64" }, text)
        }
        (Type::U16, Json::String(s)) if s.chars().count() == 1 => {
            let c = s.chars().next()?;
            let mut units = [0u16; 2];
            let encoded = c.encode_utf16(&mut units);
            if encoded.len() != 1 {
                return None;
            }
            ("u16", encoded[0].to_string())
        }
        (ty, Json::Number(n)) if is_integer(ty) && (n.is_i64() || n.is_u64()) => {
            (crate::marshal::managed_ret(ty), n.to_string())
        }
        _ => {
            debug!(event = "constant_skipped", name = %var.name, ty = %var.ty, "unrepresentable constant");
            return None;
        }
    };
    Some(format!("pub const {name}: {ty} = {literal};"))
}

fn is_integer(ty: &Type) -> bool {
    matches!(
        ty,
        Type::I8 | Type::U8 | Type::I16 | Type::U16 | Type::I32 | Type::U32 | Type::I64 | Type::U64 | Type::Long | Type::ULong
    )
}
