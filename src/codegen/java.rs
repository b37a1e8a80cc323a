//! JNI shims
//!
//! `classes.h` declares the return structs and every shim; `classes.c`
//! holds the cached class and method IDs, `init_proxies` resolving them,
//! and one body per shim. Each body pushes a local frame, converts its
//! arguments to JNI values, makes the call, captures the pending exception
//! as a handle and pops the frame before returning.

use super::managed::Managed;
use super::shape::{c_proto, stub_c_proto, ShimKind};
use super::{has_super, Generator, Options, Output, HEADER};
use crate::emit::{render, Fragment, Style};
use crate::marshal::{abi, from_foreign, ret_struct, to_foreign, Role};
use crate::model::{descriptor, Class, Func, Model, Runtime, Type};
use tracing::debug;

/// Wire types a JNI shim can return
const RET_TYPES: [&str; 10] = [
    "jint", "jboolean", "jshort", "jchar", "jbyte", "jlong", "jfloat", "jdouble", "nstring",
    "nbyteslice",
];

pub struct JavaGenerator<'a> {
    model: &'a Model,
    options: &'a Options,
}

impl<'a> JavaGenerator<'a> {
    pub fn new(model: &'a Model, options: &'a Options) -> Self {
        Self { model, options }
    }

    fn supered(&self, class: &Class) -> bool {
        has_super(self.model, self.options, class)
    }

    /// `classes.h`
    pub fn header(&self) -> String {
        let mut out = Fragment::new();
        out.line(HEADER).blank();
        out.line("#include <jni.h>");
        out.line("#include \"seqbind.h\"");
        out.blank();
        out.line("extern void init_proxies();");
        out.blank();
        for ty in RET_TYPES {
            out.block_with(format!("typedef struct ret_{ty} {{"), format!("}} ret_{ty};"), |s| {
                s.line(format!("{ty} res;"));
                s.line("jint exc;");
            });
        }
        out.blank();
        for class in &self.model.classes {
            for set in &class.methods {
                for func in &set.funcs {
                    out.line(format!("extern {};", c_proto(Runtime::Java, ShimKind::Proxy, class, func)));
                    if self.supered(class) {
                        out.line(format!("extern {};", c_proto(Runtime::Java, ShimKind::Super, class, func)));
                    }
                }
            }
        }
        for class in &self.model.classes {
            for set in &class.funcs {
                for func in &set.funcs {
                    out.line(format!("extern {};", c_proto(Runtime::Java, ShimKind::Static, class, func)));
                }
            }
        }
        for class in &self.model.classes {
            for imp in self.model.implementations_of(class) {
                for set in &class.methods {
                    for func in &set.funcs {
                        out.line(format!("extern {};", stub_c_proto(Runtime::Java, imp, func)));
                    }
                }
            }
        }
        render(&out, &Style::c())
    }

    /// `classes.c`
    pub fn source(&self) -> String {
        let mut out = Fragment::new();
        out.line(HEADER).blank();
        out.line("#include <jni.h>");
        out.line("#include \"seqbind.h\"");
        out.line("#include \"classes.h\"");
        out.blank();

        for class in &self.model.classes {
            let jni = &class.native_name;
            out.line(format!("static jclass class_{jni};"));
            if self.supered(class) {
                out.line(format!("static jclass sclass_{jni};"));
            }
            for set in &class.funcs {
                for func in &set.funcs {
                    out.line(format!("static jmethodID m_s_{jni}_{};", func.native_name));
                }
            }
            for set in &class.methods {
                for func in &set.funcs {
                    out.line(format!("static jmethodID m_{jni}_{};", func.native_name));
                    if self.supered(class) {
                        out.line(format!("static jmethodID sm_{jni}_{};", func.native_name));
                    }
                }
            }
        }
        out.blank();
        out.append(self.init_proxies());

        for class in &self.model.classes {
            for set in &class.funcs {
                for func in &set.funcs {
                    out.blank();
                    out.append(self.static_body(class, func));
                }
            }
            for set in &class.methods {
                for func in &set.funcs {
                    out.blank();
                    out.append(self.method_body(class, func, ShimKind::Proxy));
                    if self.supered(class) {
                        out.blank();
                        out.append(self.method_body(class, func, ShimKind::Super));
                    }
                }
            }
        }
        render(&out, &Style::c())
    }

    /// Resolves and pins every class and method ID. A class missing at run
    /// time leaves its IDs null.
    fn init_proxies(&self) -> Fragment {
        let mut out = Fragment::new();
        out.block_with("void init_proxies() {", "}", |body| {
            body.line(format!(
                "JNIEnv *env = seqbind_push_local_frame({});",
                self.model.classes.len()
            ));
            body.line("jclass clazz;");
            for class in &self.model.classes {
                let jni = &class.native_name;
                body.line(format!(
                    "clazz = seqbind_find_class({:?});",
                    class.find_name.replace('.', "/")
                ));
                body.block_with("if (clazz != NULL) {", "}", |ids| {
                    ids.line(format!("class_{jni} = (*env)->NewGlobalRef(env, clazz);"));
                    if self.supered(class) {
                        ids.line(format!("sclass_{jni} = (*env)->GetSuperclass(env, clazz);"));
                        ids.line(format!("sclass_{jni} = (*env)->NewGlobalRef(env, sclass_{jni});"));
                    }
                    for set in &class.funcs {
                        for func in &set.funcs {
                            let lookup = if func.constructor {
                                format!("seqbind_get_method_id(clazz, \"<init>\", {:?})", descriptor(func))
                            } else {
                                format!(
                                    "seqbind_get_static_method_id(clazz, {:?}, {:?})",
                                    func.name,
                                    descriptor(func)
                                )
                            };
                            ids.line(format!("m_s_{jni}_{} = {lookup};", func.native_name));
                        }
                    }
                    for set in &class.methods {
                        for func in &set.funcs {
                            ids.line(format!(
                                "m_{jni}_{} = seqbind_get_method_id(clazz, {:?}, {:?});",
                                func.native_name,
                                func.name,
                                descriptor(func)
                            ));
                            if self.supered(class) {
                                ids.line(format!(
                                    "sm_{jni}_{} = seqbind_get_method_id(sclass_{jni}, {:?}, {:?});",
                                    func.native_name,
                                    func.name,
                                    descriptor(func)
                                ));
                            }
                        }
                    }
                });
            }
            body.line("seqbind_pop_local_frame(env);");
        });
        out
    }

    /// `cproxy_*` or `csuper_*`: (non-)virtual call on the receiver
    fn method_body(&self, class: &Class, func: &Func, kind: ShimKind) -> Fragment {
        let jni = &class.native_name;
        let nonvirtual = kind == ShimKind::Super;
        let call = match &func.ret {
            Some(ty) => jni_call(ty),
            None => "Void",
        };
        let mut args = vec!["env".to_string(), "_this".to_string()];
        if nonvirtual {
            args.push(format!("sclass_{jni}"));
            args.push(format!("sm_{jni}_{}", func.native_name));
        } else {
            args.push(format!("m_{jni}_{}", func.native_name));
        }
        args.extend((0..func.params.len()).map(|i| format!("_a{i}")));
        let invoke = format!(
            "(*env)->Call{}{call}Method({})",
            if nonvirtual { "Nonvirtual" } else { "" },
            args.join(", ")
        );

        let mut out = Fragment::new();
        let proto = c_proto(Runtime::Java, kind, class, func);
        out.block_with(format!("{proto} {{"), "}", |body| {
            body.line(format!(
                "JNIEnv *env = seqbind_push_local_frame({});",
                func.params.len() + 1
            ));
            body.line("jobject _this = seqbind_from_refnum(env, this, NULL, NULL);");
            body.append(arguments(func));
            body.append(finish(func, invoke));
        });
        out
    }

    /// `cproxy_s_*`: constructor or static call on the class
    fn static_body(&self, class: &Class, func: &Func) -> Fragment {
        let jni = &class.native_name;
        let mut args = vec![
            "env".to_string(),
            format!("class_{jni}"),
            format!("m_s_{jni}_{}", func.native_name),
        ];
        args.extend((0..func.params.len()).map(|i| format!("_a{i}")));
        let invoke = if func.constructor {
            format!("(*env)->NewObject({})", args.join(", "))
        } else {
            let call = func.ret.as_ref().map_or("Void", jni_call);
            format!("(*env)->CallStatic{call}Method({})", args.join(", "))
        };

        let mut out = Fragment::new();
        let proto = c_proto(Runtime::Java, ShimKind::Static, class, func);
        out.block_with(format!("{proto} {{"), "}", |body| {
            body.line(format!(
                "JNIEnv *env = seqbind_push_local_frame({});",
                func.params.len()
            ));
            body.append(arguments(func));
            body.append(finish(func, invoke));
        });
        out
    }
}

impl Generator for JavaGenerator<'_> {
    fn runtime(&self) -> Runtime {
        Runtime::Java
    }

    fn generate(&self) -> Output {
        let mut output = Output::new();
        output.insert("classes.h", self.header());
        output.insert("classes.c", self.source());
        for (path, text) in Managed::new(self.model, self.options).files() {
            output.insert(path, text);
        }
        debug!(event = "java_generated", files = output.len());
        output
    }
}

/// JNI descriptor of `func`, derived from its types when the model has none
fn descriptor(func: &Func) -> String {
    if !func.sig.is_empty() {
        return func.sig.clone();
    }
    let params: Vec<Type> = func.params.iter().map(|p| p.ty.clone()).collect();
    let ret = if func.constructor { None } else { func.ret.as_ref() };
    descriptor::method_descriptor(&params, ret).unwrap_or_default()
}

fn jni_call(ty: &Type) -> &'static str {
    abi(Runtime::Java, ty).map_or("Void", |abi| abi.jni_call)
}

fn arguments(func: &Func) -> Fragment {
    let mut out = Fragment::new();
    for (i, param) in func.params.iter().enumerate() {
        if let Some(line) = to_foreign(Runtime::Java, &param.ty, &format!("a{i}"), Role::Argument.ownership()) {
            out.line(line);
        }
    }
    out
}

/// The call, exception capture, result conversion and frame pop
fn finish(func: &Func, invoke: String) -> Fragment {
    let mut out = Fragment::new();
    let ret = func.ret.as_ref().and_then(|ty| abi(Runtime::Java, ty).map(|abi| (ty, abi)));
    match &ret {
        Some((_, abi)) => out.line(format!("{} res = {invoke};", abi.foreign_type)),
        None => out.line(format!("{invoke};")),
    };
    out.line("jobject _exc = seqbind_get_exception(env);");
    out.line("jint _exc_ref = seqbind_to_refnum(env, _exc);");
    match ret {
        Some((ty, _)) => {
            let cleared = match ty {
                Type::Object(_) | Type::String | Type::Bytes => "NULL",
                _ => "0",
            };
            out.block_with("if (_exc != NULL) {", "}", |clear| {
                clear.line(format!("res = {cleared};"));
            });
            if let Some(line) = from_foreign(Runtime::Java, ty, "res", Role::Return.ownership()) {
                out.line(line);
            }
            out.line("seqbind_pop_local_frame(env);");
            let ret_ty = ret_struct(Runtime::Java, ty).unwrap_or_default();
            out.line(format!("{ret_ty} __res = {{_res, _exc_ref}};"));
            out.line("return __res;");
        }
        None => {
            out.line("seqbind_pop_local_frame(env);");
            out.line("return _exc_ref;");
        }
    }
    out
}
