//! Stub registration for managed types extending foreign classes
//!
//! Every variant of every method set gets a stub registered under the
//! managed type's exported name. A stub downcasts the receiver, converts
//! the run-time arguments to the set's unified signature and calls the
//! interface trait method the managed type implements. Each variant also
//! gets a `#[no_mangle]` entry point the foreign subclass calls; it decodes
//! the wire arguments and dispatches through the stub table.

use super::managed::Paths;
use super::shape::stub_ffi_sig;
use crate::emit::Fragment;
use crate::marshal::{decode, encode, expect, value_accessor, Role};
use crate::model::{names, Class, Func, FuncSet, Implementation, Runtime, Slot, Type};

pub(crate) fn register_fn_name(imp: &Implementation) -> String {
    format!("register_{}", names::snake_case(&names::flatten(imp.exported_name())))
}

/// `fn register_<name>() { ... }` for one implementation
pub(crate) fn register_fn(class: &Class, imp: &Implementation, paths: &Paths) -> Fragment {
    let mut out = Fragment::new();
    out.line(format!(
        "/// Stubs for {} extending {}",
        imp.rust_type, class.name
    ));
    let head = format!("fn {}() {{", register_fn_name(imp));
    out.block_with(head, "}", |body| {
        body.line("let stubs = stubs::global();");
        for set in &class.methods {
            for func in &set.funcs {
                body.append(register_variant(class, imp, set, func, paths));
            }
        }
    });
    out
}

fn register_variant(class: &Class, imp: &Implementation, set: &FuncSet, func: &Func, paths: &Paths) -> Fragment {
    let expects: Vec<String> = func.params.iter().map(|p| expect(&p.ty)).collect();
    let open = format!(
        "stubs.register({:?}, {:?}, Signature::new(vec![{}]), |receiver, args| {{",
        imp.exported_name(),
        set.name,
        expects.join(", ")
    );

    let mut out = Fragment::new();
    out.block_with(open, "});", |body| {
        body.line(format!("let this = receiver.downcast::<{}>()?;", imp.rust_type));

        let mut args = vec!["this".to_string()];
        for (i, slot) in set.params.iter().enumerate() {
            if set.variadic && i == set.minp {
                match slot {
                    Slot::Any => args.push(format!("&args[{i}..]")),
                    Slot::Typed(ty) => {
                        body.line(format!(
                            "let tail: Vec<_> = args[{i}..].iter().map(|v| {}).collect();",
                            from_value("v", ty)
                        ));
                        args.push("&tail".to_string());
                    }
                }
            } else {
                match slot {
                    Slot::Any => args.push(format!("args[{i}].clone()")),
                    Slot::Typed(ty) => args.push(from_value(&format!("args[{i}]"), ty)),
                }
            }
        }

        let trait_path = format!("{}::{}", paths.interfaces, class.type_name);
        let invoke = format!("{trait_path}::{}({})", set.managed_name, args.join(", "));
        let invoke = if set.throws { format!("{invoke}?") } else { invoke };
        if set.has_ret {
            body.line(format!("Ok(Value::from({invoke}))"));
        } else {
            body.line(format!("{invoke};")).line("Ok(Value::Null)");
        }
    });
    out
}

/// `#[no_mangle]` entry points for every variant one implementation
/// overrides
pub(crate) fn entry_points(runtime: Runtime, class: &Class, imp: &Implementation) -> Fragment {
    let mut out = Fragment::new();
    let mut first = true;
    for set in &class.methods {
        for func in &set.funcs {
            if !first {
                out.blank();
            }
            first = false;
            out.append(entry_point(runtime, class, imp, set, func));
        }
    }
    out
}

fn entry_point(runtime: Runtime, class: &Class, imp: &Implementation, set: &FuncSet, func: &Func) -> Fragment {
    let mut out = Fragment::new();
    out.line(format!(
        "/// Foreign dispatch of {}.{} to {}",
        class.name, set.name, imp.rust_type
    ));
    out.line("#[no_mangle]");
    out.block_with(format!("{} {{", stub_ffi_sig(runtime, imp, func)), "}", |body| {
        let values: Vec<String> = func
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let src = format!("a{i}");
                format!("Value::from({})", decode(&param.ty, &src, Role::Argument.ownership()))
            })
            .collect();
        body.line(format!(
            "let args: [Value; {}] = [{}];",
            values.len(),
            values.join(", ")
        ));

        let dispatch = format!(
            "match stubs::global().invoke(this, {:?}, {:?}, &args) {{",
            imp.exported_name(),
            set.name
        );
        body.block_with(dispatch, "}", |arms| match &func.ret {
            Some(ty) => {
                arms.block_with("Ok(res) => {", "}", |ok| {
                    ok.line(format!("let _res = {};", from_value("res", ty)));
                    ok.lines(encode(runtime, ty, "_res", "__res", Role::Return.ownership()));
                    ok.line("Ret::ok(__res)");
                });
                arms.line("Err(err) => Ret::raised(stubs::exception(err)),");
            }
            None => {
                arms.line("Ok(_) => NULL_HANDLE,");
                arms.line("Err(err) => stubs::exception(err),");
            }
        });
    });
    out
}

/// Convert a run-time value to the managed shape of `ty`. Overload
/// resolution has already checked argument tags, so for arguments the
/// defaults are unreachable.
fn from_value(src: &str, ty: &Type) -> String {
    match ty {
        Type::Object(_) | Type::Protocol(_) => format!("{src}.{}.flatten()", value_accessor(ty)),
        _ => format!("{src}.{}.unwrap_or_default()", value_accessor(ty)),
    }
}
