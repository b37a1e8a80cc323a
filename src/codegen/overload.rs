//! Managed method bodies
//!
//! A method set becomes one Rust function over its unified signature.
//! With several arities the body matches on the argument count (fixed
//! parameters plus the variadic tail); within an arity, variants are tried
//! in declaration order, each guarded by type assertions on the parameters
//! whose unified slot is wider than the variant's type. The first variant
//! whose assertions all hold makes the call and returns.

use super::shape::{shape, symbol, ShimKind};
use crate::emit::Fragment;
use crate::marshal::{decode, encode, slot_param, slot_ret, value_accessor, Role};
use crate::model::{Class, Func, FuncSet, Runtime, Slot};

/// Where the generated body sends its calls
pub(crate) struct CallSite<'a> {
    pub runtime: Runtime,
    pub class: &'a Class,
    pub kind: ShimKind,
    /// Expression yielding the pinned receiver handle
    pub receiver: &'a str,
}

/// Managed return type; `None` for unit
pub(crate) fn ret_type(set: &FuncSet) -> Option<String> {
    let value = set.ret.as_ref().filter(|_| set.has_ret).map(slot_ret);
    if set.throws {
        Some(format!("Result<{}, ForeignError>", value.unwrap_or("()")))
    } else {
        value.map(str::to_string)
    }
}

/// `fn name(&self, a0: i32, a1: &[Value]) -> Value`
pub(crate) fn signature(set: &FuncSet, receiver: bool) -> String {
    let mut params = Vec::with_capacity(set.params.len() + 1);
    if receiver {
        params.push("&self".to_string());
    }
    for (i, slot) in set.params.iter().enumerate() {
        let ty = slot_param(slot);
        if set.variadic && i == set.minp {
            params.push(format!("a{i}: &[{ty}]"));
        } else {
            params.push(format!("a{i}: {ty}"));
        }
    }
    let ret = ret_type(set).map(|r| format!(" -> {r}")).unwrap_or_default();
    format!("fn {}({}){ret}", set.managed_name, params.join(", "))
}

pub(crate) fn body(set: &FuncSet, site: &CallSite<'_>) -> Fragment {
    let must_return = set.funcs.len() > 1;
    let buckets = set.buckets();
    let mut out = Fragment::new();

    if buckets.len() > 1 {
        let head = format!("match {} + a{}.len() {{", set.minp, set.minp);
        out.block_with(head, "}", |arms| {
            for (arity, funcs) in &buckets {
                arms.block_with(format!("{arity} => {{"), "}", |arm| {
                    for func in funcs {
                        arm.append(variant(set, func, site, funcs.len() > 1, must_return));
                    }
                });
            }
            arms.line("_ => {}");
        });
    } else {
        for (_, funcs) in &buckets {
            for func in funcs {
                out.append(variant(set, func, site, funcs.len() > 1, must_return));
            }
        }
    }

    if must_return {
        out.line(format!(
            "call::no_overload_matched({:?}, {:?})",
            site.class.name, set.name
        ));
    }
    out
}

/// One variant: assertions, argument encoding, the call and its result
fn variant(set: &FuncSet, func: &Func, site: &CallSite<'_>, scoped: bool, must_return: bool) -> Fragment {
    let mut guards: Vec<(String, String)> = Vec::new();
    let mut sources = Vec::with_capacity(func.params.len());

    for (i, param) in func.params.iter().enumerate() {
        let (slot, arg) = if i < set.minp {
            (&set.params[i], format!("a{i}"))
        } else {
            (&set.params[set.minp], format!("a{}[{}]", set.minp, i - set.minp))
        };
        match slot {
            Slot::Typed(ty) if *ty == param.ty => sources.push(arg),
            Slot::Typed(_) => {
                let class = param.ty.class_name().unwrap_or_default();
                guards.push((format!("_a{i}"), format!("marshal::narrow(&{arg}, {class:?})")));
                sources.push(format!("_a{i}"));
            }
            Slot::Any => {
                guards.push((format!("_a{i}"), format!("{arg}.{}", value_accessor(&param.ty))));
                sources.push(format!("_a{i}"));
            }
        }
    }

    let call = call(set, func, site, &sources, must_return);
    let mut out = Fragment::new();
    match guards.as_slice() {
        [] if scoped => {
            out.block("{", "}", call);
        }
        [] => {
            out.append(call);
        }
        [(bind, expr)] => {
            out.block(format!("if let Some({bind}) = {expr} {{"), "}", call);
        }
        many => {
            let binds: Vec<String> = many.iter().map(|(b, _)| format!("Some({b})")).collect();
            let exprs: Vec<&str> = many.iter().map(|(_, e)| e.as_str()).collect();
            out.block(
                format!("if let ({}) = ({}) {{", binds.join(", "), exprs.join(", ")),
                "}",
                call,
            );
        }
    }
    out
}

fn call(set: &FuncSet, func: &Func, site: &CallSite<'_>, sources: &[String], must_return: bool) -> Fragment {
    let mut out = Fragment::new();
    let mut args = Vec::with_capacity(func.params.len() + 1);
    if site.kind.has_receiver() {
        args.push(site.receiver.to_string());
    }
    for (i, (param, src)) in func.params.iter().zip(sources).enumerate() {
        let dst = format!("__a{i}");
        out.lines(encode(site.runtime, &param.ty, src, &dst, Role::Argument.ownership()));
        args.push(dst);
    }

    let shape = shape(site.runtime, func);
    let invoke = format!(
        "unsafe {{ {}({}) }}",
        symbol(site.kind, site.class, func),
        args.join(", ")
    );
    if shape.ret.is_none() && !shape.exc {
        out.line(format!("{invoke};"));
    } else {
        out.line(format!("let res = {invoke};"));
    }

    if let Some(ty) = shape.ret {
        let wire = if shape.exc { "res.res" } else { "res" };
        out.line(format!("let _res = {};", decode(ty, wire, Role::Return.ownership())));
    }
    if shape.exc {
        let exc = if shape.ret.is_some() { "res.exc" } else { "res" };
        if set.throws {
            out.line(format!("call::check({exc})?;"));
        } else {
            out.line(format!("call::fault_on_exception({exc});"));
        }
    }

    let value = set.has_ret.then(|| match (shape.ret, &set.ret) {
        (Some(_), Some(Slot::Any)) => "Value::from(_res)".to_string(),
        (Some(_), _) => "_res".to_string(),
        (None, _) => "Value::Null".to_string(),
    });
    let result = match (set.throws, value) {
        (true, Some(v)) => Some(format!("Ok({v})")),
        (true, None) => Some("Ok(())".to_string()),
        (false, v) => v,
    };
    match (must_return, result) {
        (true, Some(r)) => {
            out.line(format!("return {r};"));
        }
        (true, None) => {
            out.line("return;");
        }
        (false, Some(r)) => {
            out.line(r);
        }
        (false, None) => {}
    }
    out
}
