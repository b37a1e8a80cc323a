//! Foreign type model
//!
//! Design: extractors describe foreign classes as JSON (`ModelFile`).
//! `Model::new` validates that description once, groups methods into
//! overload sets with unified signatures, derives every generated name and
//! drops variants whose types cannot cross the boundary. The result is
//! immutable and is all the generators look at.
//!
//! - `types.rs`: boundary types and unified slots
//! - `func.rs`: methods, overload sets, class hierarchy
//! - `class.rs`: classes, constants, managed implementations
//! - `descriptor.rs`: JNI descriptors
//! - `names.rs`: identifier derivation

pub mod class;
pub mod descriptor;
pub mod func;
pub mod names;
pub mod types;

pub use class::{Class, ClassDecl, Implementation, ModelFile, Var};
pub use func::{Func, FuncSet, Hierarchy, Param};
pub use types::{Runtime, Slot, Type};

use crate::errors::{BindError, Result};
use crate::marshal;
use names::UniqueNames;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Validated model ready for generation
#[derive(Debug, Clone)]
pub struct Model {
    pub runtime: Runtime,
    pub classes: Vec<Class>,
    pub implementations: Vec<Implementation>,
}

/// Knobs affecting model construction
#[derive(Debug, Clone, Default)]
pub struct ModelOptions {
    /// Package prefix tried when resolving implementation classes
    pub java_pkg: String,
}

impl Model {
    pub fn from_json(text: &str, options: &ModelOptions) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(text)?;
        Self::new(file, options)
    }

    pub fn new(file: ModelFile, options: &ModelOptions) -> Result<Self> {
        let runtime = file.runtime;

        let mut seen = HashSet::new();
        for decl in &file.classes {
            if !seen.insert((decl.name.as_str(), decl.interface)) {
                return Err(BindError::DuplicateClass(decl.name.clone()));
            }
        }
        // Objective-C allows a class and a protocol to share a name
        let shared: HashSet<&str> = file
            .classes
            .iter()
            .filter(|d| d.interface)
            .map(|d| d.name.as_str())
            .filter(|name| seen.contains(&(*name, false)))
            .collect();

        let mut hierarchy = Hierarchy::new(runtime.root_class());
        for decl in &file.classes {
            hierarchy.insert(&decl.name, &decl.supers);
        }

        let mut classes = Vec::with_capacity(file.classes.len());
        for decl in &file.classes {
            let shared = shared.contains(decl.name.as_str());
            classes.push(build_class(runtime, decl, shared, &hierarchy)?);
        }

        let implementations = file
            .implementations
            .into_iter()
            .map(|imp| resolve_implementation(imp, &classes, options))
            .collect::<Result<Vec<_>>>()?;

        info!(
            event = "model_built",
            runtime = %runtime,
            classes = classes.len(),
            implementations = implementations.len(),
            "model built"
        );
        Ok(Self {
            runtime,
            classes,
            implementations,
        })
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }

    /// Whether a managed type extends `class`, which then needs super shims
    pub fn is_implemented(&self, class: &Class) -> bool {
        self.implementations.iter().any(|imp| imp.class == class.name)
    }

    pub fn implementations_of<'a>(&'a self, class: &'a Class) -> impl Iterator<Item = &'a Implementation> {
        self.implementations.iter().filter(move |imp| imp.class == class.name)
    }
}

fn build_class(runtime: Runtime, decl: &ClassDecl, shared: bool, hierarchy: &Hierarchy) -> Result<Class> {
    let (pkg_name, native_name, type_name) = match runtime {
        Runtime::Java => {
            let pkg = decl.name.rsplit('.').next().unwrap_or(&decl.name).to_string();
            (pkg, names::flatten(&decl.name), names::camel_case(&decl.name))
        }
        Runtime::Objc => {
            let native = match (shared, decl.interface) {
                (true, true) => format!("{}P", decl.name),
                (true, false) => format!("{}C", decl.name),
                _ => decl.name.clone(),
            };
            let qualified = match &decl.module {
                Some(module) => format!("{module}.{native}"),
                None => native.clone(),
            };
            (native.clone(), native, names::camel_case(&qualified))
        }
    };

    let mut excluded = 0;
    let mut unique = UniqueNames::new();
    let mut native_unique = UniqueNames::new();

    let mut statics = Vec::new();
    for func in &decl.funcs {
        if !func.public {
            continue;
        }
        let mut func = normalize(runtime, decl, func.clone())?;
        if func.constructor && func.ret.is_none() {
            func.ret = Some(Type::Object(decl.name.clone()));
        }
        statics.push(func);
    }
    let methods = decl
        .methods
        .iter()
        .map(|f| normalize(runtime, decl, f.clone()))
        .collect::<Result<Vec<_>>>()?;

    let mut method_sets = Vec::new();
    for (name, funcs) in group(runtime, decl, methods, &mut excluded) {
        method_sets.push(build_set(runtime, &name, funcs, hierarchy, &mut unique, &mut native_unique));
    }
    let mut func_sets = Vec::new();
    for (name, funcs) in group(runtime, decl, statics, &mut excluded) {
        func_sets.push(build_set(runtime, &name, funcs, hierarchy, &mut unique, &mut native_unique));
    }

    let vars = decl
        .vars
        .iter()
        .filter(|var| constant_type(&var.ty))
        .cloned()
        .collect();

    if excluded > 0 {
        debug!(
            event = "variants_excluded",
            class = %decl.name,
            excluded,
            "unsupported variants dropped"
        );
    }

    Ok(Class {
        name: decl.name.clone(),
        find_name: decl.find_name.clone().unwrap_or_else(|| decl.name.clone()),
        module: decl.module.clone(),
        pkg_name,
        native_name,
        type_name,
        throwable: decl.throwable,
        interface: decl.interface,
        generated: decl.generated,
        supers: decl.supers.clone(),
        funcs: func_sets,
        methods: method_sets,
        vars,
        excluded,
    })
}

/// Validate descriptors and fold the Objective-C error convention into
/// `throws`
fn normalize(runtime: Runtime, decl: &ClassDecl, mut func: Func) -> Result<Func> {
    match runtime {
        Runtime::Java => {
            if !func.sig.is_empty() {
                let parsed = descriptor::parse_method(&func.sig).map_err(|e| {
                    BindError::InvalidDescriptor {
                        class: decl.name.clone(),
                        method: func.name.clone(),
                        desc: func.sig.clone(),
                        reason: e.to_string(),
                    }
                })?;
                if parsed.params.len() != func.params.len() {
                    return Err(BindError::InvalidDescriptor {
                        class: decl.name.clone(),
                        method: func.name.clone(),
                        desc: func.sig.clone(),
                        reason: format!(
                            "descriptor has {} parameters, declaration has {}",
                            parsed.params.len(),
                            func.params.len()
                        ),
                    });
                }
            }
        }
        Runtime::Objc => {
            if func.params.last().is_some_and(marshal::is_error_param) {
                func.error_param = func.params.pop();
                func.throws = true;
                if func.ret == Some(Type::Bool) {
                    func.foreign_ret = func.ret.take();
                }
            }
        }
    }
    Ok(func)
}

/// Group supported variants by set name in first-appearance order
fn group(runtime: Runtime, decl: &ClassDecl, funcs: Vec<Func>, excluded: &mut usize) -> Vec<(String, Vec<Func>)> {
    let mut order: Vec<(String, Vec<Func>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for func in funcs {
        if !marshal::supports(runtime, &func) {
            debug!(
                event = "variant_unsupported",
                class = %decl.name,
                method = %func.name,
                sig = %func.sig,
                "skipping unsupported variant"
            );
            *excluded += 1;
            continue;
        }
        let key = if func.constructor { "new".to_string() } else { func.name.clone() };
        match index.get(&key) {
            Some(&i) => order[i].1.push(func),
            None => {
                index.insert(key.clone(), order.len());
                order.push((key, vec![func]));
            }
        }
    }
    order
}

fn build_set(
    runtime: Runtime,
    name: &str,
    mut funcs: Vec<Func>,
    hierarchy: &Hierarchy,
    unique: &mut UniqueNames,
    native_unique: &mut UniqueNames,
) -> FuncSet {
    let managed = unique.claim(&names::managed_name(name));
    let overloaded = funcs.len() > 1;
    for func in &mut funcs {
        func.managed_name = managed.clone();
        func.native_name = native_unique.claim(&native_name(runtime, func, overloaded));
    }
    let mut set = FuncSet::new(name, funcs, hierarchy);
    set.managed_name = managed;
    set
}

fn native_name(runtime: Runtime, func: &Func, overloaded: bool) -> String {
    match runtime {
        Runtime::Java => {
            let base = if func.constructor {
                "_new".to_string()
            } else {
                names::jni_mangle(&func.name)
            };
            if !overloaded {
                return base;
            }
            let args = if func.sig.is_empty() {
                let params: Vec<Type> = func.params.iter().map(|p| p.ty.clone()).collect();
                descriptor::method_descriptor(&params, func.ret.as_ref()).unwrap_or_default()
            } else {
                func.sig.clone()
            };
            format!("{base}__{}", names::jni_mangle(descriptor::args_part(&args)))
        }
        Runtime::Objc => names::flatten(&func.name).replace(':', "_"),
    }
}

fn resolve_implementation(
    mut imp: Implementation,
    classes: &[Class],
    options: &ModelOptions,
) -> Result<Implementation> {
    if classes.iter().any(|c| c.name == imp.class) {
        return Ok(imp);
    }
    if !options.java_pkg.is_empty() {
        let qualified = format!("{}.{}", options.java_pkg, imp.class);
        if classes.iter().any(|c| c.name == qualified) {
            imp.class = qualified;
            return Ok(imp);
        }
    }
    Err(BindError::UnknownClass {
        implementation: imp.rust_type,
        class: imp.class,
    })
}

/// Constants are emitted only for scalar and string types
fn constant_type(ty: &Type) -> bool {
    !matches!(
        ty,
        Type::Bytes | Type::Object(_) | Type::Protocol(_) | Type::Array(_) | Type::Indirect(_) | Type::Unknown(_)
    )
}
