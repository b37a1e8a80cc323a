//! Methods and overload sets

use super::types::{Slot, Type};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    /// Verbatim Objective-C declaration, e.g. `NSError * _Nullable *`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decl: Option<String>,
}

impl Param {
    pub fn new(name: &str, ty: Type) -> Self {
        Self {
            name: name.to_string(),
            ty,
            decl: None,
        }
    }
}

/// One concrete foreign method, constructor or static function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Func {
    /// Foreign name (Java method name, first selector part for Objective-C)
    pub name: String,
    /// JNI descriptor or Objective-C selector
    #[serde(default)]
    pub sig: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ret: Option<Type>,
    #[serde(default)]
    pub throws: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub constructor: bool,
    #[serde(default = "default_true")]
    pub public: bool,

    /// Name of the managed method or function
    #[serde(skip)]
    pub managed_name: String,
    /// Unique name used in native shim symbols
    #[serde(skip)]
    pub native_name: String,
    /// Return type as declared by the foreign runtime, before a BOOL paired
    /// with an error out-parameter is dropped
    #[serde(skip)]
    pub foreign_ret: Option<Type>,
    /// Trailing `NSError **` out-parameter removed from `params`
    #[serde(skip)]
    pub error_param: Option<Param>,
}

fn default_true() -> bool {
    true
}

impl Func {
    pub fn new(name: &str, params: Vec<Param>, ret: Option<Type>) -> Self {
        Self {
            name: name.to_string(),
            sig: String::new(),
            params,
            ret,
            throws: false,
            is_static: false,
            constructor: false,
            public: true,
            managed_name: String::new(),
            native_name: String::new(),
            foreign_ret: None,
            error_param: None,
        }
    }

    pub fn with_sig(mut self, sig: &str) -> Self {
        self.sig = sig.to_string();
        self
    }

    pub fn throwing(mut self) -> Self {
        self.throws = true;
        self
    }

    pub fn into_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn into_constructor(mut self) -> Self {
        self.constructor = true;
        self.is_static = true;
        self
    }

    /// Instance methods take the receiver as an extra argument
    pub fn has_receiver(&self) -> bool {
        !self.is_static && !self.constructor
    }

    /// Return type the foreign call produces, including a dropped BOOL
    pub fn declared_ret(&self) -> Option<&Type> {
        self.foreign_ret.as_ref().or(self.ret.as_ref())
    }
}

/// Superclass graph used to unify object slots
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    supers: HashMap<String, Vec<String>>,
    root: Option<String>,
}

impl Hierarchy {
    pub fn new(root: Option<&str>) -> Self {
        Self {
            supers: HashMap::new(),
            root: root.map(str::to_string),
        }
    }

    pub fn insert(&mut self, class: &str, supers: &[String]) {
        self.supers.insert(class.to_string(), supers.to_vec());
    }

    pub fn contains(&self, class: &str) -> bool {
        self.supers.contains_key(class) || self.root.as_deref() == Some(class)
    }

    /// `class` and its ancestors, breadth first
    pub fn ancestors(&self, class: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([class.to_string()]);
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next.clone()) {
                continue;
            }
            if let Some(supers) = self.supers.get(&next) {
                queue.extend(supers.iter().cloned());
            }
            order.push(next);
        }
        order
    }

    /// Nearest common superclass of two known classes
    pub fn common_super(&self, a: &str, b: &str) -> Option<String> {
        if a == b {
            return Some(a.to_string());
        }
        if !self.contains(a) || !self.contains(b) {
            return None;
        }
        let of_b: HashSet<String> = self.ancestors(b).into_iter().collect();
        self.ancestors(a)
            .into_iter()
            .find(|class| of_b.contains(class))
            .or_else(|| self.root.clone())
    }

    /// Unify two slots
    pub fn common_type(&self, a: &Slot, b: &Slot) -> Slot {
        match (a, b) {
            (Slot::Any, _) | (_, Slot::Any) => Slot::Any,
            (Slot::Typed(x), Slot::Typed(y)) if x == y => a.clone(),
            (Slot::Typed(Type::Object(x)), Slot::Typed(Type::Object(y))) => self
                .common_super(x, y)
                .map_or(Slot::Any, |class| Slot::Typed(Type::Object(class))),
            _ => Slot::Any,
        }
    }
}

/// Overloads of one method name with their unified signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncSet {
    pub name: String,
    pub managed_name: String,
    pub funcs: Vec<Func>,
    /// Unified parameter slots; with `variadic` the last slot is the element
    /// type of the variadic tail
    pub params: Vec<Slot>,
    pub variadic: bool,
    pub ret: Option<Slot>,
    pub has_ret: bool,
    pub throws: bool,
    /// Minimum parameter count over the variants
    pub minp: usize,
}

impl FuncSet {
    /// # Panics
    /// If `funcs` is empty.
    pub fn new(name: &str, funcs: Vec<Func>, hierarchy: &Hierarchy) -> Self {
        assert!(!funcs.is_empty(), "overload set {name} has no variants");

        let minp = funcs.iter().map(|f| f.params.len()).min().unwrap_or(0);
        let variadic = funcs.iter().any(|f| f.params.len() != minp);

        let mut slots: Vec<Option<Slot>> = vec![None; minp + usize::from(variadic)];
        for func in &funcs {
            for (i, param) in func.params.iter().enumerate() {
                let index = i.min(minp);
                let slot = Slot::Typed(param.ty.clone());
                slots[index] = Some(match &slots[index] {
                    Some(existing) => hierarchy.common_type(existing, &slot),
                    None => slot,
                });
            }
        }
        let params = slots.into_iter().map(|s| s.unwrap_or(Slot::Any)).collect();

        let has_ret = funcs.iter().any(|f| f.ret.is_some());
        let ret = has_ret.then(|| {
            funcs
                .iter()
                .map(|f| f.ret.clone().map_or(Slot::Any, Slot::Typed))
                .reduce(|a, b| hierarchy.common_type(&a, &b))
                .unwrap_or(Slot::Any)
        });

        Self {
            name: name.to_string(),
            managed_name: String::new(),
            throws: funcs.iter().any(|f| f.throws),
            funcs,
            params,
            variadic,
            ret,
            has_ret,
            minp,
        }
    }

    pub fn is_overloaded(&self) -> bool {
        self.funcs.len() > 1
    }

    pub fn is_static(&self) -> bool {
        self.funcs.iter().all(|f| f.is_static)
    }

    /// Variants grouped by parameter count, ascending
    pub fn buckets(&self) -> Vec<(usize, Vec<&Func>)> {
        let mut buckets: Vec<(usize, Vec<&Func>)> = Vec::new();
        for func in &self.funcs {
            let arity = func.params.len();
            match buckets.iter_mut().find(|(n, _)| *n == arity) {
                Some((_, group)) => group.push(func),
                None => buckets.push((arity, vec![func])),
            }
        }
        buckets.sort_by_key(|(n, _)| *n);
        buckets
    }
}
