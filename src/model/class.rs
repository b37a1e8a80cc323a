//! Classes, constants and managed implementations

use super::func::{Func, FuncSet};
use super::types::{Runtime, Type};
use serde::{Deserialize, Serialize};

/// Class as produced by an extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    /// Dotted Java name or Objective-C class/protocol name
    pub name: String,
    /// Name for runtime class lookup, e.g. `a.b.Outer$Inner`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub find_name: Option<String>,
    /// Objective-C module, e.g. `Foundation`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default)]
    pub throwable: bool,
    /// Java interface or Objective-C protocol
    #[serde(default)]
    pub interface: bool,
    /// Objective-C type defined by managed code
    #[serde(default)]
    pub generated: bool,
    #[serde(default)]
    pub supers: Vec<String>,
    /// Constructors and static functions
    #[serde(default)]
    pub funcs: Vec<Func>,
    /// Instance methods, including inherited ones
    #[serde(default)]
    pub methods: Vec<Func>,
    #[serde(default)]
    pub vars: Vec<Var>,
}

impl ClassDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            find_name: None,
            module: None,
            throwable: false,
            interface: false,
            generated: false,
            supers: Vec::new(),
            funcs: Vec::new(),
            methods: Vec::new(),
            vars: Vec::new(),
        }
    }
}

/// Class constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Var {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    pub value: serde_json::Value,
}

/// Managed type extending a foreign class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Rust path of the implementing type
    pub rust_type: String,
    /// Foreign class or interface it implements
    pub class: String,
    /// Foreign-visible name of the managed type; stubs are registered under
    /// it. Defaults to the last path segment of `rust_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Implementation {
    pub fn exported_name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.rust_type.rsplit("::").next().unwrap_or(&self.rust_type),
        }
    }
}

/// Generator input document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub runtime: Runtime,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
    #[serde(default)]
    pub implementations: Vec<Implementation>,
}

/// Class with its overload sets resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: String,
    pub find_name: String,
    pub module: Option<String>,
    /// Unqualified name used inside its package
    pub pkg_name: String,
    /// Identifier used in native shim symbols
    pub native_name: String,
    /// Name of the managed interface trait
    pub type_name: String,
    pub throwable: bool,
    pub interface: bool,
    pub generated: bool,
    pub supers: Vec<String>,
    pub funcs: Vec<FuncSet>,
    pub methods: Vec<FuncSet>,
    pub vars: Vec<Var>,
    /// Variants dropped for unsupported types
    pub excluded: usize,
}

impl Class {
    /// Slash-separated package holding this class's functions and constants
    pub fn package_path(&self, runtime: Runtime) -> String {
        match runtime {
            Runtime::Java => self.name.replace('.', "/"),
            Runtime::Objc => match &self.module {
                Some(module) => format!("{module}/{}", self.pkg_name),
                None => self.pkg_name.clone(),
            },
        }
    }

    /// Package holding the type alias for this class
    pub fn type_package(&self, runtime: Runtime) -> String {
        let path = self.package_path(runtime);
        match path.rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => String::new(),
        }
    }

    pub fn proxy_name(&self) -> String {
        format!("{}Proxy", self.type_name)
    }

    pub fn super_name(&self) -> String {
        format!("{}Super", self.type_name)
    }

    /// Module inside the proxies file holding static functions and `cast`
    pub fn statics_module(&self) -> String {
        self.native_name.to_lowercase()
    }

    pub fn all_sets(&self) -> impl Iterator<Item = &FuncSet> {
        self.funcs.iter().chain(&self.methods)
    }

    pub fn method(&self, name: &str) -> Option<&FuncSet> {
        self.methods.iter().find(|set| set.name == name)
    }
}
