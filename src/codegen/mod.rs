//! Binding generator
//!
//! Design: each foreign runtime has a generator producing its native shims
//! (`java.rs`, `objc.rs`); the managed half (interface traits, proxies,
//! super forwarders, stubs, package modules) is shared and only asks the
//! runtime how a shim is shaped. Every class is visited twice: once for
//! declarations, once for bodies. Output is a map from relative path to
//! rendered text; nothing touches the filesystem until [`Output::write_to`].
//!
//! - `shape.rs`: shim symbols and signatures on both sides of the ABI
//! - `overload.rs`: managed method bodies with overload dispatch
//! - `managed.rs`: Rust interfaces, proxies and package modules
//! - `stubs.rs`: stub registration for managed implementations
//! - `java.rs`: JNI shims in C
//! - `objc.rs`: Objective-C shims

mod java;
mod managed;
mod objc;
mod overload;
mod shape;
mod stubs;

pub use java::JavaGenerator;
pub use objc::ObjcGenerator;

use crate::errors::{BindError, Result};
use crate::model::{Class, Model, Runtime};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, info_span};

/// First line of every generated file
pub const HEADER: &str = "// Code generated by seqbind. DO NOT EDIT.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Rust path the generated files are mounted under
    pub module_root: String,
    /// Super shims for every class instead of only implemented ones
    pub all_supers: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            module_root: "crate".to_string(),
            all_supers: false,
        }
    }
}

/// Generated files keyed by path relative to the output directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    files: BTreeMap<String, String>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, text: String) {
        self.files.insert(path.into(), text);
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every file below `dir`, creating directories as needed
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        for (path, text) in &self.files {
            let target = dir.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|source| BindError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&target, text).map_err(|source| BindError::Write {
                path: target.clone(),
                source,
            })?;
            debug!(event = "file_written", path = %target.display(), bytes = text.len());
        }
        Ok(())
    }
}

/// Produces every output file for one foreign runtime
pub trait Generator {
    fn runtime(&self) -> Runtime;
    fn generate(&self) -> Output;
}

/// Run the generator matching the model's runtime
pub fn generate(model: &Model, options: &Options) -> Output {
    let span = info_span!("generate", runtime = %model.runtime);
    let _enter = span.enter();

    let output = match model.runtime {
        Runtime::Java => JavaGenerator::new(model, options).generate(),
        Runtime::Objc => ObjcGenerator::new(model, options).generate(),
    };
    info!(
        event = "generated",
        runtime = %model.runtime,
        classes = model.classes.len(),
        files = output.len(),
        "bindings generated"
    );
    output
}

/// Whether `class` gets super shims and forwarders
pub(crate) fn has_super(model: &Model, options: &Options, class: &Class) -> bool {
    options.all_supers || model.is_implemented(class)
}

#[cfg(test)]
mod tests;
