//! seqbind - binding generator for managed code calling into foreign runtimes
//!
//! Reads a description of foreign classes (a JVM or the Objective-C runtime)
//! and emits the two halves of a binding: native shims that make the foreign
//! calls, and Rust proxies, interfaces and stubs that call those shims
//! through `seqbind_runtime`.
//!
//! - `model`: classes, overload sets and name derivation
//! - `marshal`: which types cross the boundary and how
//! - `emit`: indentation-free code fragments
//! - `codegen`: the Java and Objective-C generators
//! - `config`, `logging`, `errors`: ambient plumbing for the CLI

pub mod codegen;
pub mod config;
pub mod emit;
pub mod errors;
pub mod logging;
pub mod marshal;
pub mod model;

pub use codegen::{generate, Generator, JavaGenerator, ObjcGenerator, Options, Output};
pub use config::Config;
pub use errors::{BindError, Result};
pub use logging::{init_dev_logging, init_logging, init_prod_logging, LogConfig, LogFormat, LogOutput};
pub use model::{Model, ModelOptions, Runtime};

use std::fs;
use std::path::Path;
use tracing::info;

/// Read and resolve a JSON model file
pub fn load_model(path: &Path, options: &ModelOptions) -> Result<Model> {
    let text = fs::read_to_string(path).map_err(|source| BindError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let model = Model::from_json(&text, options)?;
    info!(
        event = "model_loaded",
        path = %path.display(),
        runtime = %model.runtime,
        classes = model.classes.len(),
        implementations = model.implementations.len()
    );
    Ok(model)
}
