//! Generator errors

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BindError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("class {0} is declared more than once")]
    DuplicateClass(String),

    #[error("{implementation} implements unknown class {class}")]
    UnknownClass {
        implementation: String,
        class: String,
    },

    #[error("invalid descriptor {desc:?} for {class}.{method}: {reason}")]
    InvalidDescriptor {
        class: String,
        method: String,
        desc: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, BindError>;
