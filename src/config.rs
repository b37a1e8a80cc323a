//! `seqbind.toml` configuration

use crate::codegen::Options;
use crate::errors::{BindError, Result};
use crate::logging::{LogConfig, LogFormat, LogOutput};
use crate::model::ModelOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

pub const CONFIG_FILE: &str = "seqbind.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Package prefix tried when an implementation names a class that is
    /// not in the model verbatim
    #[serde(default)]
    pub java_pkg: String,

    /// Rust path under which the generated files are mounted as modules
    #[serde(default = "default_module_root")]
    pub module_root: String,

    /// Emit `csuper` shims and super forwarders for every class, not only
    /// the ones implemented by managed types
    #[serde(default = "default_false")]
    pub all_supers: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_out_dir")]
    pub dir: PathBuf,

    /// Remove stale files from a previous run before writing
    #[serde(default = "default_false")]
    pub clean: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormatName,

    /// Directory for rolling log files; stderr when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_false")]
    pub span_events: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatName {
    Pretty,
    #[default]
    Compact,
    Json,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            java_pkg: String::new(),
            module_root: default_module_root(),
            all_supers: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_out_dir(),
            clean: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormatName::default(),
            directory: None,
            span_events: false,
        }
    }
}

fn default_false() -> bool { false }
fn default_module_root() -> String { "crate".to_string() }
fn default_out_dir() -> PathBuf { PathBuf::from("gen") }
fn default_level() -> String { "info".to_string() }

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| BindError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Nearest `seqbind.toml` in `start` or one of its parents
    pub fn discover_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|candidate| candidate.is_file())
    }

    /// Load the nearest config above the working directory, or the defaults
    pub fn discover() -> Result<Self> {
        let found = std::env::current_dir()
            .ok()
            .and_then(|dir| Self::discover_from(&dir));
        match found {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn generate_default() -> Result<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| BindError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl GeneratorConfig {
    pub fn model_options(&self) -> ModelOptions {
        ModelOptions {
            java_pkg: self.java_pkg.clone(),
        }
    }

    pub fn codegen_options(&self) -> Options {
        Options {
            module_root: self.module_root.clone(),
            all_supers: self.all_supers,
        }
    }
}

impl LoggingConfig {
    /// Translate into a [`LogConfig`]; unknown level names fall back to info
    pub fn to_log_config(&self) -> LogConfig {
        let level = self.level.parse::<Level>().unwrap_or(Level::INFO);
        let format = match self.format {
            LogFormatName::Pretty => LogFormat::Pretty,
            LogFormatName::Compact => LogFormat::Compact,
            LogFormatName::Json => LogFormat::Json,
        };
        let output = match &self.directory {
            Some(dir) => LogOutput::File {
                directory: dir.to_string_lossy().to_string(),
                prefix: "seqbind".to_string(),
            },
            None => LogOutput::Stderr,
        };
        LogConfig::new()
            .with_level(level)
            .with_format(format)
            .with_output(output)
            .with_span_events(self.span_events)
    }
}
