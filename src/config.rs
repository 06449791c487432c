use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

const DEFAULT_INTERVAL_SECONDS: u64 = 60;
const DEFAULT_LOG_FILE: &str = "file_courier.log";

/// Settings for one courier run. Locked while the courier is running and
/// only editable while it is idle or stopped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    pub pattern: String,
    pub source_dir: String,
    pub dest_dir: String,
    pub interval_seconds: u64,
    pub overwrite: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVar(&'static str),
    BadInterval(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVar(name) => {
                write!(f, "Environment did not contain required variable {name}")
            }
            Self::BadInterval(value) => {
                write!(f, "COURIER_INTERVAL_SECONDS value {value:?} is not a whole number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl RunConfig {
    /// Builds a config from `COURIER_*` environment variables. The pattern
    /// and both directories are required; the interval defaults to 60 seconds
    /// and overwriting defaults to off.
    pub fn from_env() -> Result<RunConfig, ConfigError> {
        let pattern = env::var("COURIER_PATTERN")
            .map_err(|_| ConfigError::MissingVar("COURIER_PATTERN"))?;
        let source_dir = env::var("COURIER_SOURCE_DIR")
            .map_err(|_| ConfigError::MissingVar("COURIER_SOURCE_DIR"))?;
        let dest_dir = env::var("COURIER_DEST_DIR")
            .map_err(|_| ConfigError::MissingVar("COURIER_DEST_DIR"))?;

        let interval_seconds = match env::var("COURIER_INTERVAL_SECONDS") {
            Ok(value) => value
                .parse::<u64>()
                .map_err(|_| ConfigError::BadInterval(value))?,
            Err(_) => DEFAULT_INTERVAL_SECONDS,
        };

        let overwrite = env::var("COURIER_OVERWRITE")
            .map(|value| value == "true" || value == "1")
            .unwrap_or(false);

        Ok(RunConfig {
            pattern,
            source_dir,
            dest_dir,
            interval_seconds,
            overwrite,
        })
    }
}

/// Path of the append-only move log, from `COURIER_LOG_FILE` if set.
pub fn log_file_from_env() -> PathBuf {
    env::var("COURIER_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_FILE))
}

/// An existing directory the process can write into. Any OS-level probe
/// failure counts as invalid rather than an error.
pub fn is_valid_dir(path: &str) -> bool {
    let dir = Path::new(path);
    if !dir.is_dir() {
        return false;
    }
    // There is no portable access(W_OK); probe by creating a file.
    let probe = dir.join(format!(".courier_probe_{}", std::process::id()));
    match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
    {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

/// Compiles a user pattern anchored at the start of the file name, so
/// `png` only matches names beginning with "png" while `.*\.png` matches
/// anywhere. No implicit anchor at the end.
pub fn compile_pattern(pattern: &str) -> Option<Regex> {
    Regex::new(&format!("^(?:{pattern})")).ok()
}

pub fn is_valid_pattern(pattern: &str) -> bool {
    compile_pattern(pattern).is_some()
}
