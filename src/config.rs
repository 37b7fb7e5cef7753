//! Service configuration.
//!
//! Resolution order: built-in defaults, then an optional JSON file
//! (`HEARTWISE_CONFIG`, else `<data_dir>/heartwise.json`), then
//! `HEARTWISE_*` environment variables.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Heartwise";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const CONFIG_FILE_NAME: &str = "heartwise.json";
const ENV_PREFIX: &str = "HEARTWISE_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {var}: {value}")]
    InvalidEnv { var: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Get the default application data directory: `~/Heartwise/`.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default `EnvFilter` directive when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "heartwise=info,tower_http=info"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    /// Defaults to `<data_dir>/heartwise.db`.
    pub database_path: Option<PathBuf>,
    /// Transient OCR uploads. Defaults to `<data_dir>/uploads`.
    pub upload_dir: Option<PathBuf>,
    /// Defaults to `<data_dir>/static/profile_pics`.
    pub profile_pic_dir: Option<PathBuf>,
    /// Risk model artifact. Defaults to `<data_dir>/heart_model.json`.
    pub model_path: Option<PathBuf>,
    /// Tesseract language data, only used with the `ocr` feature.
    pub tessdata_dir: Option<PathBuf>,
    pub session_days: i64,
    pub pbkdf2_iterations: u32,
    pub rate_limit_per_minute: u32,
    pub rate_limit_per_hour: u32,
    pub max_upload_bytes: usize,
}

/// Upper bound on `session_days`; keeps session expiry and cookie Max-Age in range.
pub const MAX_SESSION_DAYS: i64 = 3650;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: app_data_dir(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            database_path: None,
            upload_dir: None,
            profile_pic_dir: None,
            model_path: None,
            tessdata_dir: None,
            session_days: 30,
            pbkdf2_iterations: crate::crypto::PBKDF2_ITERATIONS,
            rate_limit_per_minute: 100,
            rate_limit_per_hour: 1000,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Load from file + process environment and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let env: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .collect();
        Self::load_with(&env)
    }

    /// Load using the provided environment map (useful for testing).
    pub fn load_with(env: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let explicit_file = env.get("HEARTWISE_CONFIG").map(PathBuf::from);
        let data_dir = env
            .get("HEARTWISE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(app_data_dir);

        let file = explicit_file
            .clone()
            .unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME));

        let mut config = if file.exists() {
            Self::from_file(&file)?
        } else if let Some(path) = explicit_file {
            return Err(ConfigError::Io {
                path,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
            });
        } else {
            Self {
                data_dir,
                ..Self::default()
            }
        };

        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<(), ConfigError> {
        if let Some(v) = env.get("HEARTWISE_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = env.get("HEARTWISE_BIND_ADDR") {
            self.bind_addr = parse_env("HEARTWISE_BIND_ADDR", v)?;
        }
        if let Some(v) = env.get("HEARTWISE_DATABASE_PATH") {
            self.database_path = Some(PathBuf::from(v));
        }
        if let Some(v) = env.get("HEARTWISE_UPLOAD_DIR") {
            self.upload_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = env.get("HEARTWISE_PROFILE_PIC_DIR") {
            self.profile_pic_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = env.get("HEARTWISE_MODEL_PATH") {
            self.model_path = Some(PathBuf::from(v));
        }
        if let Some(v) = env.get("HEARTWISE_TESSDATA_DIR") {
            self.tessdata_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = env.get("HEARTWISE_SESSION_DAYS") {
            self.session_days = parse_env("HEARTWISE_SESSION_DAYS", v)?;
        }
        if let Some(v) = env.get("HEARTWISE_PBKDF2_ITERATIONS") {
            self.pbkdf2_iterations = parse_env("HEARTWISE_PBKDF2_ITERATIONS", v)?;
        }
        if let Some(v) = env.get("HEARTWISE_RATE_PER_MINUTE") {
            self.rate_limit_per_minute = parse_env("HEARTWISE_RATE_PER_MINUTE", v)?;
        }
        if let Some(v) = env.get("HEARTWISE_RATE_PER_HOUR") {
            self.rate_limit_per_hour = parse_env("HEARTWISE_RATE_PER_HOUR", v)?;
        }
        if let Some(v) = env.get("HEARTWISE_MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse_env("HEARTWISE_MAX_UPLOAD_BYTES", v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SESSION_DAYS).contains(&self.session_days) {
            return Err(ConfigError::Invalid(format!(
                "session_days must be between 1 and {MAX_SESSION_DAYS}"
            )));
        }
        if self.pbkdf2_iterations == 0 {
            return Err(ConfigError::Invalid("pbkdf2_iterations must be positive".into()));
        }
        if self.rate_limit_per_minute == 0 || self.rate_limit_per_hour == 0 {
            return Err(ConfigError::Invalid("rate limits must be positive".into()));
        }
        if self.rate_limit_per_minute > self.rate_limit_per_hour {
            return Err(ConfigError::Invalid(
                "rate_limit_per_minute cannot exceed rate_limit_per_hour".into(),
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("max_upload_bytes must be positive".into()));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("heartwise.db"))
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("uploads"))
    }

    pub fn profile_pic_dir(&self) -> PathBuf {
        self.profile_pic_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("static").join("profile_pics"))
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("heart_model.json"))
    }

    /// Create every directory the service writes into.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.upload_dir())?;
        std::fs::create_dir_all(self.profile_pic_dir())?;
        if let Some(parent) = self.database_path().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Config rooted in `dir` with cheap password hashing, for tests.
    #[cfg(test)]
    pub(crate) fn for_tests(dir: &Path) -> Self {
        Self {
            data_dir: dir.to_path_buf(),
            pbkdf2_iterations: 1_000,
            ..Self::default()
        }
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    })
}
