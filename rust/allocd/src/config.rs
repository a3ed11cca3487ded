use crate::allocation::{Validator, DEFAULT_SCALE, MAX_SCALE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const CONFIG_ENV: &str = "ALLOCD_CONFIG";
pub const SCALE_ENV: &str = "ALLOCD_SCALE";
pub const TOTAL_MARKS_ENV: &str = "ALLOCD_TOTAL_MARKS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Decimal places totals are rounded to before comparing.
    pub scale: u32,
    /// Paper total used when a request leaves `totalMarks` out. TOML integers,
    /// floats and numeric strings are all accepted.
    pub default_total_marks: Decimal,
    /// tracing-subscriber directive; `RUST_LOG` still wins when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            default_total_marks: Decimal::ONE_HUNDRED,
            log_filter: None,
        }
    }
}

impl Config {
    /// File named by `ALLOCD_CONFIG` (if any), then `ALLOCD_*` overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(|key| std::env::var(key).ok())
    }

    pub fn from_sources<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match env(CONFIG_ENV).filter(|p| !p.trim().is_empty()) {
            Some(p) => Self::from_file(Path::new(&p))?,
            None => Self::default(),
        };

        if let Some(v) = env(SCALE_ENV) {
            cfg.scale = v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "scale",
                message: format!("not an integer: {v:?}"),
            })?;
        }
        if let Some(v) = env(TOTAL_MARKS_ENV) {
            cfg.default_total_marks =
                Decimal::from_str(v.trim()).map_err(|_| ConfigError::Invalid {
                    key: "default_total_marks",
                    message: format!("not a number: {v:?}"),
                })?;
        }

        cfg.check()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.scale > MAX_SCALE {
            return Err(ConfigError::Invalid {
                key: "scale",
                message: format!("must be at most {MAX_SCALE}, got {}", self.scale),
            });
        }
        if self.default_total_marks <= Decimal::ZERO {
            return Err(ConfigError::Invalid {
                key: "default_total_marks",
                message: format!("must be positive, got {}", self.default_total_marks),
            });
        }
        Ok(())
    }

    pub fn validator(&self) -> Validator {
        Validator::with_scale(self.scale)
    }
}
