//! Runtime configuration from `TENSIO_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::adapters::sanitize::DEFAULT_SANITIZE_MAX_BYTES;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Where the three artifacts live and how strictly to check them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
    pub model_file: String,
    pub scaler_file: String,
    pub encoders_file: String,
    /// Refuse to start when `manifest.json` is absent.
    pub require_manifest: bool,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("artifacts"),
            model_file: "hypertension_rf_model.json".to_string(),
            scaler_file: "hypertension_scaler.json".to_string(),
            encoders_file: "hypertension_label_encoders.json".to_string(),
            require_manifest: false,
        }
    }
}

impl ArtifactConfig {
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    #[must_use]
    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(&self.scaler_file)
    }

    #[must_use]
    pub fn encoders_path(&self) -> PathBuf {
        self.dir.join(&self.encoders_file)
    }

    #[must_use]
    pub fn file_names(&self) -> [&str; 3] {
        [
            self.model_file.as_str(),
            self.scaler_file.as_str(),
            self.encoders_file.as_str(),
        ]
    }
}

/// Log destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// File when the form runs on a terminal, stdout otherwise.
    Auto,
    File,
    Stdout,
}

impl FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "file" => Ok(Self::File),
            "stdout" => Ok(Self::Stdout),
            other => Err(format!("expected auto, file or stdout, got {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub artifacts: ArtifactConfig,
    pub bind_addr: SocketAddr,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    /// Per-line cap for the log sanitizer.
    pub sanitize_max_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifacts: ArtifactConfig::default(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from("tensio.log"),
            sanitize_max_bytes: DEFAULT_SANITIZE_MAX_BYTES,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES")
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset variables.
    ///
    /// # Errors
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("TENSIO_ARTIFACT_DIR") {
            config.artifacts.dir = PathBuf::from(dir);
        }
        if let Some(name) = lookup("TENSIO_MODEL_FILE") {
            config.artifacts.model_file = name;
        }
        if let Some(name) = lookup("TENSIO_SCALER_FILE") {
            config.artifacts.scaler_file = name;
        }
        if let Some(name) = lookup("TENSIO_ENCODERS_FILE") {
            config.artifacts.encoders_file = name;
        }
        if let Some(v) = lookup("TENSIO_REQUIRE_MANIFEST") {
            config.artifacts.require_manifest = parse_bool(&v);
        }

        if let Some(v) = lookup("TENSIO_BIND_ADDR") {
            config.bind_addr = v.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    var: "TENSIO_BIND_ADDR",
                    value: v.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(v) = lookup("TENSIO_LOG_MODE") {
            config.log_mode = v
                .trim()
                .parse()
                .map_err(|reason| ConfigError::InvalidValue {
                    var: "TENSIO_LOG_MODE",
                    value: v.clone(),
                    reason,
                })?;
        }
        if let Some(path) = lookup("TENSIO_LOG_FILE") {
            config.log_file = PathBuf::from(path);
        }
        if let Some(v) = lookup("TENSIO_SANITIZE_MAX_BYTES") {
            config.sanitize_max_bytes = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    var: "TENSIO_SANITIZE_MAX_BYTES",
                    value: v.clone(),
                    reason: "expected a positive byte count".to_string(),
                })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).expect("defaults");
        assert_eq!(config, Config::default());
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(
            config.artifacts.model_path(),
            PathBuf::from("artifacts/hypertension_rf_model.json")
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("TENSIO_ARTIFACT_DIR", "/srv/models"),
            ("TENSIO_SCALER_FILE", "scaler.json"),
            ("TENSIO_REQUIRE_MANIFEST", "yes"),
            ("TENSIO_BIND_ADDR", "0.0.0.0:8080"),
            ("TENSIO_LOG_MODE", "stdout"),
            ("TENSIO_SANITIZE_MAX_BYTES", "4096"),
        ]))
        .expect("valid");

        assert_eq!(config.artifacts.scaler_path(), PathBuf::from("/srv/models/scaler.json"));
        assert!(config.artifacts.require_manifest);
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.log_mode, LogMode::Stdout);
        assert_eq!(config.sanitize_max_bytes, 4096);
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup(&[("TENSIO_BIND_ADDR", "localhost")])).is_err());
        let err = Config::from_lookup(lookup(&[("TENSIO_LOG_MODE", "syslog")]))
            .expect_err("unknown mode");
        assert!(err.to_string().contains("TENSIO_LOG_MODE"));

        for bad in ["0", "-1", "lots"] {
            assert!(
                Config::from_lookup(lookup(&[("TENSIO_SANITIZE_MAX_BYTES", bad)])).is_err(),
                "{bad}"
            );
        }
    }
}
