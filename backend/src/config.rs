use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/recognizer.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub predictor: PredictorConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub frontend_dir: PathBuf,
}

/// How the external classifier is launched. The image argument is appended
/// after the script path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub interpreter: String,
    pub file_script: PathBuf,
    pub inline_script: PathBuf,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: PathBuf,
    /// Age after which stored uploads are swept. 0 keeps them forever.
    pub retention_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8081,
            frontend_dir: PathBuf::from("frontend/dist"),
        }
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            interpreter: "python".to_string(),
            file_script: PathBuf::from("src/server/predict.py"),
            inline_script: PathBuf::from("src/server/predict_optimized.py"),
            timeout_secs: 60,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("public/uploads"),
            retention_secs: 24 * 60 * 60,
            sweep_interval_secs: 60 * 60,
        }
    }
}

impl PredictorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl UploadConfig {
    pub fn retention(&self) -> Option<Duration> {
        (self.retention_secs > 0).then(|| Duration::from_secs(self.retention_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl AppConfig {
    /// Reads the YAML file named by `RECOGNIZER_CONFIG` (or the default path
    /// when present), then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match env::var("RECOGNIZER_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            Err(_) => {
                log::info!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(config_str: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(config_str)?;
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = lookup("PORT") {
            self.server.port = parse_value("PORT", &value)?;
        }
        if let Some(value) = lookup("FRONTEND_DIR") {
            self.server.frontend_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("UPLOAD_DIR") {
            self.uploads.dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("UPLOAD_RETENTION_SECS") {
            self.uploads.retention_secs = parse_value("UPLOAD_RETENTION_SECS", &value)?;
        }
        if let Some(value) = lookup("PREDICTOR_INTERPRETER") {
            self.predictor.interpreter = value;
        }
        if let Some(value) = lookup("PREDICTOR_FILE_SCRIPT") {
            self.predictor.file_script = PathBuf::from(value);
        }
        if let Some(value) = lookup("PREDICTOR_INLINE_SCRIPT") {
            self.predictor.inline_script = PathBuf::from(value);
        }
        if let Some(value) = lookup("PREDICTOR_TIMEOUT_SECS") {
            self.predictor.timeout_secs = parse_value("PREDICTOR_TIMEOUT_SECS", &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.predictor.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "predictor.timeout_secs",
                value: "0".to_string(),
            });
        }
        if self.predictor.interpreter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "predictor.interpreter",
                value: self.predictor.interpreter.clone(),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_original_layout() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8081");
        assert_eq!(config.uploads.dir, PathBuf::from("public/uploads"));
        assert_eq!(config.predictor.interpreter, "python");
        assert_eq!(config.predictor.timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_remaining_defaults() {
        let config = AppConfig::from_yaml(
            "predictor:\n  interpreter: python3\n  timeout_secs: 5\nuploads:\n  retention_secs: 0\n",
        )
        .unwrap();
        assert_eq!(config.predictor.interpreter, "python3");
        assert_eq!(config.predictor.timeout_secs, 5);
        assert_eq!(config.predictor.file_script, PathBuf::from("src/server/predict.py"));
        assert_eq!(config.uploads.retention(), None);
        assert_eq!(config.server.port, 8081);
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "9000"),
            ("UPLOAD_DIR", "/tmp/uploads"),
            ("PREDICTOR_TIMEOUT_SECS", "12"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.uploads.dir, PathBuf::from("/tmp/uploads"));
        assert_eq!(config.predictor.timeout_secs, 12);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|key| (key == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let mut config = AppConfig::default();
        config.predictor.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
