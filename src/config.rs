use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

// Applied when the settings file leaves HOST/PORT unset.
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub path: PathBuf,
}

impl AppConfig {
    /// Reads the settings file once at startup. The service has no other
    /// configuration source, so a missing or unreadable file is fatal.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let entries = dotenvy::from_path_iter(path).map_err(|source| ConfigError::Settings {
            path: path.display().to_string(),
            source,
        })?;

        let mut vars = HashMap::new();
        for entry in entries {
            let (key, value) = entry.map_err(|source| ConfigError::Settings {
                path: path.display().to_string(),
                source,
            })?;
            vars.insert(key, value);
        }

        Self::from_vars(&vars)
    }

    fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let host = vars
            .get("HOST")
            .cloned()
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        // A present but malformed PORT is an error, not a silent default.
        let port = match vars.get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        let model_path = vars
            .get("MODEL_PATH")
            .ok_or(ConfigError::MissingKey("MODEL_PATH"))?;

        Ok(Self {
            server: ServerConfig { host, port },
            model: ModelConfig {
                path: PathBuf::from(model_path),
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
