mod defaults;
mod types;
mod validation;

pub use defaults::*;
pub use types::*;
pub use validation::*;

use crate::infra::secrets::{redact_secret, SECRET_MANAGER_URL_ENV};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub bigquery: BigQueryConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    /// File the configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    ///
    /// Runs before the log subscriber is installed, so it does not log.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(find_config_file);

        let mut config = match config_path {
            Some(p) if p.exists() => {
                let mut config = load_config_file(&p)?;
                config.source = Some(p);
                config
            }
            Some(p) if path.is_some() => {
                anyhow::bail!("Config file '{}' does not exist", p.display())
            }
            _ => Config::default(),
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Copy safe to print: secret values are replaced by a short preview.
    pub fn redacted(&self) -> Config {
        let mut config = self.clone();
        if let Some(key) = &config.models.gemini.api_key {
            config.models.gemini.api_key = Some(redact_secret(key));
        }
        config
    }

    /// Write default configuration to a file.
    pub fn write_default(path: &str) -> Result<()> {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("PORYGON_CREDENTIALS_FILE") {
            if !path.is_empty() {
                self.credentials.key_file = path;
            }
        }

        if let Ok(project) = std::env::var("PORYGON_SECRETS_PROJECT") {
            if !project.is_empty() {
                self.secrets.project = project;
            }
        }

        if let Ok(url) = std::env::var(SECRET_MANAGER_URL_ENV) {
            if !url.is_empty() {
                self.secrets.base_url = url;
            }
        }

        if let Ok(model) = std::env::var("PORYGON_MODEL") {
            if !model.is_empty() {
                self.agent.model = model;
            }
        }

        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            if !key.is_empty() {
                self.models.gemini.api_key = Some(key);
            }
        }
    }
}

/// Find the configuration file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("porygon.json"),
        PathBuf::from("porygon.yaml"),
        PathBuf::from("porygon.yml"),
        PathBuf::from("porygon.toml"),
    ];

    for path in &candidates {
        if path.exists() {
            return Some(path.clone());
        }
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".porygon").join("config.json");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

/// Load configuration from a file path.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => json5::from_str(&content).or_else(|_| {
            serde_json::from_str(&content).map_err(|e| json5::Error::Message {
                msg: e.to_string(),
                location: None,
            })
        })?,
    };

    Ok(config)
}
