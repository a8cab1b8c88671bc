use super::Config;
use anyhow::Result;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    if config.agent.name.trim().is_empty() {
        errors.push(ConfigValidationError {
            path: "agent.name".to_string(),
            message: "Agent name is required".to_string(),
        });
    }

    if config.agent.model.trim().is_empty() {
        errors.push(ConfigValidationError {
            path: "agent.model".to_string(),
            message: "Agent model is required".to_string(),
        });
    }

    if config.credentials.secret_id.is_none() && config.credentials.key_file.trim().is_empty() {
        errors.push(ConfigValidationError {
            path: "credentials.keyFile".to_string(),
            message: "A key file is required when no secretId is set".to_string(),
        });
    }

    if let Some(secret_id) = &config.credentials.secret_id {
        if secret_id.trim().is_empty() || secret_id.contains('/') {
            errors.push(ConfigValidationError {
                path: "credentials.secretId".to_string(),
                message: "Secret id must be a bare, non-empty name".to_string(),
            });
        }
    }

    if config.secrets.project.trim().is_empty() {
        errors.push(ConfigValidationError {
            path: "secrets.project".to_string(),
            message: "Secret project is required".to_string(),
        });
    }

    if config.bigquery.max_query_result_rows == 0 {
        errors.push(ConfigValidationError {
            path: "bigquery.maxQueryResultRows".to_string(),
            message: "Row limit must be greater than 0".to_string(),
        });
    }

    let urls = [
        ("secrets.baseUrl", &config.secrets.base_url),
        ("bigquery.baseUrl", &config.bigquery.base_url),
        ("models.gemini.baseUrl", &config.models.gemini.base_url),
    ];
    for (path, value) in urls {
        if url::Url::parse(value).is_err() {
            errors.push(ConfigValidationError {
                path: path.to_string(),
                message: format!("Invalid URL: {value}"),
            });
        }
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_empty());
    }

    #[test]
    fn zero_row_limit_rejected() {
        let mut config = Config::default();
        config.bigquery.max_query_result_rows = 0;
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "bigquery.maxQueryResultRows");
    }

    #[test]
    fn secret_id_must_not_be_a_resource_path() {
        let mut config = Config::default();
        config.credentials.secret_id = Some("projects/x/secrets/y".to_string());
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.path == "credentials.secretId"));
    }

    #[test]
    fn bad_url_reported_with_path() {
        let mut config = Config::default();
        config.secrets.base_url = "not a url".to_string();
        let err = validate_config_object(&config).unwrap_err();
        assert!(err.to_string().contains("secrets.baseUrl"));
    }
}
