use crate::auth::provision_from_config;
use crate::config::{validate_config, Config};
use std::path::Path;
use tracing::{error, info, warn};

/// Check configuration, key availability, and token minting. Returns the
/// number of failed checks.
pub async fn run_diagnostics(config: &Config) -> anyhow::Result<usize> {
    info!("Running system diagnostics...");
    let mut failures = 0;

    let errors = validate_config(config);
    if errors.is_empty() {
        info!("Configuration: ok");
    } else {
        for e in &errors {
            error!("Configuration: {}", e);
        }
        failures += errors.len();
    }

    match &config.credentials.secret_id {
        Some(secret_id) => info!("Credential source: secret '{}'", secret_id),
        None if Path::new(&config.credentials.key_file).is_file() => {
            info!("Credential source: key file {}", config.credentials.key_file)
        }
        None => {
            warn!("Key file {} does not exist", config.credentials.key_file);
        }
    }

    match provision_from_config(config).await {
        Ok(credentials) => {
            let expires_in = credentials.token().map(|t| t.remaining_secs()).unwrap_or(0);
            info!(
                "Credentials: minted token for {} (expires in {}s)",
                credentials.client_email(),
                expires_in
            );
        }
        Err(e) => {
            error!("Credentials: {:#}", e);
            failures += 1;
        }
    }

    info!("Diagnostics complete ({} failure(s))", failures);
    Ok(failures)
}
