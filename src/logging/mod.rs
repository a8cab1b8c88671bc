use crate::config::{LogFormat, LoggingConfig, LoggingLevel};
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the configured log format (`text` or `json`).
pub const LOG_FORMAT_ENV: &str = "PORYGON_LOG_FORMAT";

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config.level)));

    let format = match std::env::var(LOG_FORMAT_ENV) {
        Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
        Ok(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
        _ => config.format,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn default_directive(level: LoggingLevel) -> String {
    let level = match level {
        LoggingLevel::Error => "error",
        LoggingLevel::Warn => "warn",
        LoggingLevel::Info => "info",
        LoggingLevel::Debug => "debug",
        LoggingLevel::Trace => "trace",
    };
    format!("warn,porygon_agent={level},porygon={level}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_scopes_level_to_crate() {
        assert_eq!(
            default_directive(LoggingLevel::Debug),
            "warn,porygon_agent=debug,porygon=debug"
        );
    }
}
