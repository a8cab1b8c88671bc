use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "porygon", version, about = "Read-only BigQuery agent")]
pub struct Cli {
    #[arg(short, long, global = true, env = "PORYGON_CONFIG")]
    pub config: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one message to the root agent.
    Agent(AgentOpts),
    /// List the root agent's tool declarations.
    Tools,
    /// Invoke one tool directly.
    Tool(ToolOpts),
    /// Provision credentials and report token expiry.
    Token,
    /// Read a secret from Secret Manager.
    Secret(SecretOpts),
    Config(ConfigOpts),
    Doctor,
    Version,
}

#[derive(clap::Args)]
pub struct AgentOpts {
    pub message: String,
}

#[derive(clap::Args)]
pub struct ToolOpts {
    pub name: String,
    /// Tool parameters as a JSON object.
    #[arg(short, long, default_value = "{}")]
    pub params: String,
}

#[derive(clap::Args)]
pub struct SecretOpts {
    pub secret_id: String,
    #[arg(short, long)]
    pub project: Option<String>,
    #[arg(short, long)]
    pub version: Option<String>,
    /// Print the value instead of a redacted preview.
    #[arg(long)]
    pub reveal: bool,
}

#[derive(clap::Args)]
pub struct ConfigOpts {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    Show,
    Validate,
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_secret_defaults() {
        let cli = Cli::try_parse_from(["porygon", "secret", "credentials-sa"]).unwrap();
        match cli.command {
            Commands::Secret(opts) => {
                assert_eq!(opts.secret_id, "credentials-sa");
                assert!(opts.project.is_none());
                assert!(opts.version.is_none());
                assert!(!opts.reveal);
            }
            _ => panic!("expected secret command"),
        }
    }

    #[test]
    fn parses_tool_params() {
        let cli = Cli::try_parse_from([
            "porygon",
            "--config",
            "porygon.yaml",
            "tool",
            "bigquery.execute_sql",
            "--params",
            r#"{"query":"SELECT 1"}"#,
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("porygon.yaml"));
        assert!(matches!(cli.command, Commands::Tool(ref o) if o.name == "bigquery.execute_sql"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
