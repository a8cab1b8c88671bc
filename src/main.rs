use clap::Parser;
use porygon_agent::cli::{Cli, Commands, ConfigAction, ConfigOpts};
use porygon_agent::config::{validate_config_object, Config};
use porygon_agent::infra::secrets::{redact_secret, SecretManagerClient};
use porygon_agent::{agents, auth, logging};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Commands::Config(ConfigOpts {
        action: ConfigAction::Init,
    }) = &cli.command
    {
        let path = cli.config.as_deref().unwrap_or("porygon.json");
        Config::write_default(path)?;
        println!("Configuration file created at {path}");
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    logging::init(&config.logging);

    if let Some(source) = &config.source {
        info!("Loaded config from {}", source.display());
    }

    match cli.command {
        Commands::Agent(opts) => {
            let output = agents::run_single_message(&config, &opts.message).await?;
            if !output.text.is_empty() {
                println!("{}", output.text);
            }
            for (name, result) in &output.tool_results {
                println!(
                    "[{}] {}",
                    name,
                    serde_json::to_string_pretty(&result.to_response())?
                );
            }
        }
        Commands::Tools => {
            let (agent, _) = agents::build_root_agent(&config).await?;
            println!("{}", serde_json::to_string_pretty(&agent.tools())?);
        }
        Commands::Tool(opts) => {
            let params: serde_json::Value = serde_json::from_str(&opts.params)?;
            let (agent, _) = agents::build_root_agent(&config).await?;
            let result = agent.call_tool(&opts.name, params).await?;
            println!("{}", serde_json::to_string_pretty(&result.to_response())?);
            if result.is_error {
                std::process::exit(1);
            }
        }
        Commands::Token => {
            let credentials = auth::provision_from_config(&config).await?;
            let expires_in = credentials.token().map(|t| t.remaining_secs()).unwrap_or(0);
            println!(
                "{} token valid for {}s (scopes: {})",
                credentials.client_email(),
                expires_in,
                credentials.scopes().join(" ")
            );
        }
        Commands::Secret(opts) => {
            let project = opts.project.as_deref().unwrap_or(&config.secrets.project);
            let value = SecretManagerClient::from_default_credentials()?
                .with_base_url(&config.secrets.base_url)
                .get_secret(&opts.secret_id, Some(project), opts.version.as_deref())
                .await?;
            if opts.reveal {
                println!("{value}");
            } else {
                println!("{}: {}", opts.secret_id, redact_secret(&value));
            }
        }
        Commands::Config(opts) => match opts.action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            }
            ConfigAction::Validate => {
                validate_config_object(&config)?;
                info!("Configuration is valid");
            }
            ConfigAction::Init => unreachable!("handled before config load"),
        },
        Commands::Doctor => {
            let failures = porygon_agent::infra::doctor::run_diagnostics(&config).await?;
            if failures > 0 {
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("porygon {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
