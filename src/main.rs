//! NextLevelBot - conversational gaming assistant CLI
//!
#![doc = "Main entry point for the NextLevelBot application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nextlevelbot::cli::{Cli, Commands};
use nextlevelbot::commands;
use nextlevelbot::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_tracing(cli.verbose, cli.json_logs);

    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    config.validate()?;

    match cli.command {
        Commands::Chat { session } => {
            tracing::info!("Starting interactive chat");
            if let Some(id) = &session {
                tracing::debug!("Continuing session: {}", id);
            }
            commands::chat::run_chat(config, session).await?;
            Ok(())
        }
        Commands::Ask {
            question,
            session,
            show_steps,
        } => {
            tracing::info!("Answering one-shot question");
            commands::ask::run_ask(config, question, session, show_steps).await?;
            Ok(())
        }
        Commands::Stats { top } => {
            tracing::info!("Collecting graph statistics");
            commands::stats::show_stats(&config, top).await?;
            Ok(())
        }
        Commands::Query { cypher, limit } => {
            tracing::info!("Running custom query");
            commands::query::run_query(&config, &cypher, limit).await?;
            Ok(())
        }
        Commands::History { command } => {
            tracing::info!("Starting history command");
            commands::history::handle_history(&config, command).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose {
        "nextlevelbot=debug"
    } else {
        "nextlevelbot=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
