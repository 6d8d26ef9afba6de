use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use concierge::cli::{Cli, Commands};
use concierge::config::{self, CoordinatorConfig, SpecialistTransport};
use concierge::dispatch::SmartCoordinator;
use concierge::routing::KeywordRouter;
use concierge::specialist::SpecialistRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing on stderr so stdout stays machine readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("Concierge starting");

    // Configuration is mandatory; a NotFound here aborts the process.
    let config = Arc::new(config::load_config(cli.command.config_args())?);
    tracing::info!(
        name = %config.name,
        source = %config.source.display(),
        specialists = config.specialists.len(),
        timeout_secs = config.specialist_timeout_secs,
        "Config loaded"
    );

    match cli.command {
        Commands::CheckConfig { .. } => {
            print_config(&config);
        }
        Commands::Ask { query, text, .. } => {
            let coordinator = build_coordinator(config)?;

            let cancel = CancellationToken::new();
            {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Interrupt received, cancelling request");
                        cancel.cancel();
                    }
                });
            }

            let response = coordinator.handle_with_cancel(&query, &cancel).await;
            if text {
                println!("{}", response.response.as_deref().unwrap_or_default());
            } else {
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
        }
        Commands::Batch { .. } => {
            let coordinator = build_coordinator(config)?;

            let mut queries = Vec::new();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
                let line = line.trim();
                if !line.is_empty() {
                    queries.push(line.to_string());
                }
            }
            tracing::info!(queries = queries.len(), "Batch read from stdin");

            for response in coordinator.handle_batch(queries).await {
                println!("{}", serde_json::to_string(&response)?);
            }
        }
    }

    Ok(())
}

fn build_coordinator(config: Arc<CoordinatorConfig>) -> anyhow::Result<SmartCoordinator> {
    let router = KeywordRouter::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to compile specialist keywords: {}", e))?;
    let specialists = SpecialistRegistry::from_config(&config)?;
    Ok(SmartCoordinator::new(config, Arc::new(router), specialists))
}

fn print_config(config: &CoordinatorConfig) {
    println!(
        "Coordinator '{}' loaded from {}\n  Timeout: {}s\n  Max concurrent: {}\n  Degraded status: {}\n  Default specialist: {}",
        config.name,
        config.source.display(),
        config.specialist_timeout_secs,
        config.max_concurrent_requests,
        config.degraded_status,
        config.default_specialist.as_deref().unwrap_or("(none)"),
    );
    println!("Specialists:");
    for specialist in config.specialists.values() {
        let transport = match &specialist.transport {
            SpecialistTransport::Command(command) => format!("command `{command}`"),
            SpecialistTransport::Http(endpoint) => format!("http {endpoint}"),
        };
        println!(
            "  - {} ({transport}) keywords: [{}]",
            specialist.name,
            specialist.keywords.join(", ")
        );
    }
}
