use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::dispatch::types::ResponseStatus;

#[derive(Parser, Debug)]
#[command(name = "concierge", version, about = "Routes queries to specialist agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a single query
    Ask {
        /// The user's query
        query: String,

        /// Print only the response text instead of the full JSON record
        #[arg(long)]
        text: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Answer one query per stdin line, printing one JSON line per query
    Batch {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Resolve the configuration and print where it came from
    CheckConfig {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

impl Commands {
    pub fn config_args(&self) -> &ConfigArgs {
        match self {
            Commands::Ask { config, .. } => config,
            Commands::Batch { config } => config,
            Commands::CheckConfig { config } => config,
        }
    }
}

/// Config file location and overrides shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to config file (overrides the default search)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Specialist call timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Specialist used when no keyword matches
    #[arg(long)]
    pub default_specialist: Option<String>,

    /// Status reported for plain-text specialist replies (`ok` or `error`)
    #[arg(long)]
    pub degraded_status: Option<ResponseStatus>,

    /// Maximum queries served at once in batch mode
    #[arg(long)]
    pub max_concurrent: Option<usize>,
}
