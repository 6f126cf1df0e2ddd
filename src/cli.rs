use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "backend-client")]
#[command(about = "Query the backend through an anonymizing proxy", long_about = None)]
pub struct Cli {
    #[arg(short, long, help = "Path to the configuration file", default_value = "data/config.toml")]
    pub config: PathBuf,
    #[command(flatten)]
    pub connection: ConnectionArgs,
    #[command(subcommand)]
    pub command: Commands,
}

/// Connection overrides applied on top of the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    #[arg(short = 'u', long, help = "The base URL of the backend API")]
    pub base_url: Option<String>,
    #[arg(short, long, help = "SOCKS5 proxy address (host:port)", conflicts_with = "no_proxy")]
    pub socks5_proxy: Option<String>,
    #[arg(long, help = "Connect directly, without the SOCKS5 proxy")]
    pub no_proxy: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch compact filters after a known block
    Filters {
        #[arg(short, long, help = "Hash of the best block the caller already knows")]
        best_known_block_hash: String,
        #[arg(short = 'n', long, help = "Maximum number of filters to return", default_value_t = 1000)]
        count: u32,
    },
    /// Fetch fee estimates for one or more confirmation targets
    Fees {
        #[arg(required = true, value_delimiter = ',', help = "Confirmation targets in blocks")]
        targets: Vec<u32>,
    },
    /// Broadcast a raw transaction
    Broadcast {
        #[arg(help = "Consensus-encoded transaction in hex")]
        hex: String,
    },
    /// Fetch exchange rates
    ExchangeRates,
    /// Show the versions reported by the backend
    Versions,
    /// Check whether this client is compatible with the backend and up to date
    CheckUpdates,
}
