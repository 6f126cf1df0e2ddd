use std::str::FromStr;

use anyhow::Context;
use backend_client::cli::{Cli, Commands};
use backend_client::config::load_client_config;
use backend_client::http::BackendHttpClient;
use backend_client::log::init_logging;
use bitcoin::BlockHash;
use clap::Parser;
use log::{info, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_logging()?;
    let cli = Cli::parse();

    let mut config = load_client_config(&cli.config)?;
    config.apply_args(&cli.connection);

    let client = BackendHttpClient::with_options(config.base_url()?, config.gateway_options())
        .context("Could not create backend client")?;
    info!(
        base_url = &*client.get_address(),
        proxy = config.socks5_proxy.as_deref().unwrap_or("none");
        "Backend client ready"
    );

    let result = match cli.command {
        Commands::Filters {
            best_known_block_hash,
            count,
        } => {
            let hash = BlockHash::from_str(&best_known_block_hash).context("Invalid block hash")?;

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling filters request");
                    on_ctrl_c.cancel();
                }
            });

            match client.get_filters(&hash, count, Some(&cancel)).await? {
                Some(filters) => print_json(&filters),
                None => {
                    println!("No new filters.");
                    Ok(())
                },
            }
        },
        Commands::Fees { targets } => print_json(&client.get_fees(&targets).await?),
        Commands::Broadcast { hex } => {
            client.broadcast_hex(hex.trim()).await?;
            println!("Transaction broadcast.");
            Ok(())
        },
        Commands::ExchangeRates => print_json(&client.get_exchange_rates().await?),
        Commands::Versions => print_json(&client.get_versions().await?),
        Commands::CheckUpdates => {
            let report = client.check_updates().await?;
            let local = client.local_versions();
            println!(
                "{} (local client {}, backend API v{})",
                report.compatibility(),
                local.client_version,
                local.backend_major_version
            );
            print_json(&report)
        },
    };

    if let Some(latency) = client.get_last_request_latency().await {
        info!(latency_ms = latency.as_millis() as u64; "Last backend round trip");
    }

    result
}

fn print_json<T: Serialize>(value: &T) -> Result<(), anyhow::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
