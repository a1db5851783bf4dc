//! novadrain - evacuate all VM instances from a hypervisor host
//!
//! ## Usage
//!
//! ```bash
//! # Let the scheduler place every instance
//! novadrain compute-03
//!
//! # Pin the destination and raise the per-wait timeout
//! novadrain compute-03 --target compute-07 --timeout 600
//!
//! # Verbose logging
//! novadrain compute-03 --debug
//! ```
//!
//! Credentials come from the standard `OS_*` environment variables
//! (source your openrc file first). Exits 0 on success or a host with no
//! instances, 1 on any fatal migration failure.

use clap::Parser;
use novadrain::{EvacuationConfig, Evacuator, NovaClient, DEFAULT_TIMEOUT_SECS};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Evacuate all VM instances from a hypervisor host
#[derive(Parser)]
#[command(name = "novadrain")]
#[command(about = "Evacuate all VM instances from a hypervisor host", long_about = None)]
struct Cli {
    /// Host to evacuate
    host: String,

    /// Migrate all instances to this host (scheduler decides when omitted)
    #[arg(short, long, value_name = "HOST")]
    target: Option<String>,

    /// How many seconds to wait for each migration status transition
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "novadrain=debug,info"
    } else {
        "novadrain=info,info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let client = match NovaClient::from_env().await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to the control plane: {}", e);
            std::process::exit(1);
        }
    };

    let mut config = EvacuationConfig::new(&cli.host).with_timeout(cli.timeout);
    if let Some(target) = &cli.target {
        config = config.with_target(target);
    }

    let evacuator = Evacuator::new(&client, config);
    match evacuator.run().await {
        Ok(migrated) => {
            info!("Evacuation of {} complete, {} instances migrated", cli.host, migrated);
            Ok(())
        }
        Err(e) => {
            error!("Something went wrong: {}", e);
            std::process::exit(1);
        }
    }
}
