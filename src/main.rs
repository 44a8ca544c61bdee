use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use newswire::adapters::AdapterSet;
use newswire::aggregate::Aggregator;
use newswire::api;
use newswire::db::Database;
use newswire::logging::configure_logging;
use newswire::TARGET_AGGREGATOR;

/// Aggregated news service: fans out over configured upstreams and serves
/// merged, scored, deduplicated articles over HTTP.
#[derive(Debug, Parser)]
#[command(name = "newswire", version, about)]
struct Cli {
    /// Port the HTTP server listens on.
    #[arg(long, default_value_t = 8080, env = "NEWSWIRE_PORT")]
    port: u16,

    /// Path to the sqlite article cache.
    #[arg(long, default_value = "newswire.db", env = "NEWSWIRE_DATABASE")]
    database: String,

    /// Disable the sqlite cache tier entirely.
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_logging();

    let db = if cli.no_cache {
        info!(target: TARGET_AGGREGATOR, "Cache tier disabled");
        None
    } else {
        match Database::new(&cli.database).await {
            Ok(db) => Some(db),
            Err(err) => {
                // The cache is an optimization; run without it rather than
                // refusing to start.
                warn!(target: TARGET_AGGREGATOR, "Opening cache at {} failed, continuing without it: {}",
                      cli.database, err);
                None
            }
        }
    };

    let adapters = AdapterSet::from_env();
    let aggregator = Arc::new(Aggregator::new(adapters, db));

    api::serve(aggregator, cli.port).await
}
