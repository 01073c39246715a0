//! stability-oracle: publishes a composite stability index on-chain
//!
//! Every cycle reads nonprofit filings and search interest, combines them
//! into the stability index and sends it to the oracle contract, then
//! sleeps until the next cycle.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use stability_oracle::{
    config::Args,
    logging,
    metrics::{FilingsSource, TrendsSource},
    oracle::{EvmChain, OracleChain, OraclePublisher},
    Scheduler, UpdateCycle,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_format);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let oracle_address = args.oracle_address()?;
    let chain = match EvmChain::connect(&args.rpc_url, args.private_key.expose(), oracle_address) {
        Ok(chain) => chain,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!("======================================");
    info!("  Stability Oracle");
    info!("======================================");
    info!("Organization EIN: {}", args.ein);
    info!("Trends keyword: {} ({})", args.trends_keyword, args.trends_timeframe);
    info!("Oracle contract: {}", oracle_address);
    info!("Sender: {}", chain.sender());
    info!("Gas: {} @ {} gwei", args.gas_limit, args.gas_price_gwei);
    info!("Interval: {}s", args.interval_secs);
    if args.dry_run {
        warn!("Dry run: transactions will not be sent");
    }
    info!("======================================");

    let financial = Arc::new(FilingsSource::new(args.filings_config())?);
    let engagement = Arc::new(TrendsSource::new(args.trends_config())?);
    let publisher = OraclePublisher::new(Arc::new(chain), args.gas_policy(), args.receipt_policy());

    let cycle = UpdateCycle::new(financial, engagement, publisher).with_dry_run(args.dry_run);

    if args.once {
        let report = cycle.run().await;
        info!(outcome = ?report.publication, "Single cycle finished");
        return Ok(());
    }

    let scheduler = Scheduler::new(args.interval());
    let cycle = &cycle;
    scheduler
        .run(
            move || async move {
                cycle.run().await;
            },
            async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!(error = %e, "Failed to listen for shutdown signal");
                    std::future::pending::<()>().await;
                }
            },
        )
        .await;

    info!("Stability oracle stopped");
    Ok(())
}
