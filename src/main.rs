mod config;
mod detector;
mod error;
mod fetcher;
mod logging;
mod notify;
mod price;
mod scheduler;
mod state;
#[cfg(test)]
mod test_support;
mod tracker;
mod types;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{Config, ScrapeConfig, PRODUCT_NAME};
use crate::error::Result;
use crate::fetcher::{HttpPageSource, PriceFetcher};
use crate::notify::BrevoNotifier;
use crate::scheduler::{Scheduler, SystemClock};
use crate::state::ConfigStore;
use crate::tracker::PriceTracker;

#[derive(Parser, Debug)]
#[command(version, about = "Watches a product page and emails an alert when the price drops")]
struct Cli {
    /// Run a single check, update the config file, and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    let _log_guard = match logging::init(&cfg) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Logging error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cfg, cli.once).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config, once: bool) -> Result<()> {
    let scrape = ScrapeConfig::from_config(&cfg);
    let source = HttpPageSource::new(&scrape)?;
    let fetcher = PriceFetcher::new(scrape, source)?;
    let tracker = PriceTracker::new(
        ConfigStore::new(&cfg.config_path),
        fetcher,
        BrevoNotifier::new()?,
    );

    if once {
        info!("{PRODUCT_NAME} Price Check - single run");
        let scheduler = Scheduler::new(tracker, SystemClock, CancellationToken::new());
        let report = scheduler.run_once().await?;
        if report.persisted {
            info!("{}", report.summary());
        } else {
            warn!("{}", report.summary());
        }
        return Ok(());
    }

    info!("{PRODUCT_NAME} Price Tracker started");
    info!("Using config file {}", tracker.store().path().display());
    tracker.startup_summary().await.log();

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Price tracker stopped by user");
                signal_token.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {e}"),
        }
    });

    let scheduler = Scheduler::new(tracker, SystemClock, shutdown);
    scheduler.run_loop().await;
    Ok(())
}
