use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::detector::{apply_observation, Decision};
use crate::error::Result;
use crate::fetcher::{PageSource, PriceFetcher};
use crate::notify::Notifier;
use crate::state::ConfigStore;
use crate::types::{PriceLookup, TrackerConfig};

/// What a single check cycle did.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub lookup: PriceLookup,
    /// None when no price was found; the config file is then left untouched.
    pub decision: Option<Decision>,
    pub notified: bool,
    /// False when nothing was written: no price found, or the config file
    /// on disk was unreadable and must be kept as is.
    pub persisted: bool,
    /// Interval read from the config file this cycle.
    pub check_interval: u64,
}

impl CycleReport {
    /// One-line outcome for one-shot mode.
    pub fn summary(&self) -> String {
        match (&self.decision, self.persisted) {
            (None, _) => "Could not retrieve price. Config not updated.".to_string(),
            (Some(d), true) => format!("Price check complete: ${} ({})", d.current_price, d.change),
            (Some(d), false) => format!(
                "Price check complete: ${} ({}), config file unreadable so not updated",
                d.current_price, d.change
            ),
        }
    }
}

/// What the loop logs once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct StartupSummary {
    pub placeholder_key: bool,
    pub interval_hours: f64,
}

impl StartupSummary {
    pub fn from_config(cfg: &TrackerConfig) -> Self {
        Self {
            placeholder_key: cfg.email.has_placeholder_key(),
            interval_hours: cfg.check_interval as f64 / 3600.0,
        }
    }

    pub fn log(&self) {
        if self.placeholder_key {
            warn!("Brevo API key not configured. Please update the config file.");
        }
        info!("Price tracker will check every {:.1} hours", self.interval_hours);
    }
}

/// One load → fetch → decide → notify → save pass. Shared by loop and
/// one-shot mode.
pub struct PriceTracker<S, N> {
    store: ConfigStore,
    fetcher: PriceFetcher<S>,
    notifier: N,
}

impl<S: PageSource, N: Notifier> PriceTracker<S, N> {
    pub fn new(store: ConfigStore, fetcher: PriceFetcher<S>, notifier: N) -> Self {
        Self {
            store,
            fetcher,
            notifier,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub async fn startup_summary(&self) -> StartupSummary {
        let (config, _) = self.store.load().await;
        StartupSummary::from_config(&config)
    }

    /// Errors only when the updated config cannot be written. Notification
    /// failure is reported in the result but never prevents the save. When
    /// the file on disk could not be read, the cycle runs against defaults
    /// and nothing is written back.
    pub async fn run_cycle(&self, now: NaiveDateTime) -> Result<CycleReport> {
        let (mut config, origin) = self.store.load().await;
        let lookup = self.fetcher.fetch_price().await;

        let Some(current_price) = lookup.price() else {
            warn!("Could not retrieve current price. Skipping this check.");
            return Ok(CycleReport {
                lookup,
                decision: None,
                notified: false,
                persisted: false,
                check_interval: config.check_interval,
            });
        };

        let decision = apply_observation(&mut config, current_price, now);

        let notified = match &decision.event {
            Some(event) => self.notifier.notify(&config.email, event).await,
            None => false,
        };

        let persisted = origin.may_persist();
        if persisted {
            self.store.save(&config).await?;
            info!(
                change = %decision.change,
                price = current_price,
                notified,
                "Config updated with price: ${current_price}"
            );
        } else {
            warn!(
                "Config file {} is unreadable; keeping it unchanged (observed ${current_price})",
                self.store.path().display()
            );
        }

        Ok(CycleReport {
            lookup,
            decision: Some(decision),
            notified,
            persisted,
            check_interval: config.check_interval,
        })
    }
}
