use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

pub const PRODUCT_NAME: &str = "Sony Xperia 1 VI";

/// Product pages to scrape, in priority order.
pub const PRODUCT_URLS: &[&str] = &["https://store.sony.com.sg/products/xperia-1m6/?locale=en"];

/// CSS selectors tried against every page, in priority order.
pub const PRICE_SELECTORS: &[&str] = &[".product__price", ".price", ".product-price"];

/// Plausible price band for the product. Both bounds are exclusive.
pub const MIN_VALID_PRICE: f64 = 500.0;
pub const MAX_VALID_PRICE: f64 = 3000.0;

pub const BREVO_API_URL: &str = "https://api.brevo.com/v3/smtp/email";

/// Value shipped in a freshly created config file. Sending is skipped while it is still set.
pub const PLACEHOLDER_API_KEY: &str = "your_brevo_api_key";

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Timeout for both the page fetch and the email API call (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default check interval: every 6 hours.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 6 * 60 * 60;

/// List price used for the "discount from original" figure when the config omits it.
pub const DEFAULT_ORIGINAL_PRICE: f64 = 1989.0;

/// Process-level settings read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON file holding credentials and the last observed price (PRICE_CONFIG_PATH)
    pub config_path: PathBuf,
    /// Log file written alongside stdout (LOG_FILE)
    pub log_file: PathBuf,
    /// EnvFilter directive (LOG_LEVEL)
    pub log_level: String,
    /// When set, every fetched page is dumped here for selector debugging (DEBUG_HTML_DIR)
    pub debug_html_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config_path = std::env::var("PRICE_CONFIG_PATH")
            .unwrap_or_else(|_| "price_config.json".to_string());
        if config_path.trim().is_empty() {
            return Err(AppError::Config("PRICE_CONFIG_PATH must not be empty".to_string()));
        }

        let log_file =
            std::env::var("LOG_FILE").unwrap_or_else(|_| "price_tracker.log".to_string());
        if log_file.trim().is_empty() {
            return Err(AppError::Config("LOG_FILE must not be empty".to_string()));
        }

        Ok(Self {
            config_path: PathBuf::from(config_path),
            log_file: PathBuf::from(log_file),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            debug_html_dir: std::env::var("DEBUG_HTML_DIR")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        })
    }
}

/// Everything the fetcher needs to know about where and how to look for a price.
/// Built once and never mutated; tests construct their own with local URLs.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub urls: Vec<String>,
    pub selectors: Vec<String>,
    pub min_price: f64,
    pub max_price: f64,
    pub user_agent: String,
    pub accept_language: String,
    pub timeout: Duration,
    pub debug_html_dir: Option<PathBuf>,
}

impl ScrapeConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            debug_html_dir: cfg.debug_html_dir.clone(),
            ..Self::default()
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            urls: PRODUCT_URLS.iter().map(|s| s.to_string()).collect(),
            selectors: PRICE_SELECTORS.iter().map(|s| s.to_string()).collect(),
            min_price: MIN_VALID_PRICE,
            max_price: MAX_VALID_PRICE,
            user_agent: USER_AGENT.to_string(),
            accept_language: ACCEPT_LANGUAGE.to_string(),
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            debug_html_dir: None,
        }
    }
}
