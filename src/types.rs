use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_CHECK_INTERVAL_SECS, DEFAULT_ORIGINAL_PRICE, PLACEHOLDER_API_KEY};

// ---------------------------------------------------------------------------
// Persisted tracker config
// ---------------------------------------------------------------------------

/// Contents of the JSON config file. Key names match the file format already
/// in use, so existing files load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub email: EmailSettings,
    pub price: PriceState,
    /// Seconds between checks in loop mode.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSettings {
    pub sender_email: String,
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    pub api_key: String,
    pub recipient_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceState {
    /// None until the first successful fetch.
    #[serde(default)]
    pub last_price: Option<f64>,
    #[serde(default)]
    pub last_checked: Option<NaiveDateTime>,
    #[serde(default = "default_original_price")]
    pub original_price: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            email: EmailSettings {
                sender_email: "your_email@example.com".to_string(),
                sender_name: default_sender_name(),
                api_key: PLACEHOLDER_API_KEY.to_string(),
                recipient_email: "recipient@example.com".to_string(),
            },
            price: PriceState {
                last_price: None,
                last_checked: None,
                original_price: DEFAULT_ORIGINAL_PRICE,
            },
            check_interval: DEFAULT_CHECK_INTERVAL_SECS,
        }
    }
}

impl EmailSettings {
    pub fn has_placeholder_key(&self) -> bool {
        self.api_key == PLACEHOLDER_API_KEY
    }
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

fn default_sender_name() -> String {
    "Price Tracker".to_string()
}

fn default_original_price() -> f64 {
    DEFAULT_ORIGINAL_PRICE
}

// ---------------------------------------------------------------------------
// Fetch result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum PriceLookup {
    /// Lowest valid price seen across every URL and selector.
    Found(f64),
    /// Pages were reachable but nothing on them passed parsing and validation.
    NotFound,
    /// Every URL failed at the transport level.
    Transient(String),
}

impl PriceLookup {
    pub fn price(&self) -> Option<f64> {
        match self {
            PriceLookup::Found(p) => Some(*p),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Change classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceChange {
    /// No previous price on record.
    Initial,
    Drop,
    Rise,
    Unchanged,
}

impl std::fmt::Display for PriceChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PriceChange::Initial => "initial",
            PriceChange::Drop => "drop",
            PriceChange::Rise => "rise",
            PriceChange::Unchanged => "unchanged",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Notification event
// ---------------------------------------------------------------------------

/// Built only when a drop is detected and handed straight to the notifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    pub previous_price: f64,
    pub current_price: f64,
    /// previous - current
    pub price_diff: f64,
    /// price_diff as a percentage of previous_price
    pub percentage_drop: f64,
    pub original_price: f64,
    /// original - current
    pub discount_amount: f64,
    /// discount_amount as a percentage of original_price
    pub discount_percentage: f64,
}

impl NotificationEvent {
    pub fn new(previous_price: f64, current_price: f64, original_price: f64) -> Self {
        let price_diff = previous_price - current_price;
        let discount_amount = original_price - current_price;
        Self {
            previous_price,
            current_price,
            price_diff,
            percentage_drop: price_diff / previous_price * 100.0,
            original_price,
            discount_amount,
            discount_percentage: discount_amount / original_price * 100.0,
        }
    }
}
