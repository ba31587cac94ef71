use chrono::NaiveDateTime;
use tracing::info;

use crate::detector::classifier::classify;
use crate::types::{NotificationEvent, PriceChange, TrackerConfig};

/// Outcome of folding one observation into the tracker config.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub change: PriceChange,
    pub previous_price: Option<f64>,
    pub current_price: f64,
    /// Present only for `PriceChange::Drop`.
    pub event: Option<NotificationEvent>,
}

/// Apply an observed price to `config` in place and report what changed.
///
/// `last_checked` is always refreshed. `last_price` is overwritten on every
/// outcome except `Unchanged`, and the drop event is computed before the
/// overwrite so the caller can notify afterwards without affecting the
/// stored state.
pub fn apply_observation(
    config: &mut TrackerConfig,
    current_price: f64,
    now: NaiveDateTime,
) -> Decision {
    let previous_price = config.price.last_price;
    let change = classify(previous_price, current_price);

    config.price.last_checked = Some(now);

    let event = match (change, previous_price) {
        (PriceChange::Initial, _) => {
            info!("Initial price recorded: ${current_price}");
            None
        }
        (PriceChange::Drop, Some(last)) => {
            info!("Price drop detected! From ${last} to ${current_price}");
            Some(NotificationEvent::new(
                last,
                current_price,
                config.price.original_price,
            ))
        }
        (PriceChange::Rise, Some(last)) => {
            info!("Price increased from ${last} to ${current_price}");
            None
        }
        _ => {
            info!("Price unchanged: ${current_price}");
            None
        }
    };

    if change != PriceChange::Unchanged {
        config.price.last_price = Some(current_price);
    }

    Decision {
        change,
        previous_price,
        current_price,
        event,
    }
}
