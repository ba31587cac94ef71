use crate::types::PriceChange;

/// Classify a freshly observed price against the last one on record.
/// Equality is exact: the same scraped string always parses to the same f64.
pub fn classify(last_price: Option<f64>, current_price: f64) -> PriceChange {
    match last_price {
        None => PriceChange::Initial,
        Some(last) if current_price < last => PriceChange::Drop,
        Some(last) if current_price > last => PriceChange::Rise,
        Some(_) => PriceChange::Unchanged,
    }
}
