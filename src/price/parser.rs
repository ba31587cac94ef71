use std::sync::LazyLock;

use regex::Regex;

/// `$` followed by ASCII digits with optional thousands commas and an optional
/// decimal part. ASCII only: `f64::from_str` cannot read other digit scripts.
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([0-9,]+\.?[0-9]*)").expect("price pattern is valid"));

/// Pull the first `$`-prefixed amount out of free text.
/// Commas are always treated as grouping separators. Returns None when there is
/// no match or the digits don't form a number (e.g. `"$,"`).
pub fn extract_price(text: &str) -> Option<f64> {
    let caps = PRICE_RE.captures(text)?;
    let digits = caps.get(1)?.as_str().replace(',', "");
    digits.parse::<f64>().ok()
}
