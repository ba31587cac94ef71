/// Exclusive price range that filters out selector false positives such as
/// shipping fees or accessory prices elsewhere on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBand {
    pub min: f64,
    pub max: f64,
}

impl PriceBand {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: f64) -> bool {
        self.min < price && price < self.max
    }
}
