use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::{Html, Selector};
use tracing::{debug, error, info, warn};

use crate::config::ScrapeConfig;
use crate::error::{AppError, Result};
use crate::price::{extract_price, PriceBand};
use crate::types::PriceLookup;

/// Where page bodies come from. Production goes over HTTP; tests serve canned HTML.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// `reqwest`-backed page source with browser-like headers and a bounded timeout.
pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    pub fn new(cfg: &ScrapeConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&cfg.user_agent)
                .map_err(|e| AppError::Config(format!("invalid user agent: {e}")))?,
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&cfg.accept_language)
                .map_err(|e| AppError::Config(format!("invalid accept-language: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        debug!("Fetched {url} ({status})");
        Ok(resp.text().await?)
    }
}

/// Scrapes every configured URL with every configured selector and reports
/// the lowest plausible price. Taking the minimum keeps crossed-out list
/// prices from being mistaken for the selling price.
pub struct PriceFetcher<S> {
    source: S,
    urls: Vec<String>,
    selectors: Vec<(String, Selector)>,
    band: PriceBand,
    debug_html_dir: Option<PathBuf>,
}

impl<S: PageSource> PriceFetcher<S> {
    /// Fails if any selector in `cfg` is not valid CSS.
    pub fn new(cfg: ScrapeConfig, source: S) -> Result<Self> {
        let selectors = cfg
            .selectors
            .iter()
            .map(|raw| {
                Selector::parse(raw)
                    .map(|sel| (raw.clone(), sel))
                    .map_err(|e| AppError::Selector {
                        selector: raw.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source,
            urls: cfg.urls,
            selectors,
            band: PriceBand::new(cfg.min_price, cfg.max_price),
            debug_html_dir: cfg.debug_html_dir,
        })
    }

    pub async fn fetch_price(&self) -> PriceLookup {
        let mut valid_prices: Vec<f64> = Vec::new();
        let mut failures: Vec<String> = Vec::new();

        for url in &self.urls {
            info!("Trying to fetch price from: {url}");
            let body = match self.source.fetch(url).await {
                Ok(body) => body,
                Err(e) => {
                    error!("Error fetching {url}: {e}");
                    failures.push(format!("{url}: {e}"));
                    continue;
                }
            };

            if let Some(dir) = &self.debug_html_dir {
                save_debug_html(dir, url, &body).await;
            }

            valid_prices.extend(self.prices_in_page(&body));
        }

        let lowest = valid_prices.iter().copied().min_by(f64::total_cmp);
        match lowest {
            Some(price) => {
                info!("Using lowest valid price found: ${price}");
                PriceLookup::Found(price)
            }
            None if !self.urls.is_empty() && failures.len() == self.urls.len() => {
                error!("Failed to find a valid price: every URL failed");
                PriceLookup::Transient(failures.join("; "))
            }
            None => {
                error!("Failed to find a valid price");
                PriceLookup::NotFound
            }
        }
    }

    /// All in-band prices on one page, in selector order. Kept synchronous so
    /// the parsed document never lives across an await.
    fn prices_in_page(&self, body: &str) -> Vec<f64> {
        let document = Html::parse_document(body);
        let mut prices = Vec::new();

        debug!("Looking for price elements...");
        for (raw, selector) in &self.selectors {
            for element in document.select(selector) {
                let text = element.text().collect::<String>();
                let text = text.trim();
                info!("Found element with selector '{raw}': {text}");

                let Some(price) = extract_price(text) else {
                    continue;
                };
                info!("Successfully extracted price: ${price}");

                if self.band.contains(price) {
                    info!("Price is in valid range: ${price}");
                    prices.push(price);
                } else {
                    warn!(
                        "Price ${price} outside expected range ({}-{})",
                        self.band.min, self.band.max
                    );
                }
            }
        }
        prices
    }
}

/// `debug_<last path segment>.html` for a page URL, e.g. `debug_xperia-1m6.html`.
fn debug_file_name(url: &str) -> String {
    let segment = reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segs| segs.filter(|s| !s.is_empty()).last().map(str::to_string))
        })
        .unwrap_or_else(|| "page".to_string());
    format!("debug_{segment}.html")
}

async fn save_debug_html(dir: &Path, url: &str, body: &str) {
    let path = dir.join(debug_file_name(url));
    match tokio::fs::write(&path, body).await {
        Ok(()) => info!("Saved debug HTML to {}", path.display()),
        Err(e) => error!("Failed to save debug HTML to {}: {e}", path.display()),
    }
}
