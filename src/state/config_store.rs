use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{error, info};

use crate::error::Result;
use crate::types::TrackerConfig;

/// Where a loaded config came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Parsed from the file on disk.
    File,
    /// No file existed; defaults were used (and written, if possible).
    Fresh,
    /// A file exists but could not be read. Defaults are in use and the file
    /// must not be overwritten.
    Fallback,
}

impl ConfigOrigin {
    pub fn may_persist(self) -> bool {
        self != ConfigOrigin::Fallback
    }
}

/// JSON file holding credentials and price history. Read at the start of
/// every cycle and rewritten at the end; there is exactly one writer.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails. A missing file is created with defaults; an unreadable or
    /// corrupt one is left alone and defaults are used for this run only.
    pub async fn load(&self) -> (TrackerConfig, ConfigOrigin) {
        match tokio::fs::try_exists(&self.path).await {
            Ok(true) => match self.read().await {
                Ok(cfg) => (cfg, ConfigOrigin::File),
                Err(e) => {
                    error!("Error loading config {}: {e}", self.path.display());
                    (TrackerConfig::default(), ConfigOrigin::Fallback)
                }
            },
            Ok(false) => {
                let cfg = TrackerConfig::default();
                match self.save(&cfg).await {
                    Ok(()) => info!("Created default configuration file: {}", self.path.display()),
                    Err(e) => error!("Failed to create config {}: {e}", self.path.display()),
                }
                (cfg, ConfigOrigin::Fresh)
            }
            Err(e) => {
                error!("Error checking config {}: {e}", self.path.display());
                (TrackerConfig::default(), ConfigOrigin::Fallback)
            }
        }
    }

    pub async fn save(&self, cfg: &TrackerConfig) -> Result<()> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        cfg.serialize(&mut ser)?;
        tokio::fs::write(&self.path, buf).await?;
        Ok(())
    }

    async fn read(&self) -> Result<TrackerConfig> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }
}
