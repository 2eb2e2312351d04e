use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

use crate::error::Error;

/// Period of the rotation timer when the config does not override it.
pub const DEFAULT_ROTATION_PERIOD: Duration = Duration::from_millis(4000);

/// Pause between a failed load and the skip to the next image.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Asset shown when the catalog turns out to be empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FallbackAsset {
    pub source: String,
    pub label: String,
}

impl Default for FallbackAsset {
    fn default() -> Self {
        Self {
            source: "img/shop-logo.jpg".into(),
            label: "Storefront logo".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Base directory image references resolve against.
    pub asset_root: PathBuf,
    /// Explicit ordered catalog of relative image references.
    pub catalog: Vec<String>,
    /// Directory scanned (sorted) for references when `catalog` is empty.
    pub product_dir: Option<PathBuf>,
    /// Time each image stays on screen before the next crossfade.
    #[serde(with = "humantime_serde")]
    pub rotation_period: Duration,
    /// Pause between a failed load and the skip-ahead.
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
    /// Eagerly decode the whole catalog at startup.
    pub prefetch: bool,
    /// Maximum number of concurrent image decodes in the loader.
    pub loader_max_concurrent_decodes: usize,
    /// Asset pinned when the catalog is empty.
    pub fallback: FallbackAsset,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            self.rotation_period > Duration::ZERO,
            "rotation-period must be positive"
        );
        ensure!(
            self.retry_delay > Duration::ZERO,
            "retry-delay must be positive"
        );
        ensure!(
            self.loader_max_concurrent_decodes > 0,
            "loader-max-concurrent-decodes must be greater than zero"
        );
        Ok(self)
    }

    /// Resolve a catalog reference against the asset root.
    #[must_use]
    pub fn resolve(&self, reference: &str) -> PathBuf {
        self.asset_root.join(reference)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            catalog: Vec::new(),
            product_dir: None,
            rotation_period: DEFAULT_ROTATION_PERIOD,
            retry_delay: DEFAULT_RETRY_DELAY,
            prefetch: true,
            loader_max_concurrent_decodes: 4,
            fallback: FallbackAsset::default(),
        }
    }
}
