use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::data::aggregate::{ColorMode, DEFAULT_TOP_GROUPS, Granularity};
use crate::data::loader::{LoadOptions, Source};

/// Public GTD export used when nothing else is configured.
pub const DEFAULT_SOURCE: &str = "https://drive.google.com/uc?id=1fzYJnNk24rQn_hOwiahtCRreYYXwgNkI";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Dashboard settings: where the data lives and the initial control values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: String,
    pub http_timeout_secs: u64,
    pub top_groups: usize,
    /// Initial upper bound of the casualty slider.
    pub default_casualty_max: f64,
    pub default_success: Vec<i64>,
    pub default_suicide: Vec<i64>,
    pub granularity: Granularity,
    pub color_by: ColorMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            http_timeout_secs: 60,
            top_groups: DEFAULT_TOP_GROUPS,
            default_casualty_max: 1000.0,
            default_success: vec![1, 0],
            default_suicide: vec![1, 0],
            granularity: Granularity::Yearly,
            color_by: ColorMode::AttackType,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// * `DARKPULSE_CONFIG` – optional JSON file; its fields replace defaults
    /// * `DARKPULSE_SOURCE` – data location (URL or path)
    /// * `DARKPULSE_HTTP_TIMEOUT_SECS` – remote fetch timeout
    /// * `DARKPULSE_TOP_GROUPS` – length of the group ranking
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = match lookup("DARKPULSE_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path)).unwrap_or_else(|e| {
                log::warn!("{e}; using default settings");
                Self::default()
            }),
            None => Self::default(),
        };

        if let Some(source) = lookup("DARKPULSE_SOURCE").filter(|s| !s.trim().is_empty()) {
            settings.source = source;
        }
        if let Some(secs) = lookup("DARKPULSE_HTTP_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            settings.http_timeout_secs = secs;
        }
        if let Some(n) = lookup("DARKPULSE_TOP_GROUPS").and_then(|v| v.parse().ok()) {
            settings.top_groups = n;
        }
        settings
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn source(&self) -> Source {
        Source::parse(&self.source)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            http_timeout: Duration::from_secs(self.http_timeout_secs),
        }
    }
}
