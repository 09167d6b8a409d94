use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{
    CONFIG_FILE, DEFAULT_BATCH_DELAY_MS, DEFAULT_BATCH_SIZE, DEFAULT_LOOKBACK_DAYS,
    DEFAULT_TIMEOUT_SECS, NASA_API_KEY_ALIAS_ENV, NASA_API_KEY_ENV, RAW_ARTIFACT, RAW_SUBDIR,
    STAGED_ARTIFACT, STAGED_SUBDIR,
};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub extract: ExtractConfig,
    pub load: LoadConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// How many past days to request, counted back from today.
    pub lookback_days: u32,
    pub timeout_seconds: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub batch_size: usize,
    /// Courtesy pause between consecutive upsert batches.
    pub batch_delay_ms: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

impl Config {
    /// Read config.toml when present; a missing file means defaults.
    pub fn load() -> Result<Self> {
        if !Path::new(CONFIG_FILE).exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(CONFIG_FILE).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file '{CONFIG_FILE}': {e}"))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.extract.lookback_days < 1 {
            return Err(PipelineError::Config(
                "lookback window must be at least 1 day".into(),
            ));
        }
        if self.load.batch_size < 1 {
            return Err(PipelineError::Config("batch size must be at least 1".into()));
        }
        Ok(())
    }

    pub fn raw_artifact_path(&self) -> PathBuf {
        self.data.dir.join(RAW_SUBDIR).join(RAW_ARTIFACT)
    }

    pub fn staged_artifact_path(&self) -> PathBuf {
        self.data.dir.join(STAGED_SUBDIR).join(STAGED_ARTIFACT)
    }
}

/// NASA API key from the environment, accepted under either supported name.
pub fn nasa_api_key() -> Result<String> {
    for name in [NASA_API_KEY_ENV, NASA_API_KEY_ALIAS_ENV] {
        if let Ok(value) = std::env::var(name) {
            if !value.trim().is_empty() {
                return Ok(value);
            }
        }
    }
    Err(PipelineError::Config(format!(
        "NASA API key is missing. Set env var '{NASA_API_KEY_ENV}' or '{NASA_API_KEY_ALIAS_ENV}'."
    )))
}
