use garde::Validate;
use serde::Deserialize;
use std::time::Duration;

use crate::services::engine::ANALYSIS_BASE_PATH;
use crate::services::lifecycle::{self, Timing};
use crate::services::policy::{ValidationPolicy, MAX_FILE_BYTES};
use crate::services::progress::{DeltaStreams, RandomStreams};

#[derive(Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    #[garde(length(min = 1))]
    pub bind_addr: String,

    /// Largest accepted document, in bytes.
    #[serde(default = "default_max_file_bytes")]
    #[garde(range(min = 1))]
    pub max_file_bytes: u64,

    /// Largest accepted request body, in bytes. Must leave room for a whole batch.
    #[serde(default = "default_max_request_bytes")]
    #[garde(range(min = 1))]
    pub max_request_bytes: usize,

    #[serde(default = "default_upload_tick_ms")]
    #[garde(range(min = 1, max = 60_000))]
    pub upload_tick_ms: u64,

    #[serde(default = "default_processing_tick_ms")]
    #[garde(range(min = 1, max = 60_000))]
    pub processing_tick_ms: u64,

    #[serde(default = "default_settle_delay_ms")]
    #[garde(range(max = 60_000))]
    pub settle_delay_ms: u64,

    /// Largest progress increment per upload tick, in percent.
    #[serde(default = "default_upload_max_delta")]
    #[garde(custom(positive_percent))]
    pub upload_max_delta: f64,

    /// Largest progress increment per processing tick, in percent.
    #[serde(default = "default_processing_max_delta")]
    #[garde(custom(positive_percent))]
    pub processing_max_delta: f64,

    /// Path or URL of the analysis viewer completed documents link to.
    #[serde(default = "default_analysis_base_path")]
    #[garde(length(min = 1))]
    pub analysis_base_path: String,

    /// Fixed seed for progress increments. Unset means entropy.
    #[serde(default)]
    #[garde(skip)]
    pub rng_seed: Option<u64>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_max_file_bytes() -> u64 {
    MAX_FILE_BYTES
}

fn default_max_request_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_upload_tick_ms() -> u64 {
    lifecycle::UPLOAD_TICK.as_millis() as u64
}

fn default_processing_tick_ms() -> u64 {
    lifecycle::PROCESSING_TICK.as_millis() as u64
}

fn default_settle_delay_ms() -> u64 {
    lifecycle::SETTLE_DELAY.as_millis() as u64
}

fn default_upload_max_delta() -> f64 {
    lifecycle::UPLOAD_MAX_DELTA
}

fn default_processing_max_delta() -> f64 {
    lifecycle::PROCESSING_MAX_DELTA
}

fn default_analysis_base_path() -> String {
    ANALYSIS_BASE_PATH.to_string()
}

fn positive_percent(value: &f64, _ctx: &()) -> garde::Result {
    if value.is_finite() && *value > 0.0 && *value <= 100.0 {
        Ok(())
    } else {
        Err(garde::Error::new("must be greater than 0 and at most 100"))
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load from explicit key/value pairs, using the same names as the environment.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn timing(&self) -> Timing {
        Timing {
            upload_tick: Duration::from_millis(self.upload_tick_ms),
            processing_tick: Duration::from_millis(self.processing_tick_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            upload_max_delta: self.upload_max_delta,
            processing_max_delta: self.processing_max_delta,
        }
    }

    pub fn policy(&self) -> ValidationPolicy {
        ValidationPolicy::new(self.max_file_bytes)
    }

    /// Per-document random increments, reproducible when a seed is set.
    pub fn delta_streams(&self) -> Box<dyn DeltaStreams> {
        match self.rng_seed {
            Some(seed) => Box::new(RandomStreams::seeded(seed)),
            None => Box::new(RandomStreams::from_entropy()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] garde::Report),
}
