// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Publish engine configuration.
//!
//! Supports both programmatic and file-based configuration.
//!
//! ```toml
//! pipeline_depth = 5
//! channel_poll_interval_ms = 100
//! initial_max_in_flight = 1000
//! min_timeout_hint_ms = 0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Publish engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Poll requests issued back-to-back when the pipeline is (re)filled.
    #[serde(default = "default_pipeline_depth")]
    pub pipeline_depth: u32,

    /// Retry interval while the channel is unusable (milliseconds).
    #[serde(default = "default_channel_poll_interval_ms")]
    pub channel_poll_interval_ms: u64,

    /// In-flight cap before the server pushes back.
    #[serde(default = "default_initial_max_in_flight")]
    pub initial_max_in_flight: u32,

    /// Floor for the acknowledgement-timeout hint (milliseconds).
    #[serde(default)]
    pub min_timeout_hint_ms: u32,
}

fn default_pipeline_depth() -> u32 {
    5
}

fn default_channel_poll_interval_ms() -> u64 {
    100
}

fn default_initial_max_in_flight() -> u32 {
    1000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pipeline_depth: default_pipeline_depth(),
            channel_poll_interval_ms: default_channel_poll_interval_ms(),
            initial_max_in_flight: default_initial_max_in_flight(),
            min_timeout_hint_ms: 0,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the pipeline depth.
    #[must_use]
    pub fn pipeline_depth(mut self, depth: u32) -> Self {
        self.pipeline_depth = depth;
        self
    }

    /// Set the channel readiness poll interval.
    #[must_use]
    pub fn channel_poll_interval(mut self, interval: Duration) -> Self {
        self.channel_poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the initial in-flight cap.
    #[must_use]
    pub fn initial_max_in_flight(mut self, cap: u32) -> Self {
        self.initial_max_in_flight = cap;
        self
    }

    /// Set the timeout hint floor.
    #[must_use]
    pub fn min_timeout_hint_ms(mut self, hint_ms: u32) -> Self {
        self.min_timeout_hint_ms = hint_ms;
        self
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.channel_poll_interval_ms)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline_depth == 0 {
            return Err(ConfigError::Invalid(
                "pipeline_depth must be at least 1".into(),
            ));
        }
        if self.initial_max_in_flight == 0 {
            return Err(ConfigError::Invalid(
                "initial_max_in_flight must be at least 1".into(),
            ));
        }
        if self.channel_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "channel_poll_interval_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
