//! Tunable parameters for detection, generation and scheduling.
//!
//! Every section has defaults matching the behaviour described in the crate
//! docs, and the whole tree round-trips through JSON so a tuned setup can be
//! saved next to a project and handed to the command-line tools.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SyncError};

/// Beat detector parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Floor for the adaptive threshold (normalized energy)
    pub min_threshold: f32,
    /// Length of one energy window in seconds
    pub window_seconds: f32,
    /// Low-pass cutoff applied before energy analysis (Hz)
    pub low_pass_hz: f32,
    /// Number of past windows in the rolling average
    pub history_len: usize,
    /// Multiplier applied to the rolling average to form the threshold
    pub threshold_factor: f32,
    /// Fraction of the threshold energy must fall under to re-arm the detector
    pub release_factor: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_threshold: 0.15,
            window_seconds: 0.35,
            low_pass_hz: 150.0,
            history_len: 20,
            threshold_factor: 1.3,
            release_factor: 0.8,
        }
    }
}

/// Runtime matching parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Max distance between clock and sync point for the point to be due
    pub tolerance_seconds: f64,
    /// How long a fired point stays blocked
    pub cooldown_ms: u64,
    /// Global scale applied to every sync point intensity
    pub intensity_multiplier: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tolerance_seconds: 0.05,
            cooldown_ms: 500,
            intensity_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub default_duration: f32,
    pub strong_intensity: f32,
    pub weak_intensity: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            default_duration: 0.3,
            strong_intensity: 1.0,
            weak_intensity: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorConfig {
    /// Mean-square to energy scale; 2.0 maps a full-scale sine to 1.0
    pub energy_scale: f32,
    pub ideal_tempo: f32,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            energy_scale: 2.0,
            ideal_tempo: 115.0,
        }
    }
}

/// Top-level engine configuration.
///
/// # Example
///
/// ```
/// use beat_sync::EngineConfig;
///
/// let mut config = EngineConfig::default();
/// config.scheduler.intensity_multiplier = 1.5;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub detector: DetectorConfig,
    pub scheduler: SchedulerConfig,
    pub generator: GeneratorConfig,
    pub descriptors: DescriptorConfig,
    /// Generate sync points as soon as a sound and elements are available
    pub auto_generate: bool,
}

impl EngineConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        let d = &self.detector;
        if d.window_seconds <= 0.0 {
            return Err(SyncError::Config(
                "window_seconds must be positive".to_string(),
            ));
        }
        if d.low_pass_hz <= 0.0 {
            return Err(SyncError::Config("low_pass_hz must be positive".to_string()));
        }
        if d.min_threshold < 0.0 {
            return Err(SyncError::Config(
                "min_threshold must not be negative".to_string(),
            ));
        }
        if d.history_len == 0 {
            return Err(SyncError::Config("history_len must be positive".to_string()));
        }
        if !(0.0..1.0).contains(&d.release_factor) {
            return Err(SyncError::Config(
                "release_factor must be in [0, 1)".to_string(),
            ));
        }
        if d.threshold_factor <= 0.0 {
            return Err(SyncError::Config(
                "threshold_factor must be positive".to_string(),
            ));
        }

        let s = &self.scheduler;
        if s.tolerance_seconds <= 0.0 {
            return Err(SyncError::Config(
                "tolerance_seconds must be positive".to_string(),
            ));
        }
        if s.cooldown_ms == 0 {
            return Err(SyncError::Config("cooldown_ms must be positive".to_string()));
        }
        if s.intensity_multiplier < 0.0 {
            return Err(SyncError::Config(
                "intensity_multiplier must not be negative".to_string(),
            ));
        }

        if self.generator.default_duration <= 0.0 {
            return Err(SyncError::Config(
                "default_duration must be positive".to_string(),
            ));
        }
        if self.descriptors.energy_scale <= 0.0 {
            return Err(SyncError::Config("energy_scale must be positive".to_string()));
        }
        Ok(())
    }
}
