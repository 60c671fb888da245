//! Pipeline configuration module.
//!
//! Contains the runtime configuration: the seed bound, default request
//! parameters, and settings for the built-in synthetic engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::synthetic::DEFAULT_IMAGE_SIZE;
use crate::error::{PipelineError, Result};
use crate::generation::DEFAULT_MAX_SEED;
use crate::types::{GenerationDefaults, Scheduler};

/// Largest accepted synthetic image edge, in pixels.
pub const MAX_IMAGE_SIZE: u32 = 4096;

/// Runtime configuration for the pipeline.
///
/// This configuration is typically loaded from environment variables and
/// then overridden by command-line arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound for randomly drawn seeds.
    pub max_seed: u32,

    /// Defaults for request fields the caller leaves unset.
    pub defaults: GenerationDefaults,

    /// Edge length of images produced by the synthetic engine.
    pub image_size: u32,

    /// Artificial per-step delay for the synthetic engine, in milliseconds.
    pub step_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_seed: DEFAULT_MAX_SEED,
            defaults: GenerationDefaults::default(),
            image_size: DEFAULT_IMAGE_SIZE,
            step_delay_ms: 0,
        }
    }
}

impl PipelineConfig {
    /// Creates a new PipelineConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a PipelineConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `DIFFUSION_MAX_SEED` - Upper bound for random seeds
    /// - `DIFFUSION_STEPS` - Default number of denoising steps
    /// - `DIFFUSION_GUIDANCE` - Default guidance scale
    /// - `DIFFUSION_SCHEDULER` - Default scheduler (pndm, dpm_solver_multistep)
    /// - `DIFFUSION_DISABLE_SAFETY` - Skip the safety checker (true/false, 1/0)
    /// - `DIFFUSION_IMAGE_SIZE` - Synthetic engine image size
    /// - `DIFFUSION_STEP_DELAY_MS` - Synthetic engine per-step delay
    ///
    /// Falls back to defaults for unset or unparsable variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    ///
    /// Same rules as [`from_env`](Self::from_env), without touching the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(max_seed) = lookup("DIFFUSION_MAX_SEED").and_then(|s| s.parse().ok()) {
            config.max_seed = max_seed;
        }

        if let Some(steps) = lookup("DIFFUSION_STEPS").and_then(|s| s.parse::<u32>().ok()) {
            if steps > 0 {
                config.defaults.step_count = steps;
            }
        }

        if let Some(guidance) = lookup("DIFFUSION_GUIDANCE").and_then(|s| s.parse::<f32>().ok())
        {
            if guidance.is_finite() {
                config.defaults.guidance_scale = guidance;
            }
        }

        if let Some(scheduler) = lookup("DIFFUSION_SCHEDULER").and_then(|s| Scheduler::parse(&s)) {
            config.defaults.scheduler = scheduler;
        }

        if let Some(disable) = lookup("DIFFUSION_DISABLE_SAFETY").and_then(|s| parse_flag(&s)) {
            config.defaults.disable_safety = disable;
        }

        if let Some(size) = lookup("DIFFUSION_IMAGE_SIZE").and_then(|s| s.parse::<u32>().ok()) {
            if (1..=MAX_IMAGE_SIZE).contains(&size) {
                config.image_size = size;
            }
        }

        if let Some(delay) = lookup("DIFFUSION_STEP_DELAY_MS").and_then(|s| s.parse().ok()) {
            config.step_delay_ms = delay;
        }

        config
    }

    /// Returns the synthetic engine's per-step delay.
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.defaults.step_count == 0 {
            return Err(PipelineError::InvalidConfig(
                "default step count must be > 0".to_string(),
            ));
        }

        if !self.defaults.guidance_scale.is_finite() {
            return Err(PipelineError::InvalidConfig(format!(
                "default guidance scale must be finite, got {}",
                self.defaults.guidance_scale
            )));
        }

        if !(1..=MAX_IMAGE_SIZE).contains(&self.image_size) {
            return Err(PipelineError::InvalidConfig(format!(
                "image size out of range: {} (1-{})",
                self.image_size, MAX_IMAGE_SIZE
            )));
        }

        Ok(())
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
