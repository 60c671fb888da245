//! GenerationRequest type describing a single image generation.

use serde::{Deserialize, Serialize};

use super::scheduler::Scheduler;

/// Default number of denoising steps.
pub const DEFAULT_STEP_COUNT: u32 = 50;

/// Default classifier-free guidance scale.
pub const DEFAULT_GUIDANCE_SCALE: f32 = 7.5;

/// Default values applied to fields a caller leaves unset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationDefaults {
    /// Number of denoising steps.
    pub step_count: u32,
    /// Classifier-free guidance scale.
    pub guidance_scale: f32,
    /// Scheduler passed to the engine.
    pub scheduler: Scheduler,
    /// Whether the engine's safety checker is skipped.
    pub disable_safety: bool,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            step_count: DEFAULT_STEP_COUNT,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            scheduler: Scheduler::default(),
            disable_safety: false,
        }
    }
}

/// A request to generate one image from a text prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Text description of the desired image. Not length checked here.
    pub prompt: String,

    /// Concepts to steer away from. Empty by default.
    pub negative_prompt: String,

    /// Scheduler selection, interpreted only by the engine.
    pub scheduler: Scheduler,

    /// Number of denoising steps (default 50).
    pub step_count: u32,

    /// Seed for generation. If None, the pipeline draws one at random.
    pub seed: Option<u32>,

    /// Classifier-free guidance scale (default 7.5).
    pub guidance_scale: f32,

    /// Skip the engine's safety checker.
    pub disable_safety: bool,
}

impl GenerationRequest {
    /// Creates a request for `prompt` with every other field at its default.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self::with_defaults(prompt, &GenerationDefaults::default())
    }

    /// Creates a request for `prompt` using the given defaults.
    pub fn with_defaults(prompt: impl Into<String>, defaults: &GenerationDefaults) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            scheduler: defaults.scheduler,
            step_count: defaults.step_count,
            seed: None,
            guidance_scale: defaults.guidance_scale,
            disable_safety: defaults.disable_safety,
        }
    }

    /// Sets the negative prompt.
    pub fn negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = negative_prompt.into();
        self
    }

    /// Sets the scheduler.
    pub fn scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Sets the number of denoising steps.
    pub fn step_count(mut self, step_count: u32) -> Self {
        self.step_count = step_count;
        self
    }

    /// Fixes the seed, making the output reproducible.
    pub fn seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the guidance scale.
    pub fn guidance_scale(mut self, guidance_scale: f32) -> Self {
        self.guidance_scale = guidance_scale;
        self
    }

    /// Enables or disables the safety checker bypass.
    pub fn disable_safety(mut self, disable_safety: bool) -> Self {
        self.disable_safety = disable_safety;
        self
    }

    /// Validates request parameters.
    ///
    /// Returns an error message if validation fails, None otherwise. The
    /// pipeline does not call this; front ends screen requests with it.
    pub fn validate(&self) -> Option<String> {
        if self.step_count == 0 {
            return Some("Step count must be at least 1".to_string());
        }

        if !self.guidance_scale.is_finite() {
            return Some(format!(
                "Guidance scale must be finite, got {}",
                self.guidance_scale
            ));
        }

        None
    }
}
