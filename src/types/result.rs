//! GenerationResult returned from a successful generation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Output of one successful generation call.
#[derive(Debug, Clone)]
pub struct GenerationResult<I> {
    /// The generated image.
    pub image: I,

    /// Seed the generation actually ran with.
    pub last_seed: u32,

    /// Wall-clock time of the whole call, measured by the pipeline.
    pub interval: Duration,
}

impl GenerationResult<image::RgbaImage> {
    /// Returns a serializable summary of this result.
    pub fn summary(&self) -> GenerationSummary {
        GenerationSummary {
            seed: self.last_seed,
            interval_sec: self.interval.as_secs_f64(),
            width: self.image.width(),
            height: self.image.height(),
        }
    }
}

/// Serializable description of a generated image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Seed the generation ran with.
    pub seed: u32,
    /// Wall-clock generation time in seconds.
    pub interval_sec: f64,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
}
