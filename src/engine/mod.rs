//! Inference engine boundary.
//!
//! The pipeline drives any type implementing [`InferenceEngine`]: one
//! blocking call that runs the whole denoising loop and reports each step
//! through a callback.
//!
//! - [`synthetic`]: Seeded reference engine producing RGBA images

pub mod synthetic;

#[cfg(test)]
pub(crate) mod testing;

use crate::types::{GenerationRequest, Scheduler};

pub use synthetic::{StepProgress, SyntheticEngine, SyntheticError};

/// Parameters forwarded to the engine for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineParams {
    /// Text description of the desired image.
    pub prompt: String,
    /// Concepts to steer away from.
    pub negative_prompt: String,
    /// Number of images to produce. The pipeline always asks for one.
    pub image_count: u32,
    /// Number of denoising steps.
    pub step_count: u32,
    /// Resolved seed.
    pub seed: u32,
    /// Classifier-free guidance scale.
    pub guidance_scale: f32,
    /// Skip the safety checker.
    pub disable_safety: bool,
    /// Noise scheduler.
    pub scheduler: Scheduler,
}

impl EngineParams {
    /// Builds engine parameters for a single image from a request and its
    /// resolved seed.
    pub fn single_image(request: GenerationRequest, seed: u32) -> Self {
        Self {
            prompt: request.prompt,
            negative_prompt: request.negative_prompt,
            image_count: 1,
            step_count: request.step_count,
            seed,
            guidance_scale: request.guidance_scale,
            disable_safety: request.disable_safety,
            scheduler: request.scheduler,
        }
    }
}

/// A blocking image-generation engine.
///
/// Implementations run the full denoising loop inside
/// [`generate_images`](InferenceEngine::generate_images) and call `on_step`
/// once per step, on whatever thread they like. Returning `false` from
/// `on_step` asks the engine to stop early.
pub trait InferenceEngine {
    /// Per-step progress snapshot. Opaque to the pipeline.
    type Progress: Clone + Send + 'static;

    /// Decoded image type.
    type Image;

    /// Engine-specific failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs one generation and returns one slot per requested image.
    ///
    /// A slot is `None` when the engine could not produce that image, for
    /// example because a safety checker filtered it.
    fn generate_images(
        &mut self,
        params: &EngineParams,
        on_step: &mut dyn FnMut(Self::Progress) -> bool,
    ) -> Result<Vec<Option<Self::Image>>, Self::Error>;
}
