//! Generation pipeline.
//!
//! Resolves request parameters, runs the engine's blocking call, relays
//! every step into the pipeline's [`ProgressChannel`], and packages the
//! produced image together with the seed and timing.

use std::time::Instant;

use rand::Rng;

use crate::engine::{EngineParams, InferenceEngine};
use crate::error::{PipelineError, Result};
use crate::progress::ProgressChannel;
use crate::types::{GenerationRequest, GenerationResult};

/// Default upper bound for randomly drawn seeds.
pub const DEFAULT_MAX_SEED: u32 = u32::MAX;

/// Drives one inference engine, one image at a time.
///
/// `generate` takes `&mut self`, so a pipeline never runs two generations
/// at once. Progress from the most recent call stays in
/// [`progress`](Pipeline::progress) until the next update or an explicit
/// reset.
pub struct Pipeline<E: InferenceEngine> {
    engine: E,
    max_seed: u32,
    progress: ProgressChannel<E::Progress>,
}

impl<E: InferenceEngine> Pipeline<E> {
    /// Creates a pipeline drawing random seeds from the full `u32` range.
    pub fn new(engine: E) -> Self {
        Self::with_max_seed(engine, DEFAULT_MAX_SEED)
    }

    /// Creates a pipeline drawing random seeds from `[0, max_seed]`.
    pub fn with_max_seed(engine: E, max_seed: u32) -> Self {
        Self {
            engine,
            max_seed,
            progress: ProgressChannel::new(),
        }
    }

    /// Returns the upper bound for randomly drawn seeds.
    pub fn max_seed(&self) -> u32 {
        self.max_seed
    }

    /// Returns the progress channel fed by generation steps.
    pub fn progress(&self) -> &ProgressChannel<E::Progress> {
        &self.progress
    }

    /// Returns a reference to the engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns a mutable reference to the engine.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Returns `seed` if given, otherwise a uniform draw from `[0, max_seed]`.
    pub fn resolve_seed(&self, seed: Option<u32>) -> u32 {
        resolve_seed(seed, self.max_seed, &mut rand::thread_rng())
    }

    /// Generates one image.
    ///
    /// Blocks until the engine finishes. Each step snapshot is published to
    /// the progress channel before the engine continues. Fails with
    /// [`PipelineError::Engine`] if the engine fails and with
    /// [`PipelineError::EmptyResult`] if it returns without an image.
    ///
    /// Request fields reach the engine as given. Use
    /// [`GenerationRequest::validate`] to screen requests up front.
    pub fn generate(&mut self, request: GenerationRequest) -> Result<GenerationResult<E::Image>> {
        let seed = self.resolve_seed(request.seed);
        tracing::debug!(
            seed,
            supplied = request.seed.is_some(),
            max_seed = self.max_seed,
            "resolved seed"
        );

        let span = tracing::info_span!("generate", seed, steps = request.step_count);
        let _guard = span.enter();
        tracing::info!(
            prompt = %request.prompt,
            scheduler = %request.scheduler,
            guidance = request.guidance_scale,
            "generating image"
        );

        let params = EngineParams::single_image(request, seed);
        let progress = &self.progress;
        let started = Instant::now();

        let images = self.engine.generate_images(&params, &mut |snapshot| {
            tracing::trace!("step reported");
            progress.update(snapshot);
            true
        });
        let interval = started.elapsed();

        let images = images.map_err(|err| {
            tracing::warn!(error = %err, ?interval, "engine failed");
            PipelineError::engine(err)
        })?;

        let slots = images.len();
        if slots > 1 {
            tracing::debug!(slots, "engine returned extra slots, keeping the first image");
        }

        let image = images.into_iter().flatten().next().ok_or_else(|| {
            tracing::warn!(slots, ?interval, "engine returned no image");
            PipelineError::EmptyResult { seed, slots }
        })?;

        tracing::info!(interval_sec = interval.as_secs_f32(), "generation complete");

        Ok(GenerationResult {
            image,
            last_seed: seed,
            interval,
        })
    }
}

/// Returns `seed` verbatim if present, otherwise draws from `[0, max_seed]`.
///
/// A supplied seed is never clamped, even when it exceeds `max_seed`.
pub fn resolve_seed<R: Rng>(seed: Option<u32>, max_seed: u32, rng: &mut R) -> u32 {
    seed.unwrap_or_else(|| rng.gen_range(0..=max_seed))
}
