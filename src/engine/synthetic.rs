//! Synthetic reference engine.
//!
//! Produces images without a model: the latent starts as seeded Gaussian
//! noise and is denoised toward a flat target colour derived from the
//! prompt. The result is fully determined by the parameters, which makes
//! the engine useful for exercising the pipeline end to end.

use std::thread;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use thiserror::Error;

use crate::types::Scheduler;

use super::{EngineParams, InferenceEngine};

/// Default width and height of generated images.
pub const DEFAULT_IMAGE_SIZE: u32 = 64;

const CHANNELS: usize = 3;

/// Progress snapshot emitted once per denoising step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepProgress {
    /// Steps completed so far (1-based).
    pub step: u32,
    /// Total steps in this run.
    pub step_count: u32,
    /// Remaining noise level after this step (1.0 = pure noise).
    pub sigma: f32,
    /// Seed of the run.
    pub seed: u32,
}

impl StepProgress {
    /// Fraction of the run completed, from 0.0 to 1.0.
    pub fn fraction(&self) -> f32 {
        if self.step_count == 0 {
            return 0.0;
        }
        self.step as f32 / self.step_count as f32
    }
}

/// Errors raised by the synthetic engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntheticError {
    #[error("image count must be at least 1")]
    NoImages,

    #[error("step count must be at least 1")]
    NoSteps,

    #[error("image size must be non-zero, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
}

/// Seeded engine that denoises toward a prompt-derived colour field.
#[derive(Debug, Clone)]
pub struct SyntheticEngine {
    width: u32,
    height: u32,
    step_delay: Duration,
}

impl Default for SyntheticEngine {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_SIZE, DEFAULT_IMAGE_SIZE)
    }
}

impl SyntheticEngine {
    /// Creates an engine producing `width` x `height` images.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            step_delay: Duration::ZERO,
        }
    }

    /// Sleeps for `delay` on every step, to mimic a slow accelerator.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Returns the output image dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Computes the target colour field for the given prompts.
    ///
    /// Prompt and negative prompt each map to a colour; the two are mixed
    /// the way classifier-free guidance mixes conditional and unconditional
    /// predictions.
    fn target(&self, params: &EngineParams) -> Vec<f32> {
        let cond = prompt_color(&params.prompt);
        let uncond = prompt_color(&params.negative_prompt);
        let guided: Vec<f32> = cond
            .iter()
            .zip(uncond.iter())
            .map(|(c, u)| (u + params.guidance_scale * (c - u)).clamp(-1.0, 1.0))
            .collect();

        let mut target = Vec::with_capacity(self.pixel_count() * CHANNELS);
        for _y in 0..self.height {
            for x in 0..self.width {
                // Horizontal shading so the image is not a single flat colour.
                let shade = 0.5 + 0.5 * (x as f32 + 0.5) / self.width as f32;
                target.extend(guided.iter().map(|c| c * shade));
            }
        }
        target
    }

    fn decode(&self, target: &[f32], noise: &[f32], sigma: f32) -> RgbaImage {
        let width = self.width as usize;
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let base = (y as usize * width + x as usize) * CHANNELS;
            let channel = |c: usize| to_u8(target[base + c] + sigma * noise[base + c]);
            Rgba([channel(0), channel(1), channel(2), u8::MAX])
        })
    }
}

impl InferenceEngine for SyntheticEngine {
    type Progress = StepProgress;
    type Image = RgbaImage;
    type Error = SyntheticError;

    fn generate_images(
        &mut self,
        params: &EngineParams,
        on_step: &mut dyn FnMut(StepProgress) -> bool,
    ) -> Result<Vec<Option<RgbaImage>>, SyntheticError> {
        if params.image_count == 0 {
            return Err(SyntheticError::NoImages);
        }
        if params.step_count == 0 {
            return Err(SyntheticError::NoSteps);
        }
        if self.width == 0 || self.height == 0 {
            return Err(SyntheticError::EmptyImage {
                width: self.width,
                height: self.height,
            });
        }

        tracing::debug!(
            width = self.width,
            height = self.height,
            images = params.image_count,
            scheduler = %params.scheduler,
            "synthetic engine starting"
        );

        // No safety checker here, so `disable_safety` has nothing to skip.
        let target = self.target(params);
        let noises: Vec<Vec<f32>> = (0..params.image_count)
            .map(|index| initial_noise(params.seed.wrapping_add(index), target.len()))
            .collect();

        let mut sigma = 1.0;
        for step in 1..=params.step_count {
            if !self.step_delay.is_zero() {
                thread::sleep(self.step_delay);
            }

            sigma = noise_level(params.scheduler, step, params.step_count);
            let keep_going = on_step(StepProgress {
                step,
                step_count: params.step_count,
                sigma,
                seed: params.seed,
            });

            if !keep_going {
                tracing::debug!(step, "synthetic engine stopped early");
                break;
            }
        }

        Ok(noises
            .iter()
            .map(|noise| Some(self.decode(&target, noise, sigma)))
            .collect())
    }
}

/// Noise level remaining after `step` of `step_count`.
fn noise_level(scheduler: Scheduler, step: u32, step_count: u32) -> f32 {
    let remaining = 1.0 - step as f32 / step_count as f32;
    match scheduler {
        Scheduler::Pndm => remaining,
        // Multistep solvers remove most of the noise early.
        Scheduler::DpmSolverMultistep => remaining * remaining,
    }
}

/// Seeded standard-normal noise of the given length.
fn initial_noise(seed: u32, len: usize) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
    (0..len).map(|_| StandardNormal.sample(&mut rng)).collect()
}

/// Maps a prompt to an RGB colour in [-1, 1] using FNV-1a.
fn prompt_color(prompt: &str) -> [f32; CHANNELS] {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in prompt.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }

    let bytes = hash.to_le_bytes();
    [bytes[0], bytes[1], bytes[2]].map(|b| b as f32 / 127.5 - 1.0)
}

fn to_u8(value: f32) -> u8 {
    ((value.clamp(-1.0, 1.0) + 1.0) * 127.5).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: u32, steps: u32) -> EngineParams {
        EngineParams {
            prompt: "a red barn in snow".to_string(),
            negative_prompt: String::new(),
            image_count: 1,
            step_count: steps,
            seed,
            guidance_scale: 7.5,
            disable_safety: false,
            scheduler: Scheduler::DpmSolverMultistep,
        }
    }

    fn run(
        engine: &mut SyntheticEngine,
        params: &EngineParams,
    ) -> (Vec<Option<RgbaImage>>, Vec<StepProgress>) {
        let mut steps = Vec::new();
        let images = engine
            .generate_images(params, &mut |progress| {
                steps.push(progress);
                true
            })
            .unwrap();
        (images, steps)
    }

    #[test]
    fn emits_one_snapshot_per_step_in_order() {
        let mut engine = SyntheticEngine::new(8, 8);
        let (_, steps) = run(&mut engine, &params(1, 10));

        assert_eq!(steps.len(), 10);
        for (index, progress) in steps.iter().enumerate() {
            assert_eq!(progress.step, index as u32 + 1);
            assert_eq!(progress.step_count, 10);
        }
        assert_eq!(steps.last().unwrap().sigma, 0.0);
        assert_eq!(steps.last().unwrap().fraction(), 1.0);
    }

    #[test]
    fn same_seed_same_image() {
        let mut engine = SyntheticEngine::new(8, 8);
        let mut params = params(5, 10);
        let (first, _) = run(&mut engine, &params);
        let (second, _) = run(&mut engine, &params);
        assert_eq!(first, second);

        // Fully denoised output no longer depends on the seed.
        params.seed = 6;
        let (third, _) = run(&mut engine, &params);
        assert_eq!(first, third);
    }

    #[test]
    fn stop_signal_returns_noisy_image() {
        let mut engine = SyntheticEngine::new(8, 8);
        let params = params(11, 10);

        let (finished, _) = run(&mut engine, &params);

        let mut calls = 0;
        let stopped = engine
            .generate_images(&params, &mut |_| {
                calls += 1;
                calls < 3
            })
            .unwrap();

        assert_eq!(calls, 3);
        assert_eq!(stopped.len(), 1);
        assert!(stopped[0].is_some());
        assert_ne!(stopped, finished);
    }

    #[test]
    fn returns_one_slot_per_requested_image() {
        let mut engine = SyntheticEngine::new(4, 4);
        let mut params = params(3, 2);
        params.image_count = 3;

        let (images, steps) = run(&mut engine, &params);
        assert_eq!(images.len(), 3);
        assert!(images.iter().all(Option::is_some));
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn output_has_requested_dimensions() {
        let mut engine = SyntheticEngine::new(16, 9);
        let (images, _) = run(&mut engine, &params(0, 1));
        let image = images[0].as_ref().unwrap();
        assert_eq!(image.dimensions(), (16, 9));
        assert_eq!(engine.dimensions(), (16, 9));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut engine = SyntheticEngine::new(4, 4);

        let mut no_steps = params(0, 0);
        let result = engine.generate_images(&no_steps, &mut |_| true);
        assert_eq!(result.unwrap_err(), SyntheticError::NoSteps);

        no_steps.step_count = 1;
        no_steps.image_count = 0;
        let result = engine.generate_images(&no_steps, &mut |_| true);
        assert_eq!(result.unwrap_err(), SyntheticError::NoImages);

        let mut empty = SyntheticEngine::new(0, 4);
        let result = empty.generate_images(&params(0, 1), &mut |_| true);
        assert!(matches!(result, Err(SyntheticError::EmptyImage { .. })));
    }

    #[test]
    fn noise_level_reaches_zero() {
        for scheduler in [Scheduler::Pndm, Scheduler::DpmSolverMultistep] {
            assert_eq!(noise_level(scheduler, 10, 10), 0.0);
            assert!(noise_level(scheduler, 1, 10) > noise_level(scheduler, 5, 10));
        }
        assert!(
            noise_level(Scheduler::DpmSolverMultistep, 5, 10)
                < noise_level(Scheduler::Pndm, 5, 10)
        );
    }

    #[test]
    fn prompt_color_in_range() {
        for prompt in ["", "cat", "a very long prompt about mountains"] {
            assert!(prompt_color(prompt).iter().all(|c| (-1.0..=1.0).contains(c)));
        }
        assert_ne!(prompt_color("cat"), prompt_color("dog"));
    }
}
