//! CLI argument parser.
//!
//! Provides the command-line interface for running a single generation
//! against the synthetic engine and watching its progress.

use clap::{Parser, ValueEnum};

use crate::config::{PipelineConfig, MAX_IMAGE_SIZE};
use crate::error::{PipelineError, Result};
use crate::types::{GenerationRequest, Scheduler};

/// Available scheduler types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchedulerArg {
    /// PNDM: pseudo numerical methods, steady noise removal
    Pndm,
    /// DPM-Solver++ multistep: removes most noise in early steps
    Dpm,
}

impl From<SchedulerArg> for Scheduler {
    fn from(arg: SchedulerArg) -> Self {
        match arg {
            SchedulerArg::Pndm => Scheduler::Pndm,
            SchedulerArg::Dpm => Scheduler::DpmSolverMultistep,
        }
    }
}

/// diffusion-pipeline: generate one image and stream step progress
#[derive(Parser, Debug)]
#[command(name = "diffusion-pipeline")]
#[command(about = "Generate one image from a text prompt with live step progress")]
#[command(version)]
pub struct Cli {
    /// Text prompt describing the image to generate
    #[arg(short, long)]
    pub prompt: String,

    /// Concepts to steer the image away from
    #[arg(short, long, default_value = "")]
    pub negative_prompt: String,

    /// Number of denoising steps (defaults to DIFFUSION_STEPS or 50)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub steps: Option<u32>,

    /// Guidance scale (defaults to DIFFUSION_GUIDANCE or 7.5)
    #[arg(short, long)]
    pub guidance: Option<f32>,

    /// Random seed for reproducible generation
    #[arg(short, long)]
    pub seed: Option<u32>,

    /// Upper bound for randomly drawn seeds
    #[arg(long)]
    pub max_seed: Option<u32>,

    /// Scheduler for the denoising loop
    #[arg(long, value_enum)]
    pub scheduler: Option<SchedulerArg>,

    /// Skip the engine's safety checker
    #[arg(long)]
    pub disable_safety: bool,

    /// Width and height of the generated image in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_IMAGE_SIZE as i64))]
    pub size: Option<u32>,

    /// Artificial delay per step in milliseconds
    #[arg(long)]
    pub step_delay_ms: Option<u64>,

    /// Print the result summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Applies command-line overrides on top of `config`.
    pub fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(max_seed) = self.max_seed {
            config.max_seed = max_seed;
        }
        if let Some(steps) = self.steps {
            config.defaults.step_count = steps;
        }
        if let Some(guidance) = self.guidance {
            config.defaults.guidance_scale = guidance;
        }
        if let Some(scheduler) = self.scheduler {
            config.defaults.scheduler = scheduler.into();
        }
        if self.disable_safety {
            config.defaults.disable_safety = true;
        }
        if let Some(size) = self.size {
            config.image_size = size;
        }
        if let Some(delay) = self.step_delay_ms {
            config.step_delay_ms = delay;
        }
        config
    }

    /// Builds the generation request described by the arguments.
    ///
    /// Fails with [`PipelineError::InvalidRequest`] when the request does not
    /// pass [`GenerationRequest::validate`].
    pub fn request(&self, config: &PipelineConfig) -> Result<GenerationRequest> {
        let mut request = GenerationRequest::with_defaults(self.prompt.clone(), &config.defaults)
            .negative_prompt(self.negative_prompt.clone());
        if let Some(seed) = self.seed {
            request = request.seed(seed);
        }

        match request.validate() {
            Some(reason) => Err(PipelineError::InvalidRequest(reason)),
            None => Ok(request),
        }
    }
}
