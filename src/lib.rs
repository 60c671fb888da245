//! diffusion-pipeline: single-image diffusion orchestration.
//!
//! Wraps a blocking, step-callback driven inference engine. Each call
//! resolves parameters and the seed, runs the engine, republishes every
//! step snapshot through a progress channel that any number of observers
//! can follow, and returns the image with its seed and wall-clock time.
//!
//! # Modules
//!
//! - [`progress`]: Single-slot progress observable (ProgressChannel, Subscription)
//! - [`engine`]: Inference engine trait and the synthetic reference engine
//! - [`generation`]: Pipeline and background runner
//! - [`types`]: Request and result types (GenerationRequest, GenerationResult)
//! - [`config`]: Runtime configuration (PipelineConfig)
//! - [`error`]: Error types and codes (PipelineError, ErrorCode)
//!
//! # Example
//!
//! ```rust,ignore
//! use diffusion_pipeline::{GenerationRequest, Pipeline, SyntheticEngine};
//!
//! let mut pipeline = Pipeline::new(SyntheticEngine::default());
//! let progress = pipeline.progress().subscribe();
//!
//! let result = pipeline.generate(
//!     GenerationRequest::new("a lighthouse at dusk").step_count(30),
//! )?;
//!
//! for step in progress.drain() {
//!     println!("step {}/{}", step.step, step.step_count);
//! }
//! println!("seed {} in {:?}", result.last_seed, result.interval);
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod progress;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use config::PipelineConfig;
pub use engine::{EngineParams, InferenceEngine, StepProgress, SyntheticEngine};
pub use error::{ErrorCode, PipelineError, Result};
pub use generation::{BackgroundGeneration, Pipeline};
pub use progress::{ProgressChannel, Subscription};
pub use types::{GenerationRequest, GenerationResult, GenerationSummary, Scheduler};
