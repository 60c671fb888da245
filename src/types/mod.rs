//! Core types for the diffusion pipeline.
//!
//! This module re-exports the data types passed into and out of a generation:
//! - [`GenerationRequest`]: Prompt and parameters for one image
//! - [`GenerationResult`]: Image, seed and timing of a finished generation
//! - [`Scheduler`]: Noise scheduler selection forwarded to the engine

mod request;
mod result;
mod scheduler;

// Re-export all types at the module level
pub use request::{
    GenerationDefaults, GenerationRequest, DEFAULT_GUIDANCE_SCALE, DEFAULT_STEP_COUNT,
};
pub use result::{GenerationResult, GenerationSummary};
pub use scheduler::Scheduler;
