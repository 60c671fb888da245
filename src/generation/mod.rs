//! Image generation module.
//!
//! Provides the generation pipeline and its background runner.

pub mod background;
pub mod pipeline;

// Re-export commonly used items
pub use background::{BackgroundGeneration, Finished};
pub use pipeline::{resolve_seed, Pipeline, DEFAULT_MAX_SEED};
