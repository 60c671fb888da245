//! Background generation on a worker thread.
//!
//! `Pipeline::generate` blocks for the whole denoising run. Callers that
//! must stay responsive move the pipeline onto a worker thread with
//! [`Pipeline::spawn`] and watch its progress channel from their own
//! thread.

use std::thread::{self, JoinHandle};

use crate::engine::InferenceEngine;
use crate::error::{PipelineError, Result};
use crate::types::{GenerationRequest, GenerationResult};

use super::pipeline::Pipeline;

/// Pipeline handed back by a finished worker, with the generation outcome.
pub type Finished<E> = (
    Pipeline<E>,
    Result<GenerationResult<<E as InferenceEngine>::Image>>,
);

/// Handle to a generation running on a worker thread.
pub struct BackgroundGeneration<E: InferenceEngine> {
    handle: JoinHandle<Finished<E>>,
}

impl<E> Pipeline<E>
where
    E: InferenceEngine + Send + 'static,
    E::Image: Send + 'static,
{
    /// Moves the pipeline to a worker thread and starts generating.
    ///
    /// Clone or subscribe to [`progress`](Pipeline::progress) before
    /// calling this to observe the run.
    pub fn spawn(mut self, request: GenerationRequest) -> BackgroundGeneration<E> {
        let handle = thread::spawn(move || {
            let outcome = self.generate(request);
            (self, outcome)
        });

        BackgroundGeneration { handle }
    }
}

impl<E: InferenceEngine> BackgroundGeneration<E> {
    /// Returns true once the worker thread has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker and returns the pipeline with the outcome.
    ///
    /// Fails with [`PipelineError::WorkerPanicked`] if the worker panicked,
    /// in which case the pipeline is lost.
    pub fn join(self) -> Result<Finished<E>> {
        self.handle.join().map_err(|_| {
            tracing::error!("generation worker panicked");
            PipelineError::WorkerPanicked
        })
    }
}
