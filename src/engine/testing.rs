//! Scripted engine for pipeline tests.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use thiserror::Error;

use super::{EngineParams, InferenceEngine};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stub engine failure: {0}")]
pub struct StubError(pub &'static str);

/// What the stub returns once its snapshots are emitted.
#[derive(Debug, Clone)]
pub enum StubOutcome {
    /// One slot per entry.
    Images(Vec<Option<&'static str>>),
    Fail(StubError),
}

type StepHook = Box<dyn FnMut(u32) + Send>;

/// Engine that replays a fixed list of snapshots.
pub struct ScriptedEngine {
    pub snapshots: Vec<u32>,
    pub outcome: StubOutcome,
    pub delay: Duration,
    /// Parameters of the most recent call.
    pub last_params: Arc<Mutex<Option<EngineParams>>>,
    /// Continuation signals returned by the callback, in order.
    pub signals: Vec<bool>,
    after_step: Option<StepHook>,
}

impl ScriptedEngine {
    pub fn new(snapshots: Vec<u32>) -> Self {
        Self {
            snapshots,
            outcome: StubOutcome::Images(vec![Some("image")]),
            delay: Duration::ZERO,
            last_params: Arc::new(Mutex::new(None)),
            signals: Vec::new(),
            after_step: None,
        }
    }

    pub fn returning(mut self, outcome: StubOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Runs `hook` with each snapshot right after it was reported.
    pub fn set_after_step(&mut self, hook: impl FnMut(u32) + Send + 'static) {
        self.after_step = Some(Box::new(hook));
    }
}

impl InferenceEngine for ScriptedEngine {
    type Progress = u32;
    type Image = &'static str;
    type Error = StubError;

    fn generate_images(
        &mut self,
        params: &EngineParams,
        on_step: &mut dyn FnMut(u32) -> bool,
    ) -> Result<Vec<Option<&'static str>>, StubError> {
        *self.last_params.lock().unwrap() = Some(params.clone());

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        for &snapshot in &self.snapshots {
            self.signals.push(on_step(snapshot));
            if let Some(hook) = self.after_step.as_mut() {
                hook(snapshot);
            }
        }

        match &self.outcome {
            StubOutcome::Images(images) => Ok(images.clone()),
            StubOutcome::Fail(err) => Err(err.clone()),
        }
    }
}
