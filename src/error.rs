//! Error types for the diffusion pipeline.
//!
//! Defines the error codes and the error type returned by generation
//! calls, so callers can tell an engine fault apart from a contract
//! violation without string matching.

use std::fmt;

use thiserror::Error;

/// Error codes identifying the kind of failure.
///
/// These codes are stable identifiers that front ends can use to
/// programmatically handle specific error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The inference engine raised an error during generation.
    /// Trigger: invalid parameters, resource exhaustion, hardware fault.
    EngineFailure,

    /// The engine reported success but produced no image.
    /// Trigger: every result slot came back empty.
    EmptyResult,

    /// A front end rejected the request before handing it to the pipeline.
    /// Trigger: zero inference steps, non-finite guidance scale.
    InvalidRequest,

    /// Configuration values are out of range.
    /// Trigger: zero image size, zero default step count.
    InvalidConfig,

    /// The background generation thread panicked.
    /// Trigger: a panic inside the engine while running on a worker thread.
    WorkerPanicked,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::EngineFailure => "ENGINE_FAILURE",
            ErrorCode::EmptyResult => "EMPTY_RESULT",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::WorkerPanicked => "WORKER_PANICKED",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::EngineFailure => "The inference engine failed during generation",
            ErrorCode::EmptyResult => "Generation finished without producing an image",
            ErrorCode::InvalidRequest => "The generation request has invalid parameters",
            ErrorCode::InvalidConfig => "The pipeline configuration has invalid values",
            ErrorCode::WorkerPanicked => "The background generation thread panicked",
        }
    }

    /// Returns a recovery hint suggesting how to resolve this error.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCode::EngineFailure => {
                "Check the engine error for details. Reducing the step count or \
                 freeing accelerator memory usually helps with resource errors"
            }
            ErrorCode::EmptyResult => {
                "Retry with a different seed or prompt. If the safety checker is \
                 enabled it may have filtered the image"
            }
            ErrorCode::InvalidRequest => {
                "Use at least one inference step and a finite guidance scale \
                 (e.g., steps: 50, guidance: 7.5)"
            }
            ErrorCode::InvalidConfig => {
                "Check DIFFUSION_* environment variables and command-line flags \
                 for out-of-range values"
            }
            ErrorCode::WorkerPanicked => {
                "Run the generation on the calling thread to see the panic message, \
                 then report the engine failure"
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The engine's generation call failed. The original error is kept as the
    /// source and can be recovered with `downcast_ref`.
    #[error("inference engine failed")]
    Engine {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The engine returned without any usable image.
    #[error("generation produced no image (seed {seed}, {slots} empty result slot(s))")]
    EmptyResult {
        /// Seed the failed generation ran with.
        seed: u32,
        /// Number of slots the engine returned, all empty.
        slots: usize,
    },

    /// A front end rejected the request after `GenerationRequest::validate`.
    #[error("invalid generation request: {0}")]
    InvalidRequest(String),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker thread running a background generation panicked.
    #[error("background generation worker panicked")]
    WorkerPanicked,
}

impl PipelineError {
    /// Wraps an engine error, preserving it as the error source.
    pub fn engine(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Engine {
            source: Box::new(source),
        }
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::Engine { .. } => ErrorCode::EngineFailure,
            PipelineError::EmptyResult { .. } => ErrorCode::EmptyResult,
            PipelineError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            PipelineError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            PipelineError::WorkerPanicked => ErrorCode::WorkerPanicked,
        }
    }

    /// Returns the recovery hint for this error's code.
    pub fn recovery_hint(&self) -> &'static str {
        self.code().recovery_hint()
    }
}

/// Result type alias using PipelineError.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[derive(Debug, Error)]
    #[error("out of accelerator memory")]
    struct OutOfMemory;

    #[test]
    fn error_code_as_str() {
        assert_eq!(ErrorCode::EngineFailure.as_str(), "ENGINE_FAILURE");
        assert_eq!(ErrorCode::EmptyResult.as_str(), "EMPTY_RESULT");
        assert_eq!(ErrorCode::InvalidRequest.as_str(), "INVALID_REQUEST");
        assert_eq!(ErrorCode::InvalidConfig.as_str(), "INVALID_CONFIG");
        assert_eq!(ErrorCode::WorkerPanicked.as_str(), "WORKER_PANICKED");
    }

    #[test]
    fn error_code_hints_not_empty() {
        for code in [
            ErrorCode::EngineFailure,
            ErrorCode::EmptyResult,
            ErrorCode::InvalidRequest,
            ErrorCode::InvalidConfig,
            ErrorCode::WorkerPanicked,
        ] {
            assert!(!code.description().is_empty());
            assert!(!code.recovery_hint().is_empty());
        }
    }

    #[test]
    fn engine_error_keeps_source() {
        let err = PipelineError::engine(OutOfMemory);
        assert_eq!(err.code(), ErrorCode::EngineFailure);
        assert_eq!(err.to_string(), "inference engine failed");

        let source = err.source().expect("engine error has a source");
        assert!(source.downcast_ref::<OutOfMemory>().is_some());
    }

    #[test]
    fn engine_cause_appears_once_in_chain() {
        let err =
            anyhow::Error::new(PipelineError::engine(OutOfMemory)).context("generation failed");
        let rendered = format!("{:#}", err);

        assert_eq!(
            rendered,
            "generation failed: inference engine failed: out of accelerator memory"
        );
        assert_eq!(rendered.matches("out of accelerator memory").count(), 1);
    }

    #[test]
    fn recovery_hint_follows_code() {
        let err = PipelineError::InvalidRequest("bad".to_string());
        assert_eq!(err.recovery_hint(), ErrorCode::InvalidRequest.recovery_hint());
        assert_eq!(
            PipelineError::WorkerPanicked.recovery_hint(),
            ErrorCode::WorkerPanicked.recovery_hint()
        );
    }

    #[test]
    fn empty_result_display() {
        let err = PipelineError::EmptyResult { seed: 42, slots: 1 };
        assert_eq!(err.code(), ErrorCode::EmptyResult);
        assert!(err.to_string().contains("no image"));
        assert!(err.to_string().contains("42"));
    }
}
