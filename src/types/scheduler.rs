//! Noise scheduler selection.

use serde::{Deserialize, Serialize};

/// Scheduler the engine should use for the denoising loop.
///
/// This layer never interprets the choice; it is passed straight through
/// to the inference engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Scheduler {
    /// Pseudo numerical methods for diffusion models.
    Pndm,
    /// DPM-Solver++ multistep solver. Converges in fewer steps.
    #[default]
    DpmSolverMultistep,
}

impl Scheduler {
    /// Parses a scheduler from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pndm" => Some(Scheduler::Pndm),
            "dpm" | "dpm_solver" | "dpm_solver_multistep" | "dpmsolver" => {
                Some(Scheduler::DpmSolverMultistep)
            }
            _ => None,
        }
    }

    /// Returns the string name of this scheduler.
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheduler::Pndm => "pndm",
            Scheduler::DpmSolverMultistep => "dpm_solver_multistep",
        }
    }
}

impl std::fmt::Display for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
