use thiserror::Error;
use tnlp_core::{Solution, Status};
use tnlp_solvers::{Application, Backend, ConfigError, Error};

use crate::MinimalNlp;

/// Why a run of the example did not end with [`Status::Success`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error("initialization failed: {0}")]
    Initialize(#[from] ConfigError),

    #[error("optimization failed: {0}")]
    Optimize(#[from] Error),

    #[error("optimization failed with status: {0}")]
    Failed(Status),
}

/// Initializes `app` if needed and solves `problem` with it.
///
/// The problem is finalized whenever the backend reaches a terminal status,
/// so [`MinimalNlp::solution`] is set even when this returns
/// [`RunError::Failed`].
///
/// # Errors
///
/// Returns a [`RunError`] if initialization fails, the solve returns an
/// error, or the terminal status is anything other than success.
pub fn run<B: Backend>(
    app: &mut Application<B>,
    problem: &mut MinimalNlp,
) -> Result<Solution, RunError> {
    if !app.is_initialized() {
        app.initialize()?;
    }
    let solution = app.optimize_unobserved(problem)?;
    if solution.status.is_success() {
        Ok(solution)
    } else {
        Err(RunError::Failed(solution.status))
    }
}

/// Process exit status for the outcome of [`run`]: 0 on success, 1 otherwise.
#[must_use]
pub fn exit_status(outcome: &Result<Solution, RunError>) -> u8 {
    match outcome {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
