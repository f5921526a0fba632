//! Projected Newton iteration for bound-constrained problems.
//!
//! # Algorithm
//!
//! Each iteration scales the negative gradient by the inverse diagonal of the
//! Hessian, clips the trial point onto the variable bounds, and backtracks
//! along that projected path until the Armijo condition holds. Curvature
//! that is not positive falls back to a unit scale, so the method degrades
//! to projected gradient descent rather than failing.
//!
//! The optimality measure is `max_i |P(x - ∇f)_i - x_i|`, where `P` clips
//! onto the bounds. It vanishes exactly at a stationary point of the
//! bound-constrained problem.
//!
//! # Limitations
//!
//! - **Bounds only**: problems with general constraints are rejected with
//!   [`Error::Unsupported`] before any evaluation
//! - **Diagonal scaling**: off-diagonal Hessian entries are ignored, so
//!   strongly coupled problems converge linearly
//!
//! # Observer Events
//!
//! One [`Iteration`] is emitted for the starting point and one per accepted
//! step. Returning [`Action::StopEarly`] ends the solve with
//! [`Status::UserRequestedStop`].
//!
//! [`Iteration`]: tnlp_core::Iteration
//! [`Action::StopEarly`]: tnlp_core::Action::StopEarly
//! [`Status::UserRequestedStop`]: tnlp_core::Status::UserRequestedStop

mod config;
mod evaluator;
mod search;

#[cfg(test)]
mod tests;

pub use config::{Config, OPTIONS};

use tnlp_core::{Action, Iteration, NlpProblem, Observer, Solution};

use crate::{
    Error,
    backend::Backend,
    contract::{BoundInfinity, CheckedProblem},
    options::{ConfigError, Options},
};

use search::search;

const NAME: &str = "projected-newton";

/// The built-in backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectedNewton;

impl Backend for ProjectedNewton {
    type Config = Config;

    fn name(&self) -> &'static str {
        NAME
    }

    fn configure(&self, options: &Options) -> Result<Config, ConfigError> {
        Config::from_options(options)
    }

    fn bound_infinity(&self, config: &Config) -> BoundInfinity {
        config.bound_infinity()
    }

    fn solve<P, Obs>(
        &self,
        config: &Config,
        problem: &CheckedProblem<'_, P>,
        observer: Obs,
    ) -> Result<Solution, Error>
    where
        P: NlpProblem,
        Obs: Observer<Iteration, Action>,
    {
        if problem.num_constraints() > 0 {
            return Err(Error::Unsupported {
                backend: NAME,
                reason: "general constraints are not supported",
            });
        }
        search(config, problem, observer)
    }
}
