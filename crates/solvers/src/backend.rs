use tnlp_core::{Action, Iteration, NlpProblem, Observer, Solution};

use crate::{
    Error,
    contract::{BoundInfinity, CheckedProblem},
    options::{ConfigError, Options},
};

/// An engine that drives a checked problem to a terminal state.
///
/// Backends own option validation and all numerics. They receive a
/// [`CheckedProblem`] whose static description is already known to be
/// consistent, and return the terminal [`Solution`]; finalizing the problem
/// is left to the caller.
pub trait Backend {
    /// Validated, typed configuration produced from [`Options`].
    type Config;

    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Validates `options` and builds the backend configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unknown names, wrong types or invalid
    /// values.
    fn configure(&self, options: &Options) -> Result<Self::Config, ConfigError>;

    /// Returns the thresholds beyond which bounds count as absent.
    fn bound_infinity(&self, config: &Self::Config) -> BoundInfinity;

    /// Solves the problem, reporting each iteration to `observer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the problem cannot be handled by this backend or
    /// breaks the callback contract mid-solve.
    fn solve<P, Obs>(
        &self,
        config: &Self::Config,
        problem: &CheckedProblem<'_, P>,
        observer: Obs,
    ) -> Result<Solution, Error>
    where
        P: NlpProblem,
        Obs: Observer<Iteration, Action>;
}
