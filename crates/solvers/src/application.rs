use tnlp_core::{Action, Iteration, NlpProblem, Observer, Solution};

use crate::{
    Error,
    backend::Backend,
    contract::CheckedProblem,
    options::{ConfigError, OptionValue, Options},
};

/// Configures a backend and runs solves against problem definitions.
///
/// The usual sequence is [`Application::set_option`] (any number of times),
/// [`Application::initialize`] once, then [`Application::optimize`] per
/// problem.
pub struct Application<B: Backend> {
    backend: B,
    options: Options,
    config: Option<B::Config>,
}

impl<B: Backend> Application<B> {
    /// Creates an application around `backend` with no options set.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            options: Options::new(),
            config: None,
        }
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the options set so far.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Sets an option.
    ///
    /// Changing options discards any previous initialization.
    pub fn set_option(&mut self, name: &str, value: impl Into<OptionValue>) -> &mut Self {
        self.options.set(name, value);
        self.config = None;
        self
    }

    /// Validates the options against the backend.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the backend rejects any option.
    pub fn initialize(&mut self) -> Result<(), ConfigError> {
        let config = self.backend.configure(&self.options)?;
        log::debug!(
            "initialized {} backend with {} option(s)",
            self.backend.name(),
            self.options.len()
        );
        self.config = Some(config);
        Ok(())
    }

    /// Returns true once [`Application::initialize`] has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    /// Solves `problem`, reporting each iteration to `observer`.
    ///
    /// On success the problem has been finalized exactly once with the
    /// returned solution, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error, without finalizing the problem, if the application
    /// is not initialized, the problem breaks the callback contract, or the
    /// backend cannot handle it.
    pub fn optimize<P, Obs>(&self, problem: &mut P, observer: Obs) -> Result<Solution, Error>
    where
        P: NlpProblem,
        Obs: Observer<Iteration, Action>,
    {
        let config = self.config.as_ref().ok_or(Error::NotInitialized)?;

        let solution = {
            let checked = CheckedProblem::new(&*problem, self.backend.bound_infinity(config))?;
            self.backend.solve(config, &checked, observer)?
        };

        log::debug!(
            "{} backend finished with status: {}",
            self.backend.name(),
            solution.status
        );
        problem.finalize(&solution);
        Ok(solution)
    }

    /// Solves `problem` without observation.
    ///
    /// # Errors
    ///
    /// See [`Application::optimize`].
    pub fn optimize_unobserved<P>(&self, problem: &mut P) -> Result<Solution, Error>
    where
        P: NlpProblem,
    {
        self.optimize(problem, ())
    }
}
