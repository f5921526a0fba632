use crate::{Bounds, Entry, NlpInfo, Solution, StartRequest, StartingPoint};

/// Defines a nonlinear program to be solved.
///
/// A problem is a passive description: it answers structural and numerical
/// queries on demand and never drives the solve itself. Solvers call these
/// methods sequentially, in an order they control, and hand over the final
/// [`Solution`] through [`NlpProblem::finalize`] exactly once.
///
/// The problem being described is
///
/// ```text
///     min   f(x)            x in R^n
///     s.t.  g_L <= g(x) <= g_U
///           x_L <=  x   <= x_U
/// ```
///
/// # Consistency
///
/// Every answer must agree with [`NlpInfo`]: arrays have length `n` or `m`,
/// structure queries return exactly the declared number of nonzeros, and
/// every index lies in range for the declared [`IndexStyle`].
/// Drivers reject a problem that breaks this before evaluating anything.
///
/// # Evaluation failures
///
/// Returning `Err` from an evaluation means "cannot evaluate at this point".
/// Solvers treat it as a cue to shorten the trial step, not as a fatal error.
///
/// [`IndexStyle`]: crate::IndexStyle
pub trait NlpProblem {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Describes the problem dimensions and the indexing convention.
    fn info(&self) -> NlpInfo;

    /// Returns the variable and constraint bounds.
    fn bounds(&self) -> Bounds;

    /// Returns the initial iterate and, optionally, multiplier estimates.
    ///
    /// The request says which parts the solver wants. Parts left as `None`
    /// fall back to solver defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if no starting point can be produced.
    fn starting_point(&self, request: StartRequest) -> Result<StartingPoint, Self::Error>;

    /// Evaluates the objective `f(x)`.
    ///
    /// `new_x` is false when `x` is the same point passed to the previous
    /// evaluation call.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the objective cannot be evaluated at `x`.
    fn objective(&self, x: &[f64], new_x: bool) -> Result<f64, Self::Error>;

    /// Evaluates the dense gradient `∇f(x)`, of length `n`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the gradient cannot be evaluated at `x`.
    fn gradient(&self, x: &[f64], new_x: bool) -> Result<Vec<f64>, Self::Error>;

    /// Evaluates the constraint values `g(x)`, of length `m`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the constraints cannot be evaluated at `x`.
    fn constraints(&self, x: &[f64], new_x: bool) -> Result<Vec<f64>, Self::Error>;

    /// Returns the nonzero pattern of the constraint Jacobian.
    ///
    /// Rows index constraints and columns index variables. The pattern must
    /// not change for the life of a solve.
    fn jacobian_structure(&self) -> Vec<Entry>;

    /// Evaluates the Jacobian nonzeros, ordered as [`Self::jacobian_structure`].
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the Jacobian cannot be evaluated at `x`.
    fn jacobian_values(&self, x: &[f64], new_x: bool) -> Result<Vec<f64>, Self::Error>;

    /// Returns the nonzero pattern of one triangle of the Lagrangian Hessian.
    ///
    /// The Hessian is symmetric, so each off-diagonal pair is listed once.
    fn hessian_structure(&self) -> Vec<Entry>;

    /// Evaluates the Hessian nonzeros, ordered as [`Self::hessian_structure`].
    ///
    /// Values are `obj_factor * ∇²f(x) + Σ lambda[i] * ∇²g_i(x)`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the Hessian cannot be evaluated at `x`.
    fn hessian_values(
        &self,
        x: &[f64],
        new_x: bool,
        obj_factor: f64,
        lambda: &[f64],
        new_lambda: bool,
    ) -> Result<Vec<f64>, Self::Error>;

    /// Receives the terminal solution once the solver is done.
    ///
    /// Called exactly once per completed solve, whatever the terminal status.
    fn finalize(&mut self, solution: &Solution);
}
