/// Progress report emitted by a solver once per iteration.
///
/// Iteration 0 describes the starting point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iteration {
    /// Iteration counter.
    pub iter: usize,

    /// Objective value at the current iterate.
    pub objective: f64,

    /// Primal infeasibility (constraint violation).
    pub inf_pr: f64,

    /// Dual infeasibility (optimality error).
    pub inf_du: f64,

    /// Norm of the step taken to reach the current iterate.
    pub step_norm: f64,

    /// Step length accepted by the line search.
    pub alpha: f64,

    /// Number of line-search trials for the accepted step.
    pub ls_trials: usize,
}

/// Control actions an observer can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop at the current iterate.
    ///
    /// The solve ends with [`Status::UserRequestedStop`] and is still
    /// finalized.
    ///
    /// [`Status::UserRequestedStop`]: crate::Status::UserRequestedStop
    StopEarly,
}
