use std::fmt;

/// Terminal state reported by a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Converged to the requested tolerance.
    Success,

    /// Met the acceptable tolerance for enough consecutive iterations.
    StopAtAcceptablePoint,

    /// Found a feasible point for a square problem.
    FeasiblePointFound,

    /// Converged to a point of local infeasibility.
    LocalInfeasibility,

    /// The search direction became too small to make progress.
    StopAtTinyStep,

    /// Iterates grew beyond the divergence threshold.
    DivergingIterates,

    /// An observer asked the solver to stop.
    UserRequestedStop,

    /// Reached the iteration limit.
    MaxIterExceeded,

    /// Reached the wall-clock time limit.
    WallTimeExceeded,

    /// The feasibility restoration phase failed.
    RestorationFailure,

    /// No acceptable step could be computed.
    ErrorInStepComputation,

    /// A callback failed or produced a non-finite value where the solver
    /// could not recover.
    InvalidNumberDetected,

    /// The problem has fewer degrees of freedom than required.
    TooFewDegreesOfFreedom,

    /// The solver ran out of memory.
    OutOfMemory,

    /// Any other failure inside the solver.
    InternalError,
}

impl Status {
    /// Returns true only for [`Status::Success`].
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Success => "optimal solution found",
            Self::StopAtAcceptablePoint => "solved to acceptable level",
            Self::FeasiblePointFound => "feasible point for square problem found",
            Self::LocalInfeasibility => "converged to a point of local infeasibility",
            Self::StopAtTinyStep => "search direction becomes too small",
            Self::DivergingIterates => "iterates diverging",
            Self::UserRequestedStop => "stopping optimization at current point as requested",
            Self::MaxIterExceeded => "maximum number of iterations exceeded",
            Self::WallTimeExceeded => "maximum wall time exceeded",
            Self::RestorationFailure => "restoration failed",
            Self::ErrorInStepComputation => "error in step computation",
            Self::InvalidNumberDetected => "invalid number in NLP function or derivative detected",
            Self::TooFewDegreesOfFreedom => "problem has too few degrees of freedom",
            Self::OutOfMemory => "not enough memory",
            Self::InternalError => "internal error",
        };
        f.write_str(message)
    }
}

/// The terminal result of one solve.
///
/// Produced once by the solver and handed to [`NlpProblem::finalize`].
///
/// [`NlpProblem::finalize`]: crate::NlpProblem::finalize
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Terminal status.
    pub status: Status,

    /// Final iterate.
    pub x: Vec<f64>,

    /// Lower bound multipliers at the final iterate.
    pub z_lower: Vec<f64>,

    /// Upper bound multipliers at the final iterate.
    pub z_upper: Vec<f64>,

    /// Constraint values at the final iterate.
    pub g: Vec<f64>,

    /// Constraint multipliers at the final iterate.
    pub lambda: Vec<f64>,

    /// Objective value at the final iterate.
    pub objective: f64,

    /// Number of iterations taken.
    pub iters: usize,
}
