//! The smallest useful nonlinear program: `min (x - 2)²` subject to `x ≥ 0`.
//!
//! [`MinimalNlp`] implements every [`NlpProblem`] callback for one bounded
//! variable and no constraints. The lower bound and starting point can be
//! changed to exercise bound handling. [`run`] drives it through an
//! [`Application`](tnlp_solvers::Application) and decides the exit status of
//! the `minimal` binary.

use std::convert::Infallible;

use tnlp_core::{
    BOUND_INFINITY, Bounds, Entry, NlpInfo, NlpProblem, Solution, StartRequest, StartingPoint,
};

mod run;

pub use run::{RunError, exit_status, run};

/// Unconstrained minimizer of the objective.
pub const TARGET: f64 = 2.0;

/// `min (x - 2)²` subject to `lower ≤ x`.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimalNlp {
    lower: f64,
    start: f64,
    solution: Option<Solution>,
}

impl Default for MinimalNlp {
    fn default() -> Self {
        Self {
            lower: 0.0,
            start: 5.0,
            solution: None,
        }
    }
}

impl MinimalNlp {
    /// Creates the problem with `x ≥ 0`, starting at `x = 5`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the lower bound on `x`.
    #[must_use]
    pub fn with_lower_bound(mut self, lower: f64) -> Self {
        self.lower = lower;
        self
    }

    /// Replaces the starting point.
    #[must_use]
    pub fn with_start(mut self, start: f64) -> Self {
        self.start = start;
        self
    }

    /// Returns the lower bound on `x`.
    #[must_use]
    pub fn lower_bound(&self) -> f64 {
        self.lower
    }

    /// Returns the minimizer under the current bound.
    #[must_use]
    pub fn expected_x(&self) -> f64 {
        TARGET.max(self.lower)
    }

    /// Returns the solution received by [`NlpProblem::finalize`], if any.
    #[must_use]
    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }
}

impl NlpProblem for MinimalNlp {
    type Error = Infallible;

    fn info(&self) -> NlpInfo {
        NlpInfo::unconstrained(1, 1)
    }

    fn bounds(&self) -> Bounds {
        Bounds::new(vec![self.lower_bound()], vec![BOUND_INFINITY])
    }

    fn starting_point(&self, request: StartRequest) -> Result<StartingPoint, Self::Error> {
        if request.init_x {
            Ok(StartingPoint::from_x(vec![self.start]))
        } else {
            Ok(StartingPoint::default())
        }
    }

    fn objective(&self, x: &[f64], _new_x: bool) -> Result<f64, Self::Error> {
        Ok((x[0] - TARGET).powi(2))
    }

    fn gradient(&self, x: &[f64], _new_x: bool) -> Result<Vec<f64>, Self::Error> {
        Ok(vec![2.0 * (x[0] - TARGET)])
    }

    fn constraints(&self, _x: &[f64], _new_x: bool) -> Result<Vec<f64>, Self::Error> {
        Ok(Vec::new())
    }

    fn jacobian_structure(&self) -> Vec<Entry> {
        Vec::new()
    }

    fn jacobian_values(&self, _x: &[f64], _new_x: bool) -> Result<Vec<f64>, Self::Error> {
        Ok(Vec::new())
    }

    fn hessian_structure(&self) -> Vec<Entry> {
        vec![Entry::new(0, 0)]
    }

    fn hessian_values(
        &self,
        _x: &[f64],
        _new_x: bool,
        obj_factor: f64,
        _lambda: &[f64],
        _new_lambda: bool,
    ) -> Result<Vec<f64>, Self::Error> {
        Ok(vec![2.0 * obj_factor])
    }

    fn finalize(&mut self, solution: &Solution) {
        self.solution = Some(solution.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_minimizer_respects_the_bound() {
        assert_eq!(MinimalNlp::new().expected_x(), 2.0);
        assert_eq!(MinimalNlp::new().with_lower_bound(3.0).expected_x(), 3.0);
    }

    #[test]
    fn lower_bound_is_reported_in_bounds() {
        let problem = MinimalNlp::new().with_lower_bound(-1.5);

        assert_eq!(problem.lower_bound(), -1.5);
        assert_eq!(problem.bounds().x_lower, vec![-1.5]);
        assert_eq!(problem.bounds().x_upper, vec![BOUND_INFINITY]);
    }

    #[test]
    fn start_is_only_given_when_requested() {
        let problem = MinimalNlp::new().with_start(7.0);

        let requested = problem
            .starting_point(StartRequest::primal())
            .expect("infallible");
        assert_eq!(requested.x, Some(vec![7.0]));

        let skipped = problem
            .starting_point(StartRequest {
                init_x: false,
                init_z: false,
                init_lambda: false,
            })
            .expect("infallible");
        assert_eq!(skipped, StartingPoint::default());
    }
}
