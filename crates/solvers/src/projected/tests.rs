use std::cell::Cell;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use thiserror::Error;

use tnlp_core::{
    Action, BOUND_INFINITY, Bounds, Entry, Iteration, NlpInfo, NlpProblem, Solution,
    StartRequest, StartingPoint, Status,
};

use crate::{
    Application, Error,
    contract::{ContractError, Quantity},
    options::OptionValue,
};

use super::ProjectedNewton;

#[derive(Debug, Error)]
#[error("objective undefined at x = {0}")]
struct OutsideDomain(f64);

/// `f(x) = Σ (x_i - c_i)²` on a box.
///
/// The reported Hessian diagonal is `curvature`, which need not be the true
/// value of 2, and the objective fails above `domain_limit`.
struct Shifted {
    center: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    start: Vec<f64>,
    curvature: f64,
    domain_limit: f64,
    short_gradient: bool,
    evaluations: Cell<usize>,
    finalized: Vec<Status>,
}

impl Shifted {
    fn new(center: Vec<f64>, start: Vec<f64>) -> Self {
        let n = center.len();
        Self {
            center,
            lower: vec![-BOUND_INFINITY; n],
            upper: vec![BOUND_INFINITY; n],
            start,
            curvature: 2.0,
            domain_limit: f64::INFINITY,
            short_gradient: false,
            evaluations: Cell::new(0),
            finalized: Vec::new(),
        }
    }

    fn n(&self) -> usize {
        self.center.len()
    }
}

impl NlpProblem for Shifted {
    type Error = OutsideDomain;

    fn info(&self) -> NlpInfo {
        NlpInfo::unconstrained(self.n(), self.n())
    }

    fn bounds(&self) -> Bounds {
        Bounds::new(self.lower.clone(), self.upper.clone())
    }

    fn starting_point(&self, _request: StartRequest) -> Result<StartingPoint, Self::Error> {
        Ok(StartingPoint::from_x(self.start.clone()))
    }

    fn objective(&self, x: &[f64], _new_x: bool) -> Result<f64, Self::Error> {
        self.evaluations.set(self.evaluations.get() + 1);
        if let Some(&bad) = x.iter().find(|&&v| v > self.domain_limit) {
            return Err(OutsideDomain(bad));
        }
        Ok(x.iter().zip(&self.center).map(|(x, c)| (x - c).powi(2)).sum())
    }

    fn gradient(&self, x: &[f64], _new_x: bool) -> Result<Vec<f64>, Self::Error> {
        self.evaluations.set(self.evaluations.get() + 1);
        let mut gradient: Vec<f64> = x
            .iter()
            .zip(&self.center)
            .map(|(x, c)| 2.0 * (x - c))
            .collect();
        if self.short_gradient {
            gradient.pop();
        }
        Ok(gradient)
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
        (0..self.n()).map(|i| Entry::new(i, i)).collect()
    }

    fn hessian_values(
        &self,
        _x: &[f64],
        _new_x: bool,
        obj_factor: f64,
        _lambda: &[f64],
        _new_lambda: bool,
    ) -> Result<Vec<f64>, Self::Error> {
        Ok(vec![obj_factor * self.curvature; self.n()])
    }

    fn finalize(&mut self, solution: &Solution) {
        self.finalized.push(solution.status);
    }
}

/// `f(x) = x0² + x1² + 1.5·x0·x1`, whose coupling slows diagonal scaling.
///
/// With `linear` set, the objective is `-x0 - x1` instead and has no minimum.
#[derive(Default)]
struct Coupled {
    linear: bool,
    finalized: usize,
}

impl NlpProblem for Coupled {
    type Error = OutsideDomain;

    fn info(&self) -> NlpInfo {
        NlpInfo::unconstrained(2, 3)
    }

    fn bounds(&self) -> Bounds {
        Bounds::free(2)
    }

    fn starting_point(&self, _request: StartRequest) -> Result<StartingPoint, Self::Error> {
        Ok(StartingPoint::from_x(vec![1.0, 0.5]))
    }

    fn objective(&self, x: &[f64], _new_x: bool) -> Result<f64, Self::Error> {
        if self.linear {
            return Ok(-x[0] - x[1]);
        }
        Ok(x[0] * x[0] + x[1] * x[1] + 1.5 * x[0] * x[1])
    }

    fn gradient(&self, x: &[f64], _new_x: bool) -> Result<Vec<f64>, Self::Error> {
        if self.linear {
            return Ok(vec![-1.0, -1.0]);
        }
        Ok(vec![2.0 * x[0] + 1.5 * x[1], 2.0 * x[1] + 1.5 * x[0]])
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
        vec![Entry::new(0, 0), Entry::new(1, 0), Entry::new(1, 1)]
    }

    fn hessian_values(
        &self,
        _x: &[f64],
        _new_x: bool,
        obj_factor: f64,
        _lambda: &[f64],
        _new_lambda: bool,
    ) -> Result<Vec<f64>, Self::Error> {
        if self.linear {
            return Ok(vec![0.0; 3]);
        }
        Ok(vec![2.0 * obj_factor, 1.5 * obj_factor, 2.0 * obj_factor])
    }

    fn finalize(&mut self, _solution: &Solution) {
        self.finalized += 1;
    }
}

fn application(options: &[(&str, OptionValue)]) -> Application<ProjectedNewton> {
    let mut app = Application::new(ProjectedNewton);
    app.set_option("print_level", 0);
    for (name, value) in options {
        app.set_option(name, value.clone());
    }
    app.initialize().expect("options should be valid");
    app
}

#[test]
fn minimizes_unbounded_quadratic() {
    let mut problem = Shifted::new(vec![2.0, -1.0], vec![0.0, 0.0]);

    let solution = application(&[])
        .optimize_unobserved(&mut problem)
        .expect("should solve");

    assert_eq!(solution.status, Status::Success);
    assert_eq!(solution.iters, 1);
    assert_relative_eq!(solution.x[0], 2.0);
    assert_relative_eq!(solution.x[1], -1.0);
    assert_abs_diff_eq!(solution.objective, 0.0);
    assert!(solution.g.is_empty());
    assert!(solution.lambda.is_empty());
    assert_eq!(problem.finalized, vec![Status::Success]);
}

#[test]
fn stops_on_an_active_lower_bound() {
    let mut problem = Shifted::new(vec![2.0], vec![5.0]);
    problem.lower = vec![3.0];

    let solution = application(&[])
        .optimize_unobserved(&mut problem)
        .expect("should solve");

    assert_eq!(solution.status, Status::Success);
    assert_relative_eq!(solution.x[0], 3.0);
    assert_relative_eq!(solution.objective, 1.0);
    assert_relative_eq!(solution.z_lower[0], 2.0);
    assert_abs_diff_eq!(solution.z_upper[0], 0.0);
}

#[test]
fn stops_on_an_active_upper_bound() {
    let mut problem = Shifted::new(vec![2.0], vec![-4.0]);
    problem.upper = vec![1.0];

    let solution = application(&[])
        .optimize_unobserved(&mut problem)
        .expect("should solve");

    assert_eq!(solution.status, Status::Success);
    assert_relative_eq!(solution.x[0], 1.0);
    assert_abs_diff_eq!(solution.z_lower[0], 0.0);
    assert_relative_eq!(solution.z_upper[0], 2.0);
}

#[test]
fn starting_point_is_projected_onto_bounds() {
    let mut problem = Shifted::new(vec![2.0], vec![-10.0]);
    problem.lower = vec![0.0];

    let mut first = None;
    let observer = |event: &Iteration| -> Option<Action> {
        if event.iter == 0 {
            first = Some(event.objective);
        }
        None
    };
    application(&[])
        .optimize(&mut problem, observer)
        .expect("should solve");

    // Evaluated at 0 rather than -10.
    assert_relative_eq!(first.expect("iteration 0 reported"), 4.0);
}

#[test]
fn converges_on_coupled_problem() {
    let mut problem = Coupled::default();

    let mut events = Vec::new();
    let observer = |event: &Iteration| -> Option<Action> {
        events.push(*event);
        None
    };
    let solution = application(&[])
        .optimize(&mut problem, observer)
        .expect("should solve");

    assert_eq!(solution.status, Status::Success);
    assert_abs_diff_eq!(solution.x[0], 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(solution.x[1], 0.0, epsilon = 1e-6);
    assert_eq!(problem.finalized, 1);

    assert_eq!(events.len(), solution.iters + 1);
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.iter, i);
        assert_abs_diff_eq!(event.inf_pr, 0.0);
    }
    for pair in events.windows(2) {
        assert!(pair[1].objective < pair[0].objective);
        assert!(pair[1].ls_trials >= 1);
    }
    assert!(events.last().expect("events").inf_du <= 1e-8);
}

#[test]
fn observer_can_stop_at_the_starting_point() {
    let mut problem = Shifted::new(vec![2.0], vec![0.0]);

    let solution = application(&[])
        .optimize(&mut problem, |_: &Iteration| Some(Action::StopEarly))
        .expect("should stop");

    assert_eq!(solution.status, Status::UserRequestedStop);
    assert_eq!(solution.iters, 0);
    assert_relative_eq!(solution.x[0], 0.0);
    assert_eq!(problem.finalized, vec![Status::UserRequestedStop]);
}

#[test]
fn observer_can_stop_mid_solve() {
    let mut problem = Coupled::default();

    let solution = application(&[])
        .optimize(&mut problem, |event: &Iteration| {
            (event.iter == 3).then_some(Action::StopEarly)
        })
        .expect("should stop");

    assert_eq!(solution.status, Status::UserRequestedStop);
    assert_eq!(solution.iters, 3);
    assert_eq!(problem.finalized, 1);
}

#[test]
fn zero_iterations_allowed() {
    let mut problem = Shifted::new(vec![2.0], vec![0.0]);

    let solution = application(&[("max_iter", 0.into())])
        .optimize_unobserved(&mut problem)
        .expect("should stop");

    assert_eq!(solution.status, Status::MaxIterExceeded);
    assert_eq!(solution.iters, 0);
    assert_relative_eq!(solution.x[0], 0.0);
    assert_relative_eq!(solution.objective, 4.0);
}

#[test]
fn backtracks_past_failed_evaluations() {
    // A reported curvature of 0.25 makes the full step land at x = 16,
    // outside the domain; halving reaches 8, 4 and finally 2.
    let mut problem = Shifted::new(vec![2.0], vec![0.0]);
    problem.curvature = 0.25;
    problem.domain_limit = 10.0;

    let mut events = Vec::new();
    let observer = |event: &Iteration| -> Option<Action> {
        events.push(*event);
        None
    };
    let solution = application(&[])
        .optimize(&mut problem, observer)
        .expect("should solve");

    assert_eq!(solution.status, Status::Success);
    assert_relative_eq!(solution.x[0], 2.0);
    assert_eq!(events[1].ls_trials, 4);
    assert_relative_eq!(events[1].alpha, 0.125);
    assert_relative_eq!(events[1].step_norm, 2.0);
}

#[test]
fn non_finite_curvature_falls_back_to_unit_scaling() {
    // With h = 1 the full step overshoots to x = 4, where f equals f(0);
    // halving it lands on the minimizer.
    for curvature in [f64::INFINITY, f64::NAN] {
        let mut problem = Shifted::new(vec![2.0], vec![0.0]);
        problem.curvature = curvature;

        let mut events = Vec::new();
        let observer = |event: &Iteration| -> Option<Action> {
            events.push(*event);
            None
        };
        let solution = application(&[])
            .optimize(&mut problem, observer)
            .expect("should solve");

        assert_eq!(solution.status, Status::Success);
        assert_eq!(solution.iters, 1);
        assert_relative_eq!(solution.x[0], 2.0);
        assert_eq!(events[1].ls_trials, 2);
        assert_relative_eq!(events[1].alpha, 0.5);
        assert_eq!(problem.finalized, vec![Status::Success]);
    }
}

#[test]
fn stops_at_acceptable_point() {
    let mut problem = Coupled::default();

    let solution = application(&[
        ("tol", 1e-30.into()),
        ("acceptable_tol", 1e-3.into()),
        ("acceptable_iter", 3.into()),
    ])
    .optimize_unobserved(&mut problem)
    .expect("should stop");

    assert_eq!(solution.status, Status::StopAtAcceptablePoint);
    assert_abs_diff_eq!(solution.x[0], 0.0, epsilon = 1e-2);
}

#[test]
fn detects_diverging_iterates() {
    let mut problem = Coupled {
        linear: true,
        ..Coupled::default()
    };

    let solution = application(&[("diverging_iterates_tol", 10.into())])
        .optimize_unobserved(&mut problem)
        .expect("should stop");

    assert_eq!(solution.status, Status::DivergingIterates);
    assert!(solution.x[0] > 10.0);
    assert_eq!(problem.finalized, 1);
}

#[test]
fn respects_wall_time_limit() {
    let mut problem = Coupled::default();

    let solution = application(&[("max_wall_time", 1e-9.into())])
        .optimize_unobserved(&mut problem)
        .expect("should stop");

    assert_eq!(solution.status, Status::WallTimeExceeded);
    assert_eq!(solution.iters, 0);
}

#[test]
fn unusable_starting_point_is_reported() {
    let mut problem = Shifted::new(vec![2.0], vec![0.0]);
    problem.domain_limit = -1.0;

    let solution = application(&[])
        .optimize_unobserved(&mut problem)
        .expect("should return a solution");

    assert_eq!(solution.status, Status::InvalidNumberDetected);
    assert_eq!(solution.iters, 0);
    assert!(solution.objective.is_nan());
    assert_eq!(problem.finalized, vec![Status::InvalidNumberDetected]);
}

#[test]
fn derivative_test_does_not_change_the_outcome() {
    let mut problem = Shifted::new(vec![2.0], vec![0.0]);
    problem.curvature = 0.25;

    let solution = application(&[("derivative_test", "second-order".into())])
        .optimize_unobserved(&mut problem)
        .expect("should solve");

    assert_eq!(solution.status, Status::Success);
    assert_relative_eq!(solution.x[0], 2.0);
}

#[test]
fn mid_solve_contract_violation_is_fatal() {
    let mut problem = Shifted::new(vec![2.0, -1.0], vec![0.0, 0.0]);
    problem.short_gradient = true;

    let error = application(&[])
        .optimize_unobserved(&mut problem)
        .expect_err("gradient has the wrong length");

    assert!(matches!(
        error,
        Error::Contract(ContractError::ValuesLength {
            quantity: Quantity::Gradient,
            expected: 2,
            actual: 1,
        })
    ));
    assert!(problem.finalized.is_empty());
}

/// One variable, one constraint `x ≥ 1`.
struct Constrained {
    evaluations: Cell<usize>,
}

impl NlpProblem for Constrained {
    type Error = OutsideDomain;

    fn info(&self) -> NlpInfo {
        NlpInfo {
            num_constraints: 1,
            jacobian_nonzeros: 1,
            ..NlpInfo::unconstrained(1, 0)
        }
    }

    fn bounds(&self) -> Bounds {
        Bounds::free(1).with_constraints(vec![1.0], vec![BOUND_INFINITY])
    }

    fn starting_point(&self, _request: StartRequest) -> Result<StartingPoint, Self::Error> {
        self.evaluations.set(self.evaluations.get() + 1);
        Ok(StartingPoint::default())
    }

    fn objective(&self, x: &[f64], _new_x: bool) -> Result<f64, Self::Error> {
        self.evaluations.set(self.evaluations.get() + 1);
        Ok(x[0])
    }

    fn gradient(&self, _x: &[f64], _new_x: bool) -> Result<Vec<f64>, Self::Error> {
        self.evaluations.set(self.evaluations.get() + 1);
        Ok(vec![1.0])
    }

    fn constraints(&self, x: &[f64], _new_x: bool) -> Result<Vec<f64>, Self::Error> {
        self.evaluations.set(self.evaluations.get() + 1);
        Ok(vec![x[0]])
    }

    fn jacobian_structure(&self) -> Vec<Entry> {
        vec![Entry::new(0, 0)]
    }

    fn jacobian_values(&self, _x: &[f64], _new_x: bool) -> Result<Vec<f64>, Self::Error> {
        self.evaluations.set(self.evaluations.get() + 1);
        Ok(vec![1.0])
    }

    fn hessian_structure(&self) -> Vec<Entry> {
        Vec::new()
    }

    fn hessian_values(
        &self,
        _x: &[f64],
        _new_x: bool,
        _obj_factor: f64,
        _lambda: &[f64],
        _new_lambda: bool,
    ) -> Result<Vec<f64>, Self::Error> {
        self.evaluations.set(self.evaluations.get() + 1);
        Ok(Vec::new())
    }

    fn finalize(&mut self, _solution: &Solution) {
        panic!("unsupported problems must not be finalized");
    }
}

#[test]
fn rejects_general_constraints_before_evaluating() {
    let mut problem = Constrained {
        evaluations: Cell::new(0),
    };

    let error = application(&[])
        .optimize_unobserved(&mut problem)
        .expect_err("constraints are unsupported");

    assert!(matches!(
        error,
        Error::Unsupported {
            backend: "projected-newton",
            ..
        }
    ));
    assert_eq!(problem.evaluations.get(), 0);
}
