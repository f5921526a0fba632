//! Finite-difference verification of user-supplied derivatives.
//!
//! Solvers trust the gradient, Jacobian and Hessian a problem returns; a
//! wrong derivative shows up only as slow or failed convergence. [`check`]
//! compares them against forward differences at a given point and lists
//! every entry whose relative error exceeds a tolerance.

use std::{collections::BTreeMap, fmt};

use tnlp_core::{Entry, NlpProblem};

use crate::contract::{CallError, CheckedProblem};

/// Which derivatives to verify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DerivativeTest {
    /// Verify nothing.
    #[default]
    None,

    /// Verify the objective gradient and the constraint Jacobian.
    FirstOrder,

    /// Verify first derivatives and the Lagrangian Hessian.
    SecondOrder,
}

impl DerivativeTest {
    /// Option values accepted by [`DerivativeTest::from_name`].
    pub const CHOICES: &'static [&'static str] = &["none", "first-order", "second-order"];

    /// Parses an option value.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "first-order" => Some(Self::FirstOrder),
            "second-order" => Some(Self::SecondOrder),
            _ => None,
        }
    }
}

/// Settings for a derivative check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckConfig {
    pub test: DerivativeTest,

    /// Relative perturbation; the step for `x_j` is
    /// `perturbation * max(1, |x_j|)`.
    pub perturbation: f64,

    /// Largest accepted relative error.
    pub tol: f64,
}

impl CheckConfig {
    /// Creates a check configuration.
    #[must_use]
    pub fn new(test: DerivativeTest, perturbation: f64, tol: f64) -> Self {
        Self {
            test,
            perturbation,
            tol,
        }
    }
}

/// The derivative a mismatch was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivative {
    Gradient,
    Jacobian,
    Hessian,
}

impl fmt::Display for Derivative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gradient => f.write_str("grad_f"),
            Self::Jacobian => f.write_str("jac_g"),
            Self::Hessian => f.write_str("obj_hess + con_hess"),
        }
    }
}

/// An entry whose analytic value disagrees with its estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub derivative: Derivative,

    /// Zero-based position; gradient entries use row 0.
    pub entry: Entry,

    pub analytic: f64,
    pub estimate: f64,
    pub rel_error: f64,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{:5},{:5}] = {:+.16e} ~ {:+.16e}  [{:+.3e}]",
            self.derivative,
            self.entry.row,
            self.entry.col,
            self.analytic,
            self.estimate,
            self.rel_error
        )
    }
}

/// Outcome of a derivative check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    /// Number of entries compared.
    pub checked: usize,

    /// Entries that exceeded the tolerance.
    pub mismatches: Vec<Mismatch>,
}

impl Report {
    /// Returns true if no mismatch was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }

    fn compare(
        &mut self,
        derivative: Derivative,
        entry: Entry,
        analytic: f64,
        estimate: f64,
        tol: f64,
    ) {
        self.checked += 1;
        let rel_error = (analytic - estimate).abs() / estimate.abs().max(1.0);
        if rel_error.is_nan() || rel_error > tol {
            self.mismatches.push(Mismatch {
                derivative,
                entry,
                analytic,
                estimate,
                rel_error,
            });
        }
    }
}

/// Compares analytic derivatives with forward differences at `x`.
///
/// Structural zeros are checked too: an entry missing from a structure is
/// compared as 0.
///
/// # Errors
///
/// Returns a [`CallError`] if any callback fails at `x` or at a perturbed
/// point.
pub fn check<P: NlpProblem>(
    problem: &CheckedProblem<'_, P>,
    x: &[f64],
    config: &CheckConfig,
) -> Result<Report, CallError> {
    let mut report = Report::default();
    if config.test == DerivativeTest::None {
        return Ok(report);
    }

    let n = problem.num_variables();
    let m = problem.num_constraints();
    let tol = config.tol;

    let f0 = problem.objective(x, true)?;
    let gradient = problem.gradient(x, false)?;
    let (g0, jacobian) = if m > 0 {
        let g0 = problem.constraints(x, false)?;
        let values = problem.jacobian_values(x, false)?;
        (g0, accumulate(problem.jacobian_structure(), &values))
    } else {
        (Vec::new(), BTreeMap::new())
    };

    let mut shifted = x.to_vec();
    for j in 0..n {
        let h = step(config.perturbation, x[j]);
        shifted[j] = x[j] + h;

        let f = problem.objective(&shifted, true)?;
        report.compare(
            Derivative::Gradient,
            Entry::new(0, j),
            gradient[j],
            (f - f0) / h,
            tol,
        );

        if m > 0 {
            let g = problem.constraints(&shifted, false)?;
            for i in 0..m {
                let entry = Entry::new(i, j);
                let analytic = jacobian.get(&entry).copied().unwrap_or(0.0);
                report.compare(Derivative::Jacobian, entry, analytic, (g[i] - g0[i]) / h, tol);
            }
        }

        shifted[j] = x[j];
    }

    if config.test == DerivativeTest::SecondOrder {
        let lambda = vec![1.0; m];
        let base = lagrangian_gradient(problem, x, &lambda)?;
        let values = problem.hessian_values(x, false, 1.0, &lambda, true)?;
        let hessian = accumulate(problem.hessian_structure(), &values);

        for j in 0..n {
            let h = step(config.perturbation, x[j]);
            shifted[j] = x[j] + h;

            let perturbed = lagrangian_gradient(problem, &shifted, &lambda)?;
            for i in j..n {
                let entry = Entry::new(i, j);
                let analytic = hessian.get(&entry).copied().unwrap_or(0.0);
                let estimate = (perturbed[i] - base[i]) / h;
                report.compare(Derivative::Hessian, entry, analytic, estimate, tol);
            }

            shifted[j] = x[j];
        }
    }

    Ok(report)
}

fn step(perturbation: f64, x: f64) -> f64 {
    perturbation * x.abs().max(1.0)
}

/// Sums values onto their structure positions; repeated entries add up.
fn accumulate(structure: &[Entry], values: &[f64]) -> BTreeMap<Entry, f64> {
    let mut dense = BTreeMap::new();
    for (&entry, &value) in structure.iter().zip(values) {
        *dense.entry(entry).or_insert(0.0) += value;
    }
    dense
}

/// Evaluates `∇f(x) + Jᵀλ`.
fn lagrangian_gradient<P: NlpProblem>(
    problem: &CheckedProblem<'_, P>,
    x: &[f64],
    lambda: &[f64],
) -> Result<Vec<f64>, CallError> {
    let mut gradient = problem.gradient(x, true)?;
    if problem.num_constraints() > 0 {
        let values = problem.jacobian_values(x, false)?;
        for (entry, value) in problem.jacobian_structure().iter().zip(values) {
            gradient[entry.col] += lambda[entry.row] * value;
        }
    }
    Ok(gradient)
}
