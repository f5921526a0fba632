use tnlp_core::NlpProblem;

use crate::contract::{CallError, CheckedProblem, ContractError};

/// Curvature at or below this value, or not finite, is replaced by 1.
const MIN_CURVATURE: f64 = 1e-8;

/// Gradient and scaled Newton curvature at an iterate.
#[derive(Debug, Clone)]
pub(super) struct Derivatives {
    pub gradient: Vec<f64>,
    pub curvature: Vec<f64>,
}

/// Calls into a checked problem, tracking the `new_x` and `new_lambda` flags.
///
/// Evaluation failures, a non-finite objective and a non-finite gradient come
/// back as `Ok(None)`; only contract violations are errors.
pub(super) struct Evaluator<'a, 'p, P> {
    problem: &'a CheckedProblem<'p, P>,
    last_x: Option<Vec<f64>>,
    hessian_seen: bool,
}

impl<'a, 'p, P: NlpProblem> Evaluator<'a, 'p, P> {
    pub fn new(problem: &'a CheckedProblem<'p, P>) -> Self {
        Self {
            problem,
            last_x: None,
            hessian_seen: false,
        }
    }

    /// Evaluates the objective at `x`.
    pub fn objective(&mut self, x: &[f64]) -> Result<Option<f64>, ContractError> {
        let new_x = self.is_new(x);
        let value = recover(self.problem.objective(x, new_x), "objective")?;
        Ok(value.filter(|f| {
            let finite = f.is_finite();
            if !finite {
                log::debug!("objective is not finite: {f}");
            }
            finite
        }))
    }

    /// Evaluates the gradient and the Hessian diagonal at `x`.
    pub fn derivatives(&mut self, x: &[f64]) -> Result<Option<Derivatives>, ContractError> {
        let new_x = self.is_new(x);
        let Some(gradient) = recover(self.problem.gradient(x, new_x), "gradient")? else {
            return Ok(None);
        };

        let new_lambda = !self.hessian_seen;
        self.hessian_seen = true;
        let Some(values) = recover(
            self.problem.hessian_values(x, false, 1.0, &[], new_lambda),
            "Hessian",
        )?
        else {
            return Ok(None);
        };

        let mut diagonal = vec![0.0; x.len()];
        for (entry, value) in self.problem.hessian_structure().iter().zip(values) {
            if entry.is_diagonal() {
                diagonal[entry.row] += value;
            }
        }

        if gradient.iter().any(|g| !g.is_finite()) {
            log::debug!("gradient is not finite");
            return Ok(None);
        }

        let curvature = diagonal
            .into_iter()
            .map(|h| {
                if h.is_finite() && h > MIN_CURVATURE {
                    h
                } else {
                    1.0
                }
            })
            .collect();
        Ok(Some(Derivatives {
            gradient,
            curvature,
        }))
    }

    fn is_new(&mut self, x: &[f64]) -> bool {
        if self.last_x.as_deref() == Some(x) {
            return false;
        }
        self.last_x = Some(x.to_vec());
        true
    }
}

fn recover<T>(result: Result<T, CallError>, what: &str) -> Result<Option<T>, ContractError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CallError::Eval(error)) => {
            log::debug!("{what} evaluation failed: {error}");
            Ok(None)
        }
        Err(CallError::Contract(violation)) => Err(violation),
    }
}
