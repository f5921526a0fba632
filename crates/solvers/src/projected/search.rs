use std::time::Instant;

use tnlp_core::{Action, Iteration, NlpProblem, Observer, Solution, StartRequest, Status};

use crate::{
    Error,
    contract::{CallError, CheckedProblem, ContractError},
    derivative_check::{self, DerivativeTest},
};

use super::{
    Config, NAME,
    evaluator::{Derivatives, Evaluator},
};

/// Sufficient decrease parameter of the Armijo condition.
const ARMIJO: f64 = 1e-4;

/// Smallest step length tried before the line search gives up.
const MIN_ALPHA: f64 = 1e-16;

/// An iterate with its objective and derivatives.
struct Point {
    x: Vec<f64>,
    objective: f64,
    derivatives: Derivatives,
}

enum LineSearch {
    Accepted {
        x: Vec<f64>,
        objective: f64,
        alpha: f64,
        trials: usize,
    },
    TinyStep,
    Exhausted,
}

pub(super) fn search<P, Obs>(
    config: &Config,
    problem: &CheckedProblem<'_, P>,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    P: NlpProblem,
    Obs: Observer<Iteration, Action>,
{
    let started = Instant::now();
    let lower = problem.x_lower();
    let upper = problem.x_upper();

    if config.print_level() >= 3 {
        log_banner(problem);
    }

    let start = problem
        .starting_point(StartRequest::primal())
        .map_err(Error::from_start)?;
    let x = project(&start.x, lower, upper);

    if config.derivative_check().test != DerivativeTest::None {
        check_derivatives(config, problem, &x)?;
    }

    let mut evaluator = Evaluator::new(problem);
    let objective = evaluator.objective(&x)?;
    let derivatives = evaluator.derivatives(&x)?;
    let (Some(objective), Some(derivatives)) = (objective, derivatives) else {
        log::warn!("{NAME}: cannot evaluate the problem at the starting point");
        let objective = objective.unwrap_or(f64::NAN);
        let n = x.len();
        return Ok(finish(
            config,
            Solution {
                status: Status::InvalidNumberDetected,
                x,
                z_lower: vec![0.0; n],
                z_upper: vec![0.0; n],
                g: Vec::new(),
                lambda: Vec::new(),
                objective,
                iters: 0,
            },
        ));
    };

    let mut current = Point {
        x,
        objective,
        derivatives,
    };
    let mut inf_du = stationarity(&current, lower, upper);
    let mut iter = 0;
    let mut acceptable = 0;

    if config.print_level() >= 5 {
        log::info!("iter    objective        inf_du    ||d||     alpha    ls");
    }
    let first = Iteration {
        iter: 0,
        objective: current.objective,
        inf_pr: 0.0,
        inf_du,
        step_norm: 0.0,
        alpha: 0.0,
        ls_trials: 0,
    };

    let status = 'iterate: {
        if report(config, &mut observer, &first) {
            break 'iterate Status::UserRequestedStop;
        }

        loop {
            if inf_du <= config.tol() {
                break 'iterate Status::Success;
            }
            if config.acceptable_iter() > 0 {
                if inf_du <= config.acceptable_tol() {
                    acceptable += 1;
                    if acceptable >= config.acceptable_iter() {
                        break 'iterate Status::StopAtAcceptablePoint;
                    }
                } else {
                    acceptable = 0;
                }
            }
            if iter >= config.max_iter() {
                break 'iterate Status::MaxIterExceeded;
            }
            if started.elapsed().as_secs_f64() > config.max_wall_time() {
                break 'iterate Status::WallTimeExceeded;
            }

            let (x, objective, alpha, trials) =
                match line_search(config, &mut evaluator, &current, lower, upper)? {
                    LineSearch::Accepted {
                        x,
                        objective,
                        alpha,
                        trials,
                    } => (x, objective, alpha, trials),
                    LineSearch::TinyStep => break 'iterate Status::StopAtTinyStep,
                    LineSearch::Exhausted => break 'iterate Status::ErrorInStepComputation,
                };

            let Some(derivatives) = evaluator.derivatives(&x)? else {
                break 'iterate Status::InvalidNumberDetected;
            };

            let step_norm = max_abs_diff(&x, &current.x);
            iter += 1;
            current = Point {
                x,
                objective,
                derivatives,
            };
            inf_du = stationarity(&current, lower, upper);

            if current
                .x
                .iter()
                .any(|v| v.abs() > config.diverging_iterates_tol())
            {
                break 'iterate Status::DivergingIterates;
            }

            let event = Iteration {
                iter,
                objective: current.objective,
                inf_pr: 0.0,
                inf_du,
                step_norm,
                alpha,
                ls_trials: trials,
            };
            if report(config, &mut observer, &event) {
                break 'iterate Status::UserRequestedStop;
            }
        }
    };

    let (z_lower, z_upper) = bound_multipliers(&current, lower, upper);
    Ok(finish(
        config,
        Solution {
            status,
            x: current.x,
            z_lower,
            z_upper,
            g: Vec::new(),
            lambda: Vec::new(),
            objective: current.objective,
            iters: iter,
        },
    ))
}

/// Backtracks along the projected Newton path from `current`.
fn line_search<P: NlpProblem>(
    config: &Config,
    evaluator: &mut Evaluator<'_, '_, P>,
    current: &Point,
    lower: &[f64],
    upper: &[f64],
) -> Result<LineSearch, ContractError> {
    let Derivatives {
        gradient,
        curvature,
    } = &current.derivatives;
    let direction: Vec<f64> = gradient.iter().zip(curvature).map(|(g, h)| -g / h).collect();
    let scale = 1.0 + current.x.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));

    let mut alpha = 1.0;
    let mut trials = 0;
    loop {
        trials += 1;
        let shifted: Vec<f64> = current
            .x
            .iter()
            .zip(&direction)
            .map(|(x, p)| x + alpha * p)
            .collect();
        let trial = project(&shifted, lower, upper);

        if trials == 1 && max_abs_diff(&trial, &current.x) <= 10.0 * f64::EPSILON * scale {
            return Ok(LineSearch::TinyStep);
        }

        let decrease: f64 = gradient
            .iter()
            .zip(trial.iter().zip(&current.x))
            .map(|(g, (t, x))| g * (t - x))
            .sum();

        match evaluator.objective(&trial)? {
            Some(objective) if objective <= current.objective + ARMIJO * decrease => {
                return Ok(LineSearch::Accepted {
                    x: trial,
                    objective,
                    alpha,
                    trials,
                });
            }
            Some(objective) => {
                log::debug!(
                    "{NAME}: trial {trials} rejected, alpha = {alpha:e}, f = {objective:e}"
                );
            }
            None => log::debug!("{NAME}: trial {trials} failed, alpha = {alpha:e}"),
        }

        alpha *= config.alpha_red_factor();
        if alpha < MIN_ALPHA {
            return Ok(LineSearch::Exhausted);
        }
    }
}

/// Logs the iteration and passes it to the observer.
///
/// Returns true if the observer asked to stop.
fn report<Obs: Observer<Iteration, Action>>(
    config: &Config,
    observer: &mut Obs,
    event: &Iteration,
) -> bool {
    if config.print_level() >= 5 {
        log::info!(
            "{:4}  {:+.8e}  {:.2e}  {:.2e}  {:.2e}  {:2}",
            event.iter,
            event.objective,
            event.inf_du,
            event.step_norm,
            event.alpha,
            event.ls_trials
        );
    }
    matches!(observer.observe(event), Some(Action::StopEarly))
}

fn log_banner<P: NlpProblem>(problem: &CheckedProblem<'_, P>) {
    let bounded = problem
        .x_lower()
        .iter()
        .zip(problem.x_upper())
        .filter(|(lo, hi)| lo.is_finite() || hi.is_finite())
        .count();
    log::info!(
        "{NAME}: {} variables ({bounded} bounded), {} Hessian nonzeros",
        problem.num_variables(),
        problem.hessian_structure().len()
    );
}

fn check_derivatives<P: NlpProblem>(
    config: &Config,
    problem: &CheckedProblem<'_, P>,
    x: &[f64],
) -> Result<(), ContractError> {
    match derivative_check::check(problem, x, config.derivative_check()) {
        Ok(report) => {
            for mismatch in &report.mismatches {
                log::warn!("derivative mismatch: {mismatch}");
            }
            log::info!(
                "derivative checker: {} of {} entries exceed tolerance {:e}",
                report.mismatches.len(),
                report.checked,
                config.derivative_check().tol
            );
            Ok(())
        }
        Err(CallError::Eval(error)) => {
            log::warn!("derivative checker skipped: {error}");
            Ok(())
        }
        Err(CallError::Contract(violation)) => Err(violation),
    }
}

fn finish(config: &Config, solution: Solution) -> Solution {
    if config.print_level() >= 1 {
        log::info!("EXIT: {}", solution.status);
        log::info!(
            "{NAME}: objective = {:.16e} after {} iteration(s)",
            solution.objective,
            solution.iters
        );
    }
    solution
}

fn project(x: &[f64], lower: &[f64], upper: &[f64]) -> Vec<f64> {
    x.iter()
        .zip(lower.iter().zip(upper))
        .map(|(&v, (&lo, &hi))| v.max(lo).min(hi))
        .collect()
}

/// Returns `max_i |P(x - ∇f)_i - x_i|`, zero exactly at a bound-constrained
/// stationary point.
fn stationarity(point: &Point, lower: &[f64], upper: &[f64]) -> f64 {
    point
        .x
        .iter()
        .zip(&point.derivatives.gradient)
        .zip(lower.iter().zip(upper))
        .map(|((&x, &g), (&lo, &hi))| ((x - g).max(lo).min(hi) - x).abs())
        .fold(0.0, f64::max)
}

fn bound_multipliers(point: &Point, lower: &[f64], upper: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = point.x.len();
    let mut z_lower = vec![0.0; n];
    let mut z_upper = vec![0.0; n];
    for i in 0..n {
        let (x, g) = (point.x[i], point.derivatives.gradient[i]);
        if lower[i].is_finite() && x <= lower[i] {
            z_lower[i] = g.max(0.0);
        }
        if upper[i].is_finite() && x >= upper[i] {
            z_upper[i] = (-g).max(0.0);
        }
    }
    (z_lower, z_upper)
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}
