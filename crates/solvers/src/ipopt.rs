//! Ipopt as a backend, through the `ipopt` crate.
//!
//! Every option set on the [`Application`] is forwarded to Ipopt verbatim,
//! so any Ipopt option name is accepted at configure time and rejected names
//! surface as [`ConfigError::Rejected`] when solving. Ipopt drives the
//! callbacks through an adapter over the [`CheckedProblem`]; a contract
//! violation observed inside a callback stops Ipopt and is returned as
//! [`Error::Contract`].
//!
//! [`Application`]: crate::Application

use std::cell::RefCell;

use ::ipopt::{
    BasicProblem, ConstrainedProblem, Index, IntermediateCallbackData, Ipopt, Number, SolveStatus,
};
use tnlp_core::{Action, Iteration, NlpProblem, Observer, Solution, StartRequest, Status};

use crate::{
    Error,
    backend::Backend,
    contract::{BoundInfinity, CallError, CheckedProblem, ContractError, Start},
    options::{ConfigError, OptionSpec, OptionValue, Options},
};

const NAME: &str = "ipopt";

const LOWER_BOUND_INF: OptionSpec = OptionSpec::num(
    "nlp_lower_bound_inf",
    std::ops::Bound::Unbounded,
    std::ops::Bound::Unbounded,
    -1e19,
);
const UPPER_BOUND_INF: OptionSpec = OptionSpec::num(
    "nlp_upper_bound_inf",
    std::ops::Bound::Unbounded,
    std::ops::Bound::Unbounded,
    1e19,
);

/// Options to forward to Ipopt.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    options: Options,
    bound_infinity: BoundInfinity,
}

impl Config {
    /// Returns the options forwarded to Ipopt.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }
}

/// The Ipopt interior-point solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct IpoptBackend;

impl Backend for IpoptBackend {
    type Config = Config;

    fn name(&self) -> &'static str {
        NAME
    }

    fn configure(&self, options: &Options) -> Result<Config, ConfigError> {
        for spec in [&LOWER_BOUND_INF, &UPPER_BOUND_INF] {
            if let Some(value) = options.get(spec.name) {
                spec.check(value)?;
            }
        }
        let bound_infinity = BoundInfinity {
            lower: options.num(&LOWER_BOUND_INF),
            upper: options.num(&UPPER_BOUND_INF),
        };
        if bound_infinity.lower >= bound_infinity.upper {
            return Err(ConfigError::Inconsistent {
                reason: "nlp_lower_bound_inf must be less than nlp_upper_bound_inf",
            });
        }

        Ok(Config {
            options: options.clone(),
            bound_infinity,
        })
    }

    fn bound_infinity(&self, config: &Config) -> BoundInfinity {
        config.bound_infinity
    }

    fn solve<P, Obs>(
        &self,
        config: &Config,
        problem: &CheckedProblem<'_, P>,
        observer: Obs,
    ) -> Result<Solution, Error>
    where
        P: NlpProblem,
        Obs: Observer<Iteration, Action>,
    {
        let request = StartRequest {
            init_x: true,
            init_z: true,
            init_lambda: true,
        };
        let start = problem.starting_point(request).map_err(Error::from_start)?;

        let adapter = Adapter {
            problem,
            start,
            observer,
            last_x: RefCell::new(None),
            last_lambda: RefCell::new(None),
            violation: RefCell::new(None),
            iters: 0,
        };
        let mut ipopt = Ipopt::new(adapter).map_err(|error| {
            log::error!("{NAME}: cannot create problem: {error}");
            Error::Unsupported {
                backend: NAME,
                reason: "the native solver rejected the problem dimensions",
            }
        })?;

        for (name, value) in config.options.iter() {
            let accepted = match value {
                OptionValue::Int(v) => ipopt.set_option(name, *v).is_some(),
                OptionValue::Num(v) => ipopt.set_option(name, *v).is_some(),
                OptionValue::Str(v) => ipopt.set_option(name, v.as_str()).is_some(),
            };
            if !accepted {
                return Err(ConfigError::Rejected {
                    name: name.to_owned(),
                }
                .into());
            }
        }
        ipopt.set_intermediate_callback(Some(Adapter::intermediate));

        let result = ipopt.solve();
        let adapter = result.solver_data.problem;
        if let Some(violation) = adapter.violation.take() {
            return Err(violation.into());
        }

        let solution = result.solver_data.solution;
        Ok(Solution {
            status: status(result.status),
            x: solution.primal_variables.to_vec(),
            z_lower: solution.lower_bound_multipliers.to_vec(),
            z_upper: solution.upper_bound_multipliers.to_vec(),
            g: result.constraint_values.to_vec(),
            lambda: solution.constraint_multipliers.to_vec(),
            objective: result.objective_value,
            iters: adapter.iters,
        })
    }
}

fn status(status: SolveStatus) -> Status {
    match status {
        SolveStatus::SolveSucceeded => Status::Success,
        SolveStatus::SolvedToAcceptableLevel => Status::StopAtAcceptablePoint,
        SolveStatus::FeasiblePointFound => Status::FeasiblePointFound,
        SolveStatus::InfeasibleProblemDetected => Status::LocalInfeasibility,
        SolveStatus::SearchDirectionBecomesTooSmall => Status::StopAtTinyStep,
        SolveStatus::DivergingIterates => Status::DivergingIterates,
        SolveStatus::UserRequestedStop => Status::UserRequestedStop,
        SolveStatus::MaximumIterationsExceeded => Status::MaxIterExceeded,
        SolveStatus::MaximumCpuTimeExceeded => Status::WallTimeExceeded,
        SolveStatus::RestorationFailed => Status::RestorationFailure,
        SolveStatus::ErrorInStepComputation => Status::ErrorInStepComputation,
        SolveStatus::InvalidNumberDetected => Status::InvalidNumberDetected,
        SolveStatus::NotEnoughDegreesOfFreedom => Status::TooFewDegreesOfFreedom,
        SolveStatus::InsufficientMemory => Status::OutOfMemory,
        SolveStatus::InvalidOption
        | SolveStatus::InvalidProblemDefinition
        | SolveStatus::UnrecoverableException
        | SolveStatus::NonIpoptExceptionThrown
        | SolveStatus::InternalError
        | SolveStatus::UnknownError => Status::InternalError,
    }
}

/// Presents a checked problem through the `ipopt` crate's callback traits.
///
/// Structures are handed over zero-based and Hessian entries in the lower
/// triangle, exactly as [`CheckedProblem`] stores them.
struct Adapter<'c, 'p, P, Obs> {
    problem: &'c CheckedProblem<'p, P>,
    start: Start,
    observer: Obs,
    last_x: RefCell<Option<Vec<f64>>>,
    last_lambda: RefCell<Option<Vec<f64>>>,
    violation: RefCell<Option<ContractError>>,
    iters: usize,
}

impl<P, Obs> Adapter<'_, '_, P, Obs>
where
    P: NlpProblem,
    Obs: Observer<Iteration, Action>,
{
    fn intermediate(&mut self, data: IntermediateCallbackData) -> bool {
        if self.violation.borrow().is_some() {
            return false;
        }

        self.iters = usize::try_from(data.iter_count).unwrap_or_default();
        let event = Iteration {
            iter: self.iters,
            objective: data.obj_value,
            inf_pr: data.inf_pr,
            inf_du: data.inf_du,
            step_norm: data.d_norm,
            alpha: data.alpha_pr,
            ls_trials: usize::try_from(data.ls_trials).unwrap_or_default(),
        };
        !matches!(self.observer.observe(&event), Some(Action::StopEarly))
    }
}

impl<P, Obs> Adapter<'_, '_, P, Obs> {
    fn is_new(cache: &RefCell<Option<Vec<f64>>>, values: &[f64]) -> bool {
        let mut cache = cache.borrow_mut();
        if cache.as_deref() == Some(values) {
            return false;
        }
        *cache = Some(values.to_vec());
        true
    }

    fn new_x(&self, x: &[f64]) -> bool {
        Self::is_new(&self.last_x, x)
    }

    /// Stores a successful result, records a violation, and reports success.
    fn accept<T>(&self, result: Result<T, CallError>, store: impl FnOnce(T)) -> bool {
        match result {
            Ok(values) => {
                store(values);
                true
            }
            Err(CallError::Eval(error)) => {
                log::debug!("{NAME}: evaluation failed: {error}");
                false
            }
            Err(CallError::Contract(violation)) => {
                log::error!("{NAME}: {violation}");
                self.violation.borrow_mut().get_or_insert(violation);
                false
            }
        }
    }
}

fn fill_indices(entries: &[tnlp_core::Entry], rows: &mut [Index], cols: &mut [Index]) -> bool {
    for ((entry, row), col) in entries.iter().zip(rows).zip(cols) {
        match (Index::try_from(entry.row), Index::try_from(entry.col)) {
            (Ok(r), Ok(c)) => {
                *row = r;
                *col = c;
            }
            _ => return false,
        }
    }
    true
}

impl<P: NlpProblem, Obs> BasicProblem for Adapter<'_, '_, P, Obs> {
    fn num_variables(&self) -> usize {
        self.problem.num_variables()
    }

    fn bounds(&self, x_l: &mut [Number], x_u: &mut [Number]) -> bool {
        let bounds = self.problem.raw_bounds();
        x_l.copy_from_slice(&bounds.x_lower);
        x_u.copy_from_slice(&bounds.x_upper);
        true
    }

    fn initial_point(&self, x: &mut [Number]) -> bool {
        x.copy_from_slice(&self.start.x);
        true
    }

    fn initial_bounds_multipliers(&self, z_l: &mut [Number], z_u: &mut [Number]) -> bool {
        match &self.start.z {
            Some((lower, upper)) => {
                z_l.copy_from_slice(lower);
                z_u.copy_from_slice(upper);
            }
            None => {
                z_l.fill(0.0);
                z_u.fill(0.0);
            }
        }
        true
    }

    fn objective(&self, x: &[Number], obj: &mut Number) -> bool {
        let new_x = self.new_x(x);
        self.accept(self.problem.objective(x, new_x), |value| *obj = value)
    }

    fn objective_grad(&self, x: &[Number], grad_f: &mut [Number]) -> bool {
        let new_x = self.new_x(x);
        self.accept(self.problem.gradient(x, new_x), |values| {
            grad_f.copy_from_slice(&values);
        })
    }
}

impl<P: NlpProblem, Obs> ConstrainedProblem for Adapter<'_, '_, P, Obs> {
    fn num_constraints(&self) -> usize {
        self.problem.num_constraints()
    }

    fn num_constraint_jacobian_non_zeros(&self) -> usize {
        self.problem.jacobian_structure().len()
    }

    fn constraint(&self, x: &[Number], g: &mut [Number]) -> bool {
        let new_x = self.new_x(x);
        self.accept(self.problem.constraints(x, new_x), |values| {
            g.copy_from_slice(&values);
        })
    }

    fn constraint_bounds(&self, g_l: &mut [Number], g_u: &mut [Number]) -> bool {
        let bounds = self.problem.raw_bounds();
        g_l.copy_from_slice(&bounds.g_lower);
        g_u.copy_from_slice(&bounds.g_upper);
        true
    }

    fn initial_constraint_multipliers(&self, lambda: &mut [Number]) -> bool {
        match &self.start.lambda {
            Some(values) => lambda.copy_from_slice(values),
            None => lambda.fill(0.0),
        }
        true
    }

    fn constraint_jacobian_indices(&self, rows: &mut [Index], cols: &mut [Index]) -> bool {
        fill_indices(self.problem.jacobian_structure(), rows, cols)
    }

    fn constraint_jacobian_values(&self, x: &[Number], vals: &mut [Number]) -> bool {
        let new_x = self.new_x(x);
        self.accept(self.problem.jacobian_values(x, new_x), |values| {
            vals.copy_from_slice(&values);
        })
    }

    fn num_hessian_non_zeros(&self) -> usize {
        self.problem.hessian_structure().len()
    }

    fn hessian_indices(&self, rows: &mut [Index], cols: &mut [Index]) -> bool {
        fill_indices(self.problem.hessian_structure(), rows, cols)
    }

    fn hessian_values(
        &self,
        x: &[Number],
        obj_factor: Number,
        lambda: &[Number],
        vals: &mut [Number],
    ) -> bool {
        let new_x = self.new_x(x);
        let new_lambda = Self::is_new(&self.last_lambda, lambda);
        self.accept(
            self.problem
                .hessian_values(x, new_x, obj_factor, lambda, new_lambda),
            |values| vals.copy_from_slice(&values),
        )
    }
}
