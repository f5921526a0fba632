//! Enforcement of the problem callback contract.
//!
//! [`CheckedProblem`] sits between a backend and an [`NlpProblem`]. It asks
//! for the static description once, rejects inconsistent descriptions before
//! anything is evaluated, and checks every later answer against it.

mod error;


pub use error::{BoundArray, BoundSet, CallError, ContractError, Matrix, Quantity};

use std::collections::BTreeMap;

use tnlp_core::{BOUND_INFINITY, Bounds, Entry, NlpInfo, NlpProblem, StartRequest};

/// Thresholds at or beyond which a bound is treated as absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundInfinity {
    pub lower: f64,
    pub upper: f64,
}

impl Default for BoundInfinity {
    fn default() -> Self {
        Self {
            lower: -BOUND_INFINITY,
            upper: BOUND_INFINITY,
        }
    }
}

impl BoundInfinity {
    fn lower(&self, value: f64) -> f64 {
        if value <= self.lower {
            f64::NEG_INFINITY
        } else {
            value
        }
    }

    fn upper(&self, value: f64) -> f64 {
        if value >= self.upper {
            f64::INFINITY
        } else {
            value
        }
    }
}

/// A validated starting point.
///
/// `x` is always present; multiplier estimates are passed through when the
/// problem supplied them.
#[derive(Debug, Clone, PartialEq)]
pub struct Start {
    pub x: Vec<f64>,
    pub z: Option<(Vec<f64>, Vec<f64>)>,
    pub lambda: Option<Vec<f64>>,
}

/// A problem whose description has been checked against the contract.
///
/// Structures are stored zero-based; Hessian entries are mirrored into the
/// lower triangle. Bounds beyond the [`BoundInfinity`] thresholds become
/// `±f64::INFINITY`.
#[derive(Debug)]
pub struct CheckedProblem<'p, P> {
    problem: &'p P,
    info: NlpInfo,
    bounds: Bounds,
    x_lower: Vec<f64>,
    x_upper: Vec<f64>,
    g_lower: Vec<f64>,
    g_upper: Vec<f64>,
    jacobian: Vec<Entry>,
    hessian: Vec<Entry>,
}

impl<'p, P: NlpProblem> CheckedProblem<'p, P> {
    /// Queries and validates the static description of `problem`.
    ///
    /// Dimensions, bounds and both sparse structures are each requested
    /// exactly once.
    ///
    /// # Errors
    ///
    /// Returns a [`ContractError`] describing the first inconsistency found.
    pub fn new(problem: &'p P, infinity: BoundInfinity) -> Result<Self, ContractError> {
        let info = problem.info();
        let n = info.num_variables;
        let m = info.num_constraints;

        if n == 0 {
            return Err(ContractError::NoVariables);
        }
        if (m == 0) != (info.jacobian_nonzeros == 0) {
            return Err(ContractError::JacobianMismatch {
                constraints: m,
                nonzeros: info.jacobian_nonzeros,
            });
        }

        let bounds = problem.bounds();
        check_length(BoundArray::VariableLower, n, bounds.x_lower.len())?;
        check_length(BoundArray::VariableUpper, n, bounds.x_upper.len())?;
        check_length(BoundArray::ConstraintLower, m, bounds.g_lower.len())?;
        check_length(BoundArray::ConstraintUpper, m, bounds.g_upper.len())?;
        check_order(BoundSet::Variables, &bounds.x_lower, &bounds.x_upper)?;
        check_order(BoundSet::Constraints, &bounds.g_lower, &bounds.g_upper)?;

        let jacobian = normalize_jacobian(&info, problem.jacobian_structure())?;
        let hessian = normalize_hessian(&info, problem.hessian_structure())?;

        let x_lower = bounds.x_lower.iter().map(|&v| infinity.lower(v)).collect();
        let x_upper = bounds.x_upper.iter().map(|&v| infinity.upper(v)).collect();
        let g_lower = bounds.g_lower.iter().map(|&v| infinity.lower(v)).collect();
        let g_upper = bounds.g_upper.iter().map(|&v| infinity.upper(v)).collect();

        Ok(Self {
            problem,
            info,
            bounds,
            x_lower,
            x_upper,
            g_lower,
            g_upper,
            jacobian,
            hessian,
        })
    }

    /// Returns the underlying problem.
    #[must_use]
    pub fn problem(&self) -> &'p P {
        self.problem
    }

    /// Returns the dimensions reported by the problem.
    #[must_use]
    pub fn info(&self) -> &NlpInfo {
        &self.info
    }

    /// Returns the number of variables (`n`).
    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.info.num_variables
    }

    /// Returns the number of constraints (`m`).
    #[must_use]
    pub fn num_constraints(&self) -> usize {
        self.info.num_constraints
    }

    /// Returns the bounds exactly as the problem reported them.
    #[must_use]
    pub fn raw_bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Returns variable lower bounds, `-inf` where absent.
    #[must_use]
    pub fn x_lower(&self) -> &[f64] {
        &self.x_lower
    }

    /// Returns variable upper bounds, `+inf` where absent.
    #[must_use]
    pub fn x_upper(&self) -> &[f64] {
        &self.x_upper
    }

    /// Returns constraint lower bounds, `-inf` where absent.
    #[must_use]
    pub fn g_lower(&self) -> &[f64] {
        &self.g_lower
    }

    /// Returns constraint upper bounds, `+inf` where absent.
    #[must_use]
    pub fn g_upper(&self) -> &[f64] {
        &self.g_upper
    }

    /// Returns the zero-based Jacobian structure.
    #[must_use]
    pub fn jacobian_structure(&self) -> &[Entry] {
        &self.jacobian
    }

    /// Returns the zero-based, lower-triangular Hessian structure.
    #[must_use]
    pub fn hessian_structure(&self) -> &[Entry] {
        &self.hessian
    }

    /// Requests a starting point and checks its lengths.
    ///
    /// A missing iterate defaults to zeros clipped into the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Eval`] if the problem fails, or
    /// [`CallError::Contract`] if any returned array has the wrong length.
    pub fn starting_point(&self, request: StartRequest) -> Result<Start, CallError> {
        let n = self.num_variables();
        let m = self.num_constraints();
        let start = self.problem.starting_point(request).map_err(CallError::eval)?;

        let x = match start.x {
            Some(x) => {
                check_values(Quantity::StartX, n, x.len())?;
                x
            }
            None => self
                .x_lower
                .iter()
                .zip(&self.x_upper)
                .map(|(&lo, &hi)| 0.0_f64.clamp(lo, hi))
                .collect(),
        };
        if let Some((z_lower, z_upper)) = &start.z {
            check_values(Quantity::StartZLower, n, z_lower.len())?;
            check_values(Quantity::StartZUpper, n, z_upper.len())?;
        }
        if let Some(lambda) = &start.lambda {
            check_values(Quantity::StartLambda, m, lambda.len())?;
        }

        Ok(Start {
            x,
            z: start.z,
            lambda: start.lambda,
        })
    }

    /// Evaluates the objective.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Eval`] if the problem cannot evaluate at `x`.
    pub fn objective(&self, x: &[f64], new_x: bool) -> Result<f64, CallError> {
        self.problem.objective(x, new_x).map_err(CallError::eval)
    }

    /// Evaluates the objective gradient and checks its length.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Eval`] on evaluation failure, or
    /// [`CallError::Contract`] on a length mismatch.
    pub fn gradient(&self, x: &[f64], new_x: bool) -> Result<Vec<f64>, CallError> {
        let values = self.problem.gradient(x, new_x).map_err(CallError::eval)?;
        check_values(Quantity::Gradient, self.num_variables(), values.len())?;
        Ok(values)
    }

    /// Evaluates the constraints and checks their length.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Eval`] on evaluation failure, or
    /// [`CallError::Contract`] on a length mismatch.
    pub fn constraints(&self, x: &[f64], new_x: bool) -> Result<Vec<f64>, CallError> {
        let values = self.problem.constraints(x, new_x).map_err(CallError::eval)?;
        check_values(Quantity::Constraints, self.num_constraints(), values.len())?;
        Ok(values)
    }

    /// Evaluates the Jacobian nonzeros and checks their count.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Eval`] on evaluation failure, or
    /// [`CallError::Contract`] on a length mismatch.
    pub fn jacobian_values(&self, x: &[f64], new_x: bool) -> Result<Vec<f64>, CallError> {
        let values = self
            .problem
            .jacobian_values(x, new_x)
            .map_err(CallError::eval)?;
        check_values(Quantity::JacobianValues, self.jacobian.len(), values.len())?;
        Ok(values)
    }

    /// Evaluates the Hessian nonzeros and checks their count.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::Eval`] on evaluation failure, or
    /// [`CallError::Contract`] on a length mismatch.
    pub fn hessian_values(
        &self,
        x: &[f64],
        new_x: bool,
        obj_factor: f64,
        lambda: &[f64],
        new_lambda: bool,
    ) -> Result<Vec<f64>, CallError> {
        let values = self
            .problem
            .hessian_values(x, new_x, obj_factor, lambda, new_lambda)
            .map_err(CallError::eval)?;
        check_values(Quantity::HessianValues, self.hessian.len(), values.len())?;
        Ok(values)
    }
}

fn check_length(array: BoundArray, expected: usize, actual: usize) -> Result<(), ContractError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ContractError::BoundsLength {
            array,
            expected,
            actual,
        })
    }
}

fn check_order(set: BoundSet, lower: &[f64], upper: &[f64]) -> Result<(), ContractError> {
    for (index, (&lo, &hi)) in lower.iter().zip(upper).enumerate() {
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(ContractError::InvalidBounds {
                set,
                index,
                lower: lo,
                upper: hi,
            });
        }
    }
    Ok(())
}

fn check_values(quantity: Quantity, expected: usize, actual: usize) -> Result<(), ContractError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ContractError::ValuesLength {
            quantity,
            expected,
            actual,
        })
    }
}

fn check_count(matrix: Matrix, declared: usize, returned: usize) -> Result<(), ContractError> {
    if declared == returned {
        Ok(())
    } else {
        Err(ContractError::StructureLength {
            matrix,
            declared,
            returned,
        })
    }
}

/// Converts one raw entry to zero-based indices and range-checks it.
fn to_zero_based(
    info: &NlpInfo,
    matrix: Matrix,
    position: usize,
    entry: Entry,
    rows: usize,
    cols: usize,
) -> Result<Entry, ContractError> {
    let style = info.index_style;
    match (style.to_zero_based(entry.row), style.to_zero_based(entry.col)) {
        (Some(row), Some(col)) if row < rows && col < cols => Ok(Entry::new(row, col)),
        _ => Err(ContractError::IndexOutOfRange {
            matrix,
            position,
            row: entry.row,
            col: entry.col,
        }),
    }
}

fn normalize_jacobian(info: &NlpInfo, raw: Vec<Entry>) -> Result<Vec<Entry>, ContractError> {
    check_count(Matrix::Jacobian, info.jacobian_nonzeros, raw.len())?;
    raw.into_iter()
        .enumerate()
        .map(|(position, entry)| {
            to_zero_based(
                info,
                Matrix::Jacobian,
                position,
                entry,
                info.num_constraints,
                info.num_variables,
            )
        })
        .collect()
}

fn normalize_hessian(info: &NlpInfo, raw: Vec<Entry>) -> Result<Vec<Entry>, ContractError> {
    check_count(Matrix::Hessian, info.hessian_nonzeros, raw.len())?;
    let n = info.num_variables;

    // Lower-triangle position → whether it was first given in the upper triangle.
    let mut seen: BTreeMap<Entry, bool> = BTreeMap::new();
    let mut normalized = Vec::with_capacity(raw.len());

    for (position, entry) in raw.into_iter().enumerate() {
        let entry = to_zero_based(info, Matrix::Hessian, position, entry, n, n)?;
        let from_upper = entry.row < entry.col;
        let lower = if from_upper { entry.transposed() } else { entry };

        if !lower.is_diagonal() {
            match seen.get(&lower) {
                Some(&upper) if upper != from_upper => {
                    return Err(ContractError::SymmetricDuplicate {
                        row: lower.row,
                        col: lower.col,
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(lower, from_upper);
                }
            }
        }
        normalized.push(lower);
    }

    Ok(normalized)
}
