use std::{error::Error as StdError, fmt};

use thiserror::Error;

/// A sparse matrix described by the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matrix {
    Jacobian,
    Hessian,
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jacobian => f.write_str("constraint Jacobian"),
            Self::Hessian => f.write_str("Lagrangian Hessian"),
        }
    }
}

/// One of the four bound arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundArray {
    VariableLower,
    VariableUpper,
    ConstraintLower,
    ConstraintUpper,
}

impl fmt::Display for BoundArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VariableLower => f.write_str("variable lower"),
            Self::VariableUpper => f.write_str("variable upper"),
            Self::ConstraintLower => f.write_str("constraint lower"),
            Self::ConstraintUpper => f.write_str("constraint upper"),
        }
    }
}

/// Variable or constraint bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSet {
    Variables,
    Constraints,
}

impl fmt::Display for BoundSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variables => f.write_str("variable"),
            Self::Constraints => f.write_str("constraint"),
        }
    }
}

/// An array returned by an evaluation or starting-point callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Gradient,
    Constraints,
    JacobianValues,
    HessianValues,
    StartX,
    StartZLower,
    StartZUpper,
    StartLambda,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gradient => "objective gradient",
            Self::Constraints => "constraint values",
            Self::JacobianValues => "Jacobian values",
            Self::HessianValues => "Hessian values",
            Self::StartX => "starting point",
            Self::StartZLower => "initial lower bound multipliers",
            Self::StartZUpper => "initial upper bound multipliers",
            Self::StartLambda => "initial constraint multipliers",
        };
        f.write_str(name)
    }
}

/// Ways a problem definition can break the callback contract.
///
/// All of these are fatal: a solve never starts, or is aborted, when one is
/// detected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContractError {
    #[error("problem declares no variables")]
    NoVariables,

    #[error("problem declares {constraints} constraints but {nonzeros} Jacobian nonzeros")]
    JacobianMismatch { constraints: usize, nonzeros: usize },

    #[error("{array} bounds have length {actual}, expected {expected}")]
    BoundsLength {
        array: BoundArray,
        expected: usize,
        actual: usize,
    },

    #[error("{set} bounds at index {index} are invalid: lower {lower}, upper {upper}")]
    InvalidBounds {
        set: BoundSet,
        index: usize,
        lower: f64,
        upper: f64,
    },

    #[error("{matrix} structure has {returned} entries but {declared} were declared")]
    StructureLength {
        matrix: Matrix,
        declared: usize,
        returned: usize,
    },

    #[error("{matrix} entry {position} at ({row}, {col}) is out of range")]
    IndexOutOfRange {
        matrix: Matrix,
        position: usize,
        row: usize,
        col: usize,
    },

    #[error("Lagrangian Hessian lists ({row}, {col}) in both triangles")]
    SymmetricDuplicate { row: usize, col: usize },

    #[error("{quantity} has length {actual}, expected {expected}")]
    ValuesLength {
        quantity: Quantity,
        expected: usize,
        actual: usize,
    },
}

/// Errors from a single callback made through a checked problem.
#[derive(Debug, Error)]
pub enum CallError {
    /// The problem could not evaluate at the requested point.
    #[error("evaluation failed")]
    Eval(#[source] Box<dyn StdError + Send + Sync>),

    /// The answer broke the contract.
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl CallError {
    pub(crate) fn eval<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Eval(Box::new(error))
    }
}
