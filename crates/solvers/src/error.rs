use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    contract::{CallError, ContractError},
    options::ConfigError,
};

/// Errors that prevent a solve from starting or force it to abort.
///
/// None of these reach [`NlpProblem::finalize`]; a solve that ends in a
/// terminal status, even a failing one, is reported through a `Solution`
/// instead.
///
/// [`NlpProblem::finalize`]: tnlp_core::NlpProblem::finalize
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("problem definition breaks the callback contract: {0}")]
    Contract(#[from] ContractError),

    #[error("application must be initialized before solving")]
    NotInitialized,

    #[error("{backend} backend cannot solve this problem: {reason}")]
    Unsupported {
        backend: &'static str,
        reason: &'static str,
    },

    #[error("failed to compute starting point")]
    StartingPoint(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    /// Classifies a failed starting-point request.
    pub(crate) fn from_start(error: CallError) -> Self {
        match error {
            CallError::Eval(source) => Self::StartingPoint(source),
            CallError::Contract(violation) => Self::Contract(violation),
        }
    }
}
