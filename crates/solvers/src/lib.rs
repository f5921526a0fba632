//! Drivers and backends for [`tnlp_core`] problem definitions.
//!
//! An [`Application`] holds the caller's [`Options`] and a [`Backend`]. Each
//! call to [`Application::optimize`] wraps the problem in a
//! [`CheckedProblem`](contract::CheckedProblem), which rejects inconsistent
//! descriptions before anything is evaluated, hands it to the backend, and
//! finalizes the problem with the terminal solution.
//!
//! # Backends
//!
//! - [`projected::ProjectedNewton`]: built-in projected Newton iteration for
//!   bound-constrained problems
//! - `ipopt::IpoptBackend`: the Ipopt interior-point solver (requires the
//!   `ipopt` feature and a native Ipopt installation)
//!
//! The [`derivative_check`] module verifies user derivatives against finite
//! differences independently of any backend.

mod application;
mod backend;
mod error;

pub mod contract;
pub mod derivative_check;
pub mod options;
pub mod projected;

#[cfg(feature = "ipopt")]
pub mod ipopt;

pub use application::Application;
pub use backend::Backend;
pub use contract::{CheckedProblem, ContractError};
pub use error::Error;
pub use options::{ConfigError, OptionValue, Options};
pub use projected::ProjectedNewton;
