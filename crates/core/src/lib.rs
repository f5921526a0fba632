//! The callback contract between nonlinear programs and the solvers that
//! drive them.
//!
//! A problem definition is passive: a solver asks it for dimensions, bounds,
//! a starting point and function values until it reaches a terminal state,
//! then hands back the result once.
//!
//! - [`NlpProblem`]: the nine callbacks a problem answers
//! - [`NlpInfo`], [`Bounds`], [`StartingPoint`], [`Entry`]: what those
//!   callbacks describe
//! - [`Solution`], [`Status`]: the terminal record a solver hands back
//! - [`Observer`], [`Iteration`], [`Action`]: per-iteration monitoring and
//!   early stopping

mod bounds;
mod info;
mod iteration;
mod observer;
mod problem;
mod solution;
mod sparse;
mod start;

pub use bounds::{BOUND_INFINITY, Bounds};
pub use info::{IndexStyle, NlpInfo};
pub use iteration::{Action, Iteration};
pub use observer::Observer;
pub use problem::NlpProblem;
pub use solution::{Solution, Status};
pub use sparse::Entry;
pub use start::{StartRequest, StartingPoint};
