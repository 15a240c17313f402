//! fit — maximum-likelihood parameter estimation.
//!
//! Purpose
//! -------
//! Provide [`Model::fit`](crate::model::Model::fit): compose per-observation
//! log-likelihoods across input rows and observed values into one scalar
//! objective per (design, replicate) cell and maximise it with the L-BFGS
//! driver in [`crate::optimization`].
//!
//! Key behaviors
//! -------------
//! - Exact gradients: the objective and its gradient are compiled from the
//!   same symbolic expression.
//! - Optional per-parameter constraints ([`ParamConstraint`]) implemented as
//!   a smooth reparameterisation, so the unconstrained solver stays in use.
//! - Shape-preserving: the result nesting equals the input nesting.
//! - Optional rayon parallelism across independent cells.
//!
//! Invariants & assumptions
//! ------------------------
//! - Fitting never returns partial results: any non-converged cell fails the
//!   call with `ModelError::OptimizerNonConvergence`.

mod constraints;
mod fitter;
mod objective;
pub mod options;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::options::{FitOptions, ParamConstraint};
