//! loglik_optimizer — argmin-powered log-likelihood maximizer.
//!
//! Purpose
//! -------
//! Provide the optimization layer the fitter runs once per (design,
//! replicate) cell. Callers implement a single trait, [`LogLikelihood`], and
//! invoke [`maximize`] to run L-BFGS with a configurable line search,
//! tolerances and an optional wall-clock timeout.
//!
//! Key behaviors
//! -------------
//! - Convert log-likelihoods `ℓ(θ)` into argmin cost functions
//!   `c(θ) = -ℓ(θ)` via [`adapter::ArgMinAdapter`].
//! - [`maximize`] validates the start with [`LogLikelihood::check`], picks an
//!   L-BFGS solver from [`builders`], executes it via [`run::run_lbfgs`] and
//!   normalizes the result into an [`OptimOutcome`].
//! - A More–Thuente or Hager–Zhang run that ends on a failed line search
//!   (typically a trial step where `ℓ` is not finite) resumes from its best
//!   point with an Armijo backtracking search.
//! - Centralize configuration ([`Tolerances`], [`MLEOptions`]) and validation
//!   ([`validation`]) so downstream code can assume finite inputs.
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **always maximizes** `ℓ(θ)` by minimizing `-ℓ(θ)`;
//!   objectives implement `ℓ(θ)` and `∇ℓ(θ)`, never the cost.
//! - Objective failures are recoverable
//!   [`OptError`](crate::optimization::errors::OptError) values, not panics.
//! - [`OptimOutcome::converged`] is `true` only for `SolverConverged` and
//!   `TargetCostReached`; the fitter turns everything else into a
//!   non-convergence error.
//!
//! Conventions
//! -----------
//! - Parameters live in an unconstrained optimizer space as [`Theta`].
//!   Mapping constrained model parameters to that space happens in
//!   [`crate::fit`].
//! - Errors bubble up as `OptResult<T>` / `OptError`.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover sign conventions and cost modes in
//!   [`adapter`], solver construction in [`builders`], end-to-end runs in
//!   [`api`], and configuration/outcome invariants in [`traits`].

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};
