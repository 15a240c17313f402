//! optimization — MLE stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer behind model fitting: an argmin-backed
//! log-likelihood maximizer, numerically stable parameter transforms, and a
//! single error/result surface for configuration and solver failures.
//!
//! Key behaviors
//! -------------
//! - `loglik_optimizer`: maximize `ℓ(θ)` with L-BFGS, configurable line
//!   search, tolerances, iteration cap and timeout.
//! - `numerical_stability`: softplus / logistic transforms and their
//!   inverses for constrained parameters.
//! - `errors`: `OptError` / `OptResult<T>`, including conversions from
//!   argmin errors and symbolic evaluation errors.
//!
//! Conventions
//! -----------
//! - Solvers maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; outcomes are
//!   expressed in terms of `ℓ`.
//! - This layer knows nothing about models, observations or designs; the
//!   fitter in [`crate::fit`] builds the objective and interprets outcomes.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

// ---- Convenience prelude ---------------------------------------------------

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::{
        LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Theta, Tolerances, maximize,
    };
}
