//! loglik_optimizer::types — shared numeric aliases and solver wiring.
//!
//! Canonical aliases for parameter vectors, gradients and scalar costs,
//! the argmin function-evaluation counter map, and pre-wired L-BFGS
//! solver types for each supported line search. The rest of the optimizer
//! refers to these instead of `ndarray` / argmin generics directly.
//!
//! - `Theta` and `Grad` have one entry per free parameter.
//! - `Cost` is the minimized quantity `c(θ) = -ℓ(θ)`; higher layers handle
//!   the sign flip back to the log-likelihood.
use argmin::solver::{
    linesearch::{
        BacktrackingLineSearch, HagerZhangLineSearch, MoreThuenteLineSearch,
        condition::ArmijoCondition,
    },
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Parameter vector `θ` in optimizer (unconstrained) space.
pub type Theta = Array1<f64>;

/// Gradient vector `∇ℓ(θ)` or `∇c(θ)`, matching the shape of `Theta`.
pub type Grad = Array1<f64>;

/// Scalar objective value seen by the solver.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver
/// (e.g. `"cost_count"`, `"gradient_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// Sufficient-decrease constant of the Armijo condition.
pub const ARMIJO_C: f64 = 1e-4;

/// Step contraction factor of the backtracking search.
pub const BACKTRACKING_RHO: f64 = 0.5;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

pub type BacktrackingLS = BacktrackingLineSearch<Theta, Grad, ArmijoCondition<Cost>, Cost>;

/// L-BFGS solver wired to the Hager–Zhang line search.
pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

/// L-BFGS solver wired to the Armijo backtracking line search.
pub type LbfgsBacktracking = LBFGS<BacktrackingLS, Theta, Grad, Cost>;
