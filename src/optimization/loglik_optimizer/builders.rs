//! loglik_optimizer::builders — L-BFGS solver construction.
//!
//! Purpose
//! -------
//! Hide argmin's generic wiring behind one builder per line search and apply
//! the tolerance and memory settings from [`MLEOptions`].
//!
//! Conventions
//! -----------
//! - Builders never set the initial parameter vector, `max_iters` or the
//!   timeout; those are executor concerns applied in `run_lbfgs`.
//! - L-BFGS memory is `opts.lbfgs_mem` or [`DEFAULT_LBFGS_MEM`].
//! - A `None` tolerance leaves argmin's default in place.
//! - argmin configuration errors surface as `OptError` via
//!   `From<argmin::core::Error>`.
use argmin::solver::{linesearch::condition::ArmijoCondition, quasinewton::LBFGS};

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::MLEOptions,
        types::{
            ARMIJO_C, BACKTRACKING_RHO, BacktrackingLS, Cost, DEFAULT_LBFGS_MEM, Grad,
            HagerZhangLS, LbfgsBacktracking, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS,
            Theta,
        },
    },
};

/// Construct L-BFGS with the Hager–Zhang line search.
///
/// # Errors
/// - `OptError` when argmin rejects a tolerance.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsHagerZhang::new(HagerZhangLS::new(), mem), opts)
}

/// Construct L-BFGS with the More–Thuente line search.
///
/// # Errors
/// - `OptError` when argmin rejects a tolerance.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsMoreThuente::new(MoreThuenteLS::new(), mem), opts)
}

/// Construct L-BFGS with an Armijo backtracking line search
/// ([`ARMIJO_C`], contraction [`BACKTRACKING_RHO`]).
///
/// # Errors
/// - `OptError` when argmin rejects a tolerance or a line-search constant.
pub fn build_optimizer_backtracking(opts: &MLEOptions) -> OptResult<LbfgsBacktracking> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let linesearch = BacktrackingLS::new(ArmijoCondition::new(ARMIJO_C)?).rho(BACKTRACKING_RHO)?;
    configure_lbfgs(LbfgsBacktracking::new(linesearch, mem), opts)
}

/// Apply the optional gradient-norm and cost-change tolerances to an
/// L-BFGS solver, whatever its line search.
///
/// # Errors
/// - `OptError` when `with_tolerance_grad` / `with_tolerance_cost` fail.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}
