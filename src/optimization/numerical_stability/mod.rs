//! numerical_stability — guarded scalar transforms for parameter mapping.
//!
//! Purpose
//! -------
//! Map unconstrained optimizer coordinates to positive or bounded model
//! parameters and back without overflow or catastrophic cancellation. The
//! fitter uses the inverse transforms to place a constrained start vector
//! into optimizer space and the forward transforms to read estimates back.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are finite `f64`; domain checks (positivity, bounds) happen in
//!   the fitting layer, not here.
//! - These helpers never log, allocate or touch global state.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] cover agreement with naïve formulas,
//!   inverse round trips and tail behavior.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    LOGIT_EPS, safe_logistic, safe_logit, safe_softplus, safe_softplus_inv,
};
