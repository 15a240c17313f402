//! Numerical stability utilities.
//!
//! Guarded implementations of the scalar transforms used to move parameters
//! between constrained model space and unconstrained optimizer space. Each
//! uses an explicit cutoff (`|x| > 20`) to keep `f64` arithmetic
//! well-conditioned.
//!
//! - [`safe_softplus`]: `ln(1 + exp(x))`, ℝ → (0, ∞).
//! - [`safe_softplus_inv`]: inverse of softplus, (0, ∞) → ℝ.
//! - [`safe_logistic`]: `1 / (1 + exp(-x))`, ℝ → (0, 1).
//! - [`safe_logit`]: inverse of the logistic, (0, 1) → ℝ, with inputs clamped
//!   [`LOGIT_EPS`] away from the endpoints.

/// Clamp margin for [`safe_logit`]; keeps the result finite at 0 and 1.
pub const LOGIT_EPS: f64 = 1e-12;

const CUTOFF: f64 = 20.0;

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
///
/// For large `x`, `softplus(x) ≈ x`; otherwise `ln1p(exp(x))`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > CUTOFF { x } else { x.exp().ln_1p() }
}

/// Stable inverse of softplus on `(0, ∞)`: `t = ln(exp(x) - 1)`.
///
/// For large `x`, `t ≈ x`; otherwise `ln(expm1(x))`. Non-positive inputs
/// return `-∞` / NaN; callers validate positivity first.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > CUTOFF { x } else { x.exp_m1().ln() }
}

/// Numerically stable logistic: `σ(x) = 1 / (1 + exp(-x))`.
///
/// Evaluated through `exp(-|x|)` so neither tail overflows.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Inverse logistic: `logit(p) = ln(p / (1 - p))`.
///
/// `p` is clamped to `[LOGIT_EPS, 1 - LOGIT_EPS]`.
pub fn safe_logit(p: f64) -> f64 {
    let p = p.clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
    p.ln() - (-p).ln_1p()
}
