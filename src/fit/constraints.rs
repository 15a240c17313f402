//! Parameter constraints as a symbolic reparameterisation.
//!
//! Purpose
//! -------
//! Keep fitted parameters inside their feasible set without a bounded
//! solver. Each constrained parameter `θ_i` is replaced in the objective by
//! a smooth map of a free coordinate `φ_i`:
//!
//! | Constraint            | `θ = g(φ)`                              | start `φ₀ = g⁻¹(θ₀)`           |
//! |-----------------------|-----------------------------------------|--------------------------------|
//! | `Unbounded`           | `φ`                                     | `θ₀`                           |
//! | `Positive`            | `softplus(φ)`                           | `safe_softplus_inv(θ₀)`        |
//! | `Bounded{lower,upper}`| `lower + (upper - lower) · logistic(φ)` | `safe_logit((θ₀-lower)/width)` |
//!
//! The substitution happens on the expression graph, so the gradient the
//! optimizer sees is still exact. `softplus` and `logistic` are guarded
//! primitives: `Positive` stays strictly positive for φ down to about -745
//! and neither map overflows for large |φ|.
//!
//! Invariants & assumptions
//! ------------------------
//! - An empty constraint list is the identity map; no free symbols are
//!   introduced.
//! - A non-empty list has one entry per parameter, finite bounds with
//!   `lower < upper`, and a start strictly inside every feasible set.
use crate::{
    fit::options::ParamConstraint,
    model::errors::{ModelError, ModelResult},
    optimization::{
        loglik_optimizer::Theta,
        numerical_stability::{safe_logistic, safe_logit, safe_softplus, safe_softplus_inv},
    },
    symbolic::{Expr, Substitution, Symbol},
};

impl ParamConstraint {
    /// Symbolic `θ = g(φ)`.
    pub(crate) fn forward_expr(&self, phi: &Expr) -> Expr {
        match *self {
            ParamConstraint::Unbounded => phi.clone(),
            ParamConstraint::Positive => phi.softplus(),
            ParamConstraint::Bounded { lower, upper } => lower + (upper - lower) * phi.logistic(),
        }
    }

    /// Numeric `θ = g(φ)`.
    pub(crate) fn forward(&self, phi: f64) -> f64 {
        match *self {
            ParamConstraint::Unbounded => phi,
            ParamConstraint::Positive => safe_softplus(phi),
            ParamConstraint::Bounded { lower, upper } => lower + (upper - lower) * safe_logistic(phi),
        }
    }

    /// Numeric `φ = g⁻¹(θ)`.
    pub(crate) fn inverse(&self, theta: f64) -> f64 {
        match *self {
            ParamConstraint::Unbounded => theta,
            ParamConstraint::Positive => safe_softplus_inv(theta),
            ParamConstraint::Bounded { lower, upper } => safe_logit((theta - lower) / (upper - lower)),
        }
    }

    fn validate(&self, index: usize, start: f64) -> ModelResult<()> {
        let invalid = |reason: String| Err(ModelError::InvalidConstraint { index, reason });
        match *self {
            ParamConstraint::Unbounded => Ok(()),
            ParamConstraint::Positive if start <= 0.0 => {
                invalid(format!("start value {start} is not strictly positive"))
            }
            ParamConstraint::Positive => Ok(()),
            ParamConstraint::Bounded { lower, upper } if !lower.is_finite() || !upper.is_finite() => {
                invalid(format!("bounds ({lower}, {upper}) must be finite"))
            }
            ParamConstraint::Bounded { lower, upper } if lower >= upper => {
                invalid(format!("lower bound {lower} is not below upper bound {upper}"))
            }
            ParamConstraint::Bounded { lower, upper } if start <= lower || start >= upper => {
                invalid(format!("start value {start} lies outside ({lower}, {upper})"))
            }
            ParamConstraint::Bounded { .. } => Ok(()),
        }
    }
}

/// Validated mapping between model parameters and optimizer coordinates.
#[derive(Debug, Clone)]
pub(crate) struct Reparam {
    constraints: Vec<ParamConstraint>,
    free: Vec<Symbol>,
}

impl Reparam {
    /// Validate `constraints` against the start vector.
    ///
    /// # Errors
    /// - [`ModelError::Shape`] when a non-empty list does not have one entry
    ///   per parameter.
    /// - [`ModelError::InvalidConstraint`] for non-finite or inverted bounds,
    ///   or a start outside the feasible set.
    pub(crate) fn new(constraints: &[ParamConstraint], start: &[f64]) -> ModelResult<Self> {
        if constraints.is_empty() {
            return Ok(Self { constraints: Vec::new(), free: Vec::new() });
        }
        if constraints.len() != start.len() {
            return Err(ModelError::shape(format!(
                "{} constraints given for {} parameters",
                constraints.len(),
                start.len()
            )));
        }
        for (index, (c, &s)) in constraints.iter().zip(start).enumerate() {
            c.validate(index, s)?;
        }
        let free = (0..constraints.len()).map(|i| Symbol::new(format!("phi_{i}"))).collect();
        Ok(Self { constraints: constraints.to_vec(), free })
    }

    pub(crate) fn is_identity(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Rewrite `expr` (in the model parameter symbols) in optimizer
    /// coordinates; returns the argument symbols and the rewritten expression.
    pub(crate) fn apply(&self, expr: &Expr, params: &[Symbol]) -> (Vec<Expr>, Expr) {
        if self.is_identity() {
            return (params.iter().map(Expr::from_symbol).collect(), expr.clone());
        }
        let free: Vec<Expr> = self.free.iter().map(Expr::from_symbol).collect();
        let subs: Substitution = params
            .iter()
            .zip(&self.constraints)
            .zip(&free)
            .map(|((p, c), phi)| (p.clone(), c.forward_expr(phi)))
            .collect();
        (free, expr.substitute(&subs))
    }

    pub(crate) fn to_free(&self, theta: &[f64]) -> Theta {
        if self.is_identity() {
            return Theta::from(theta.to_vec());
        }
        theta.iter().zip(&self.constraints).map(|(&t, c)| c.inverse(t)).collect()
    }

    pub(crate) fn to_model(&self, phi: &Theta) -> Theta {
        if self.is_identity() {
            return phi.clone();
        }
        phi.iter().zip(&self.constraints).map(|(&p, c)| c.forward(p)).collect()
    }
}
