//! Adapter that exposes a [`LogLikelihood`] as an `argmin` problem.
//!
//! Maximizing `ℓ(θ)` becomes minimizing `c(θ) = -ℓ(θ)`, and the gradient is
//! negated accordingly.
//!
//! Two cost modes:
//! - strict (default): a non-finite `ℓ(θ)` is an error, which ends a
//!   More–Thuente or Hager–Zhang line search;
//! - infeasible-as-infinite: a non-finite `ℓ(θ)` at a finite `θ` becomes a
//!   `+∞` cost, which an Armijo backtracking search rejects by shrinking the
//!   step. Non-finite `θ` is still an error in this mode, so a search cannot
//!   loop on a NaN direction.
use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};

/// Bridges a [`LogLikelihood`] to `argmin`'s `CostFunction` and `Gradient`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
    pub infeasible_as_infinite: bool,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    /// Strict adapter: non-finite values are errors.
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data, infeasible_as_infinite: false }
    }

    /// Adapter for backtracking searches: non-finite values at finite `θ`
    /// become a `+∞` cost.
    pub fn infeasible_as_infinite(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data, infeasible_as_infinite: true }
    }
}

impl<'a, F: LogLikelihood> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// # Errors
    /// - Propagates objective errors.
    /// - `InvalidThetaInput` for a non-finite trial point.
    /// - `NonFiniteCost` when `ℓ(θ)` is NaN or infinite in strict mode.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err((OptError::InvalidThetaInput { index, value }).into());
        }
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            if self.infeasible_as_infinite {
                return Ok(f64::INFINITY);
            }
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(-output)
    }
}

impl<'a, F: LogLikelihood> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// # Errors
    /// - Objective gradient errors.
    /// - Dimension / finiteness validation failures.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let g = self.f.grad(theta, self.data)?;
        validate_grad(&g, theta.len())?;
        Ok(-g)
    }
}
