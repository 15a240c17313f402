//! Distribution families and their symbolic likelihood / FIM derivations.
//!
//! This module defines [`Distribution`], the closed set of observation
//! families a model may declare, and the per-family derivation of
//!
//! - the per-sample log-likelihood `ℓ(y | θ, x)` as a symbolic expression in
//!   the observed value `y`, the parameters `θ` and the inputs `x`, and
//! - the per-sample Fisher Information Matrix `I(θ; x)`, which depends on
//!   `θ` and `x` only (it is an expectation over `y`).
//!
//! ## Supported families
//! | Family        | Statistics                  | Log-likelihood                                     | FIM                                      |
//! |---------------|-----------------------------|----------------------------------------------------|------------------------------------------|
//! | `Normal`      | mean μ, variance σ²         | `-½ ln(2πσ²) - (y-μ)²/(2σ²)`                       | `∇μ∇μᵀ/σ² + ∇σ²∇σ²ᵀ/(2σ⁴)`               |
//! | `Poisson`     | rate λ                      | `y ln λ - ln(y!) - λ`                              | `∇λ∇λᵀ/λ`                                |
//! | `Lognormal`   | μ, σ² of `ln y`             | `-ln y - ½ ln(2πσ²) - (ln y-μ)²/(2σ²)`             | as Normal                                |
//! | `Exponential` | rate λ                      | `ln λ - λy`                                        | `∇λ∇λᵀ/λ²`                               |
//!
//! `Binomial` and `Gamma` are recognised tags without a derivation; models
//! declaring them fail at construction with
//! [`ModelError::UnsupportedDistribution`].
//!
//! ## Numerics
//! - Gradients `∇` are exact symbolic Jacobians with respect to the parameter
//!   symbols only, never the inputs.
//! - `ln(y!)` is the [`Expr::ln_factorial`] primitive (log-gamma based, zero
//!   derivative).
use crate::{
    model::errors::{ModelError, ModelResult},
    symbolic::{Expr, jacobian},
};
use std::{f64::consts::PI, fmt, str::FromStr};

/// Observation distribution families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Distribution {
    /// Statistics `(mean, variance)`.
    Normal,
    /// Statistic `(rate)`.
    Poisson,
    /// Statistics `(mean, variance)` of `ln y`.
    Lognormal,
    /// Recognised, not derivable.
    Binomial,
    /// Statistic `(rate)`.
    Exponential,
    /// Recognised, not derivable.
    Gamma,
}

/// Symbolic output of a family derivation.
#[derive(Debug, Clone)]
pub struct Derivation {
    /// Per-sample log-likelihood in `(y, θ, x)`.
    pub loglik: Expr,
    /// Per-sample FIM in `(θ, x)`, `n_params × n_params`, symmetric.
    pub fim: Vec<Vec<Expr>>,
}

impl Distribution {
    pub const ALL: [Distribution; 6] = [
        Distribution::Normal,
        Distribution::Poisson,
        Distribution::Lognormal,
        Distribution::Binomial,
        Distribution::Exponential,
        Distribution::Gamma,
    ];

    /// Canonical family tag, as accepted by [`FromStr`].
    pub const fn tag(&self) -> &'static str {
        match self {
            Distribution::Normal => "Normal",
            Distribution::Poisson => "Poisson",
            Distribution::Lognormal => "Lognormal",
            Distribution::Binomial => "Binomial",
            Distribution::Exponential => "Exponential",
            Distribution::Gamma => "Gamma",
        }
    }

    /// Number of sufficient statistics the statistic function must return.
    pub const fn n_statistics(&self) -> usize {
        match self {
            Distribution::Normal | Distribution::Lognormal => 2,
            Distribution::Poisson | Distribution::Exponential => 1,
            Distribution::Binomial | Distribution::Gamma => 2,
        }
    }

    /// Whether a likelihood / FIM derivation exists for this family.
    pub const fn is_derivable(&self) -> bool {
        !matches!(self, Distribution::Binomial | Distribution::Gamma)
    }

    /// Derive the per-sample log-likelihood and FIM for one observation.
    ///
    /// - `observation`: name used in error messages.
    /// - `y`: symbol standing for one observed value.
    /// - `stats`: statistic expressions in `(θ, x)`, length
    ///   [`n_statistics`](Self::n_statistics).
    /// - `params`: parameter symbols; the FIM is taken with respect to these.
    ///
    /// # Errors
    /// - [`ModelError::UnsupportedDistribution`] for `Binomial` / `Gamma`.
    /// - [`ModelError::DimensionMismatch`] if `stats` has the wrong length.
    /// - [`ModelError::Symbolic`] if `params` are not pure symbols.
    pub fn derive(
        &self, observation: &str, y: &Expr, stats: &[Expr], params: &[Expr],
    ) -> ModelResult<Derivation> {
        if !self.is_derivable() {
            return Err(self.unsupported(observation));
        }
        if stats.len() != self.n_statistics() {
            return Err(ModelError::DimensionMismatch {
                context: format!("statistics of observation '{observation}' ({})", self.tag()),
                expected: self.n_statistics(),
                found: stats.len(),
            });
        }
        let grads = jacobian(stats, params)?;

        let derivation = match self {
            Distribution::Normal => {
                let (mean, var) = (&stats[0], &stats[1]);
                Derivation {
                    loglik: gaussian_loglik(y, mean, var),
                    fim: gaussian_fim(&grads[0], &grads[1], var),
                }
            }
            Distribution::Lognormal => {
                let (mean, var) = (&stats[0], &stats[1]);
                let ln_y = y.ln();
                Derivation {
                    loglik: gaussian_loglik(&ln_y, mean, var) - &ln_y,
                    fim: gaussian_fim(&grads[0], &grads[1], var),
                }
            }
            Distribution::Poisson => {
                let rate = &stats[0];
                Derivation {
                    loglik: y * rate.ln() - y.ln_factorial() - rate,
                    fim: weighted_outer(&[(grads[0].as_slice(), rate.powi(-1))]),
                }
            }
            Distribution::Exponential => {
                let rate = &stats[0];
                Derivation {
                    loglik: rate.ln() - rate * y,
                    fim: weighted_outer(&[(grads[0].as_slice(), rate.powi(-2))]),
                }
            }
            Distribution::Binomial | Distribution::Gamma => return Err(self.unsupported(observation)),
        };
        Ok(derivation)
    }

    fn unsupported(&self, observation: &str) -> ModelError {
        ModelError::UnsupportedDistribution {
            family: self.tag().to_string(),
            observation: Some(observation.to_string()),
        }
    }

    /// Check literal statistic values against the family's support.
    ///
    /// Returns the index, value and reason of the first offending statistic.
    pub(crate) fn check_statistics(&self, stats: &[f64]) -> Result<(), (usize, f64, &'static str)> {
        if let Some((index, &value)) = stats.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err((index, value, "Statistics must be finite."));
        }
        match self {
            Distribution::Normal | Distribution::Lognormal if stats[1] <= 0.0 => {
                Err((1, stats[1], "Variance must be strictly positive."))
            }
            Distribution::Poisson | Distribution::Exponential if stats[0] <= 0.0 => {
                Err((0, stats[0], "Rate must be strictly positive."))
            }
            _ => Ok(()),
        }
    }

    /// Check observed values against the family's sample space.
    ///
    /// Returns the index, value and reason of the first offending value.
    /// Normal values only need to be finite; Poisson values are non-negative
    /// integers, Exponential values non-negative, Lognormal values strictly
    /// positive.
    pub(crate) fn check_observations(&self, values: &[f64]) -> Result<(), (usize, f64, &'static str)> {
        let rule: Option<(fn(f64) -> bool, &'static str)> = match self {
            Distribution::Poisson => {
                Some((|y| y >= 0.0 && y.fract() == 0.0, "Poisson counts must be non-negative integers."))
            }
            Distribution::Exponential => Some((|y| y >= 0.0, "Exponential values must be non-negative.")),
            Distribution::Lognormal => Some((|y| y > 0.0, "Lognormal values must be strictly positive.")),
            _ => None,
        };
        for (index, &value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err((index, value, "Observed values must be finite."));
            }
            if let Some((admissible, reason)) = rule {
                if !admissible(value) {
                    return Err((index, value, reason));
                }
            }
        }
        Ok(())
    }
}

impl FromStr for Distribution {
    type Err = ModelError;

    /// Parse an exact family tag (`"Normal"`, `"Poisson"`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Distribution::ALL.into_iter().find(|d| d.tag() == s).ok_or_else(|| {
            ModelError::UnsupportedDistribution { family: s.to_string(), observation: None }
        })
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// ---- Helpers ----

fn gaussian_loglik(y: &Expr, mean: &Expr, var: &Expr) -> Expr {
    let resid = y - mean;
    -0.5 * (2.0 * PI * var).ln() - resid.powi(2) / (2.0 * var)
}

fn gaussian_fim(d_mean: &[Expr], d_var: &[Expr], var: &Expr) -> Vec<Vec<Expr>> {
    weighted_outer(&[(d_mean, var.powi(-1)), (d_var, 0.5 * var.powi(-2))])
}

/// `Σ_k w_k g_k g_kᵀ`, built on the upper triangle and mirrored so the
/// result is exactly symmetric.
fn weighted_outer(terms: &[(&[Expr], Expr)]) -> Vec<Vec<Expr>> {
    let n = terms.first().map_or(0, |(g, _)| g.len());
    let mut out = vec![vec![Expr::zero(); n]; n];
    for i in 0..n {
        for j in i..n {
            let entry = Expr::sum(terms.iter().map(|(g, w)| &g[i] * &g[j] * w));
            out[j][i] = entry.clone();
            out[i][j] = entry;
        }
    }
    out
}
