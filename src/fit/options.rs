//! Fit configuration.
use crate::optimization::loglik_optimizer::MLEOptions;

/// Feasible set of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamConstraint {
    #[default]
    Unbounded,
    /// `θ > 0`.
    Positive,
    /// `lower < θ < upper`.
    Bounded { lower: f64, upper: f64 },
}

/// Options for [`Model::fit`](crate::model::Model::fit).
///
/// - `mle`: optimizer tolerances, line search, memory and timeout.
/// - `constraints`: empty for an unconstrained fit, otherwise exactly one
///   entry per parameter.
/// - `parallel`: fit independent (design, replicate) cells on the rayon pool.
///
/// Constraints are optional even for parameters with a restricted domain
/// such as a variance. If a More–Thuente or Hager–Zhang step lands where the
/// log-likelihood is not finite, the cell resumes from its best point with
/// an Armijo backtracking search, which shrinks such steps back into the
/// domain. `LineSearcher::Backtracking` uses that search from the start.
/// A `Positive` or `Bounded` constraint is still the better choice when the
/// optimum may sit near the boundary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FitOptions {
    pub mle: MLEOptions,
    pub constraints: Vec<ParamConstraint>,
    pub parallel: bool,
}

impl FitOptions {
    pub fn new(mle: MLEOptions) -> Self {
        Self { mle, ..Self::default() }
    }

    pub fn with_constraints(mut self, constraints: Vec<ParamConstraint>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}
