//! Errors for model construction, evaluation, sampling and fitting.
//!
//! [`ModelError`] is the single error type surfaced by [`Model`](super::Model)
//! and by the fitter and sampler built on it. Construction-time validation
//! (names, arities, families) fails eagerly, so a constructed model is
//! internally consistent; shape problems in experiments and datasets fail
//! fast with [`ModelError::Shape`].
//!
//! ## Conventions
//! - **Indices are 0-based.**
//! - Symbolic and optimizer errors are wrapped rather than flattened, so the
//!   originating layer stays visible.
use crate::{optimization::errors::OptError, symbolic::SymError};

/// Result alias for model-level operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Namespace a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCategory {
    Input,
    Parameter,
    Observation,
}

impl std::fmt::Display for NameCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameCategory::Input => write!(f, "input"),
            NameCategory::Parameter => write!(f, "parameter"),
            NameCategory::Observation => write!(f, "observation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- Construction ----
    /// A name occurs twice within one namespace.
    DuplicateName { category: NameCategory, name: String },

    /// Declared counts disagree (name lists vs. statistic arity, statistic
    /// output length vs. family, empty observation list).
    DimensionMismatch { context: String, expected: usize, found: usize },

    /// Family tag not recognised, or family has no derivation.
    UnsupportedDistribution { family: String, observation: Option<String> },

    /// Lookup by a name the model does not know.
    UnknownName { category: NameCategory, name: String },

    // ---- Data shape ----
    /// Malformed experiment, dataset, nesting, or argument vector.
    Shape { reason: String },

    // ---- Evaluation ----
    /// Statistic value outside the family's support during sampling.
    InvalidStatistic { observation: String, index: usize, value: f64, reason: &'static str },

    // ---- Fitting ----
    /// Constraint list malformed or incompatible with the start vector.
    InvalidConstraint { index: usize, reason: String },

    /// Optimizer stopped without meeting its convergence criteria.
    OptimizerNonConvergence { design: usize, replicate: usize, status: String },

    // ---- Wrapped ----
    Symbolic(SymError),
    Optimization(OptError),
}

impl ModelError {
    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        ModelError::Shape { reason: reason.into() }
    }
}

impl std::error::Error for ModelError {}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Construction ----
            ModelError::DuplicateName { category, name } => {
                write!(f, "Duplicate {category} name '{name}'")
            }
            ModelError::DimensionMismatch { context, expected, found } => {
                write!(f, "Dimension mismatch for {context}: expected {expected}, found {found}")
            }
            ModelError::UnsupportedDistribution { family, observation: Some(obs) } => {
                write!(f, "Unsupported distribution '{family}' for observation '{obs}'")
            }
            ModelError::UnsupportedDistribution { family, observation: None } => {
                write!(f, "Unsupported distribution '{family}'")
            }
            ModelError::UnknownName { category, name } => {
                write!(f, "Unknown {category} name '{name}'")
            }

            // ---- Data shape ----
            ModelError::Shape { reason } => write!(f, "Shape error: {reason}"),

            // ---- Evaluation ----
            ModelError::InvalidStatistic { observation, index, value, reason } => write!(
                f,
                "Invalid statistic {index} for observation '{observation}': {value}: {reason}"
            ),

            // ---- Fitting ----
            ModelError::InvalidConstraint { index, reason } => {
                write!(f, "Invalid constraint for parameter {index}: {reason}")
            }
            ModelError::OptimizerNonConvergence { design, replicate, status } => write!(
                f,
                "Optimizer did not converge for design {design}, replicate {replicate}: {status}"
            ),

            // ---- Wrapped ----
            ModelError::Symbolic(err) => write!(f, "Symbolic error: {err}"),
            ModelError::Optimization(err) => write!(f, "Optimization error: {err}"),
        }
    }
}

impl From<SymError> for ModelError {
    fn from(err: SymError) -> Self {
        ModelError::Symbolic(err)
    }
}

impl From<OptError> for ModelError {
    fn from(err: OptError) -> Self {
        ModelError::Optimization(err)
    }
}
