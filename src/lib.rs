//! nloed — nonlinear regression experiment design.
//!
//! Purpose
//! -------
//! Declare a model as a list of observations, each with a distribution
//! family and a deterministic statistic function of parameters and inputs,
//! then use it to
//!
//! - derive closed-form per-sample log-likelihoods and Fisher information,
//! - generate synthetic datasets for a set of experimental conditions, and
//! - fit the parameters to observed data by maximum likelihood.
//!
//! Key behaviors
//! -------------
//! - [`symbolic`]: expression graphs with exact differentiation and
//!   compilation to callable functions.
//! - [`model`]: distribution algebra, the validated [`model::Model`]
//!   registry, experiments, datasets and shape-preserving nesting.
//! - [`fit`]: per-cell negative log-likelihood composition and L-BFGS
//!   fitting with optional parameter constraints. Unconstrained fits survive
//!   steps outside a parameter's domain (e.g. a negative variance): the
//!   line search falls back to Armijo backtracking from the last good point.
//! - [`sample`]: seeded sampling of datasets from a model.
//! - [`optimization`]: the argmin-backed maximiser and its options.
//!
//! Invariants & assumptions
//! ------------------------
//! - Models are immutable after construction and `Send + Sync`.
//! - Library code reports misuse through typed errors and never panics on
//!   user input.
//!
//! Example
//! -------
//! ```no_run
//! use ndarray::array;
//! use nloed::prelude::*;
//!
//! let obs = ObservationDef::new(
//!     "y",
//!     "Normal",
//!     StatisticFn::new(2, 1, |p, x| vec![&p[0] + &p[1] * &x[0], Expr::one()]),
//! )?;
//! let model = Model::new(vec![obs], &["x"], &["a", "b"])?;
//!
//! let experiment = Experiment::new(vec![vec![0.0], vec![1.0]], vec![vec![3], vec![3]]);
//! let data = model.sample_seeded(experiment.into(), &array![2.0, 3.0], 1, 7)?;
//! let fitted = model.fit(data, &array![0.0, 0.0], &FitOptions::default())?;
//! println!("{fitted:?}");
//! # Ok::<(), nloed::model::ModelError>(())
//! ```

pub mod fit;
pub mod model;
pub mod optimization;
pub mod sample;
pub mod symbolic;

/// Common imports for building, sampling and fitting models.
pub mod prelude {
    pub use crate::fit::{FitOptions, ParamConstraint};
    pub use crate::model::{
        Dataset, Distribution, Experiment, ExperimentSet, Model, ModelError, ModelResult, Nested,
        ObservationDef, StatisticFn,
    };
    pub use crate::optimization::loglik_optimizer::{LineSearcher, MLEOptions, Theta, Tolerances};
    pub use crate::symbolic::Expr;
}
