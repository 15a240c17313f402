//! model — observation families, model registry, experiments and datasets.
//!
//! Purpose
//! -------
//! Turn a declarative list of observations (name, distribution family,
//! statistic function of parameters and inputs) into an immutable [`Model`]
//! holding the derived log-likelihood and Fisher information of every
//! observation, and provide the data containers the sampler and fitter
//! exchange.
//!
//! Key behaviors
//! -------------
//! - [`Distribution`]: closed family set with per-family symbolic
//!   log-likelihood / FIM derivation.
//! - [`Model::new`]: name and arity validation, derivation, compilation.
//! - Evaluators on [`Model`]: `statistics`, `sensitivity`,
//!   `observation_fim`, `fim`, `loglik`.
//! - [`Experiment`], [`Dataset`], [`ExperimentSet`], and the
//!   shape-preserving [`Nested`] wrapper.
//!
//! Invariants & assumptions
//! ------------------------
//! - A constructed model is internally consistent: every observation shares
//!   the same parameter and input arity, and every compiled function has the
//!   signature documented on its accessor.
//! - All errors are [`ModelError`].
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule; end-to-end sample → fit checks
//!   live under `tests/`.

pub mod design;
pub mod distribution;
pub mod errors;
mod evaluate;
pub mod nesting;
pub mod observation;
pub mod registry;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::design::{Dataset, Experiment, ExperimentSet};
pub use self::distribution::{Derivation, Distribution};
pub use self::errors::{ModelError, ModelResult, NameCategory};
pub use self::nesting::{Nested, NestingDepth};
pub use self::observation::{ObservationDef, StatisticFn};
pub use self::registry::Model;
