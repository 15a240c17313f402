//! sample — synthetic data generation from a model.
//!
//! Purpose
//! -------
//! Provide [`Model::sample`](crate::model::Model::sample) and
//! [`Model::sample_seeded`](crate::model::Model::sample_seeded): evaluate each
//! observation's statistics at a parameter vector and draw the requested
//! number of values per input row from the matching `rand_distr`
//! distribution.
//!
//! Invariants & assumptions
//! ------------------------
//! - The random source is always passed in explicitly; nothing here touches a
//!   thread-local or global generator.
//! - Counts are honoured exactly for every family, including zero.

mod draw;
mod sampler;
