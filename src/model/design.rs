//! Experiments and datasets.
//!
//! Purpose
//! -------
//! Plain value containers for the two tables the toolkit moves around:
//!
//! - [`Experiment`]: input rows plus, per row and per observation, the number
//!   of measurements to take (the *count*).
//! - [`Dataset`]: the same input rows plus, per row and per observation, the
//!   measured (or sampled) values.
//!
//! Both are `Clone` and own their buffers; the sampler produces a fresh
//! `Dataset` per replicate.
//!
//! Invariants & assumptions
//! ------------------------
//! - Neither type validates itself on construction, because validity depends
//!   on a model's input and observation counts. `validate` checks a value
//!   against those counts and is called at the top of every model operation
//!   that consumes one.
//! - Row `i` of `counts` / `observations` corresponds to row `i` of `inputs`;
//!   entry `j` of a row corresponds to observation index `j`.
use crate::model::errors::{ModelError, ModelResult};

/// Input conditions and intended measurement counts.
///
/// Fields
/// ------
/// - `inputs`: one row per condition, each of length `num_inputs`.
/// - `counts`: one row per condition, each of length `num_observations`;
///   `counts[i][j]` samples of observation `j` are taken at row `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    pub inputs: Vec<Vec<f64>>,
    pub counts: Vec<Vec<usize>>,
}

impl Experiment {
    pub fn new(inputs: Vec<Vec<f64>>, counts: Vec<Vec<usize>>) -> Self {
        Self { inputs, counts }
    }

    /// Check the experiment against a model's dimensions.
    ///
    /// # Errors
    /// - [`ModelError::Shape`] when there are no rows, row counts of `inputs`
    ///   and `counts` differ, a row has the wrong width, or an input value is
    ///   not finite.
    pub fn validate(&self, num_inputs: usize, num_observations: usize) -> ModelResult<()> {
        validate_inputs(&self.inputs, num_inputs)?;
        if self.counts.len() != self.inputs.len() {
            return Err(ModelError::shape(format!(
                "experiment has {} input rows but {} count rows",
                self.inputs.len(),
                self.counts.len()
            )));
        }
        for (row, counts) in self.counts.iter().enumerate() {
            if counts.len() != num_observations {
                return Err(ModelError::shape(format!(
                    "count row {row} has {} entries, expected {num_observations}",
                    counts.len()
                )));
            }
        }
        Ok(())
    }

    /// Total number of measurements across all rows and observations.
    pub fn total_count(&self) -> usize {
        self.counts.iter().flatten().sum()
    }
}

/// Input conditions and measured values.
///
/// `observations[i][j]` holds every value of observation `j` measured at
/// input row `i`; its length is free (zero is allowed).
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub inputs: Vec<Vec<f64>>,
    pub observations: Vec<Vec<Vec<f64>>>,
}

impl Dataset {
    pub fn new(inputs: Vec<Vec<f64>>, observations: Vec<Vec<Vec<f64>>>) -> Self {
        Self { inputs, observations }
    }

    /// Check the dataset against a model's dimensions.
    ///
    /// # Errors
    /// - [`ModelError::Shape`] when there are no rows, row counts of `inputs`
    ///   and `observations` differ, a row has the wrong width, or any input
    ///   or observed value is not finite.
    pub fn validate(&self, num_inputs: usize, num_observations: usize) -> ModelResult<()> {
        validate_inputs(&self.inputs, num_inputs)?;
        if self.observations.len() != self.inputs.len() {
            return Err(ModelError::shape(format!(
                "dataset has {} input rows but {} observation rows",
                self.inputs.len(),
                self.observations.len()
            )));
        }
        for (row, per_obs) in self.observations.iter().enumerate() {
            if per_obs.len() != num_observations {
                return Err(ModelError::shape(format!(
                    "observation row {row} has {} entries, expected {num_observations}",
                    per_obs.len()
                )));
            }
            for (obs, values) in per_obs.iter().enumerate() {
                if let Some(v) = values.iter().find(|v| !v.is_finite()) {
                    return Err(ModelError::shape(format!(
                        "observation {obs} at row {row} contains non-finite value {v}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of measured values across all rows and observations.
    pub fn num_values(&self) -> usize {
        self.observations.iter().flatten().map(Vec::len).sum()
    }
}

/// One experiment or a list of experiments (a design).
#[derive(Debug, Clone, PartialEq)]
pub enum ExperimentSet {
    Single(Experiment),
    List(Vec<Experiment>),
}

impl ExperimentSet {
    pub fn is_single(&self) -> bool {
        matches!(self, ExperimentSet::Single(_))
    }

    pub fn into_vec(self) -> Vec<Experiment> {
        match self {
            ExperimentSet::Single(e) => vec![e],
            ExperimentSet::List(list) => list,
        }
    }
}

impl From<Experiment> for ExperimentSet {
    fn from(experiment: Experiment) -> Self {
        ExperimentSet::Single(experiment)
    }
}

impl From<Vec<Experiment>> for ExperimentSet {
    fn from(experiments: Vec<Experiment>) -> Self {
        ExperimentSet::List(experiments)
    }
}

fn validate_inputs(inputs: &[Vec<f64>], num_inputs: usize) -> ModelResult<()> {
    if inputs.is_empty() {
        return Err(ModelError::shape("no input rows"));
    }
    for (row, values) in inputs.iter().enumerate() {
        if values.len() != num_inputs {
            return Err(ModelError::shape(format!(
                "input row {row} has {} values, expected {num_inputs}",
                values.len()
            )));
        }
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(ModelError::shape(format!("input row {row} contains non-finite value {v}")));
        }
    }
    Ok(())
}
