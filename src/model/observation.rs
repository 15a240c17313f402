//! Observation definitions: name, family, and statistic function.
use crate::{
    model::{distribution::Distribution, errors::{ModelError, ModelResult}},
    symbolic::Expr,
};
use std::{fmt, sync::Arc};

type StatisticClosure = dyn Fn(&[Expr], &[Expr]) -> Vec<Expr> + Send + Sync;

/// Deterministic map from `(θ, x)` symbols to a family's sufficient
/// statistics, with its declared arity.
///
/// The closure is called once per model construction with exactly
/// `n_params` parameter symbols and `n_inputs` input symbols, and must
/// return the statistic expressions in the family's order (e.g.
/// `[mean, variance]` for Normal).
#[derive(Clone)]
pub struct StatisticFn {
    n_params: usize,
    n_inputs: usize,
    f: Arc<StatisticClosure>,
}

impl StatisticFn {
    pub fn new<F>(n_params: usize, n_inputs: usize, f: F) -> Self
    where
        F: Fn(&[Expr], &[Expr]) -> Vec<Expr> + Send + Sync + 'static,
    {
        Self { n_params, n_inputs, f: Arc::new(f) }
    }

    pub fn n_params(&self) -> usize {
        self.n_params
    }

    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub fn apply(&self, params: &[Expr], inputs: &[Expr]) -> Vec<Expr> {
        (self.f)(params, inputs)
    }
}

impl fmt::Debug for StatisticFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatisticFn")
            .field("n_params", &self.n_params)
            .field("n_inputs", &self.n_inputs)
            .finish_non_exhaustive()
    }
}

/// One observable of a model.
#[derive(Debug, Clone)]
pub struct ObservationDef {
    name: String,
    family: Distribution,
    statistic: StatisticFn,
}

impl ObservationDef {
    /// Build from a family tag string.
    ///
    /// # Errors
    /// - [`ModelError::UnsupportedDistribution`] (naming this observation) if
    ///   `family_tag` is not one of the recognised tags.
    pub fn new(
        name: impl Into<String>, family_tag: &str, statistic: StatisticFn,
    ) -> ModelResult<Self> {
        let name = name.into();
        let family = family_tag.parse::<Distribution>().map_err(|_| {
            ModelError::UnsupportedDistribution {
                family: family_tag.to_string(),
                observation: Some(name.clone()),
            }
        })?;
        Ok(Self { name, family, statistic })
    }

    pub fn with_family(name: impl Into<String>, family: Distribution, statistic: StatisticFn) -> Self {
        Self { name: name.into(), family, statistic }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn family(&self) -> Distribution {
        self.family
    }

    pub fn statistic(&self) -> &StatisticFn {
        &self.statistic
    }
}
