//! Synthetic dataset generation.
//!
//! Purpose
//! -------
//! Draw observation data from a model at a fixed parameter vector for one or
//! more experiments, any number of replicates each.
//!
//! Key behaviors
//! -------------
//! - Statistics are evaluated once per (experiment, row, observation) with a
//!   non-zero count, then every replicate draws from them.
//! - Draw order is experiment → replicate → row → observation → value, so a
//!   given seed always produces the same datasets.
//! - Output nesting: a single experiment with one replicate gives
//!   `Nested::Single`, a single experiment with several replicates gives
//!   `Nested::Replicates`, a list of experiments gives `Nested::Designs`.
use crate::{
    model::{
        design::{Dataset, Experiment, ExperimentSet},
        errors::{ModelError, ModelResult},
        nesting::{Nested, NestingDepth},
        registry::Model,
    },
    optimization::loglik_optimizer::Theta,
    sample::draw::draw,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

impl Model {
    /// Sample datasets for `experiments` at parameter vector `theta`.
    ///
    /// Parameters
    /// ----------
    /// - `experiments`: one experiment or a list (design).
    /// - `theta`: parameter values, length `num_params`.
    /// - `replicates`: datasets drawn per experiment, at least 1.
    /// - `rng`: random source; pass a seeded generator for reproducibility.
    ///
    /// Errors
    /// ------
    /// - [`ModelError::Shape`] for zero replicates, an empty experiment list,
    ///   a malformed experiment, or a wrong-length `theta`.
    /// - [`ModelError::InvalidStatistic`] when a statistic is outside its
    ///   family's support (e.g. non-positive variance or rate).
    pub fn sample<R: Rng + ?Sized>(
        &self, experiments: ExperimentSet, theta: &Theta, replicates: usize, rng: &mut R,
    ) -> ModelResult<Nested<Dataset>> {
        if replicates == 0 {
            return Err(ModelError::shape("replicates must be at least 1"));
        }
        let theta = self.theta_slice(theta)?;
        let depth = match (experiments.is_single(), replicates) {
            (true, 1) => NestingDepth::Single,
            (true, _) => NestingDepth::Replicates,
            (false, _) => NestingDepth::Designs,
        };
        let experiments = experiments.into_vec();
        if experiments.is_empty() {
            return Err(ModelError::shape("no experiments"));
        }
        for experiment in &experiments {
            experiment.validate(self.num_inputs(), self.num_observations())?;
        }

        let mut grid = Vec::with_capacity(experiments.len());
        for (index, experiment) in experiments.iter().enumerate() {
            log::debug!(
                "sampling experiment {index}: {} rows, {} values per replicate, {replicates} replicates",
                experiment.inputs.len(),
                experiment.total_count()
            );
            let stats = self.experiment_statistics(experiment, theta)?;
            let mut datasets = Vec::with_capacity(replicates);
            for _ in 0..replicates {
                datasets.push(self.draw_dataset(experiment, &stats, rng)?);
            }
            grid.push(datasets);
        }
        Nested::denormalize(depth, grid)
    }

    /// [`sample`](Self::sample) with a `StdRng` seeded from `seed`.
    pub fn sample_seeded(
        &self, experiments: ExperimentSet, theta: &Theta, replicates: usize, seed: u64,
    ) -> ModelResult<Nested<Dataset>> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.sample(experiments, theta, replicates, &mut rng)
    }

    /// `stats[row][obs]`, empty where the count is zero.
    fn experiment_statistics(
        &self, experiment: &Experiment, theta: &[f64],
    ) -> ModelResult<Vec<Vec<Vec<f64>>>> {
        experiment
            .inputs
            .iter()
            .zip(&experiment.counts)
            .map(|(x, counts)| {
                counts
                    .iter()
                    .enumerate()
                    .map(|(obs, &count)| {
                        if count == 0 {
                            Ok(Vec::new())
                        } else {
                            self.statistics(obs, theta, x)
                        }
                    })
                    .collect::<ModelResult<Vec<_>>>()
            })
            .collect()
    }

    fn draw_dataset<R: Rng + ?Sized>(
        &self, experiment: &Experiment, stats: &[Vec<Vec<f64>>], rng: &mut R,
    ) -> ModelResult<Dataset> {
        let mut observations = Vec::with_capacity(experiment.inputs.len());
        for (counts, row_stats) in experiment.counts.iter().zip(stats) {
            let mut row = Vec::with_capacity(counts.len());
            for ((entry, &count), obs_stats) in self.observations.iter().zip(counts).zip(row_stats) {
                if count == 0 {
                    row.push(Vec::new());
                    continue;
                }
                let values = draw(entry.family, obs_stats, count, &mut *rng).map_err(
                    |(index, value, reason)| ModelError::InvalidStatistic {
                        observation: entry.name.clone(),
                        index,
                        value,
                        reason,
                    },
                )?;
                row.push(values);
            }
            observations.push(row);
        }
        Ok(Dataset::new(experiment.inputs.clone(), observations))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        model::{
            design::{Experiment, ExperimentSet},
            distribution::Distribution,
            errors::ModelError,
            nesting::Nested,
            observation::{ObservationDef, StatisticFn},
            registry::Model,
        },
        symbolic::Expr,
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Count honouring for every observation and row.
    // - Output nesting for single / replicated / listed experiments.
    // - Determinism under a fixed seed.
    // - Shape and InvalidStatistic failures.
    // -------------------------------------------------------------------------

    fn mixed_model() -> Model {
        let normal = ObservationDef::with_family(
            "y",
            Distribution::Normal,
            StatisticFn::new(2, 1, |p, x| vec![&p[0] + &p[1] * &x[0], Expr::one()]),
        );
        let poisson = ObservationDef::with_family(
            "c",
            Distribution::Poisson,
            StatisticFn::new(2, 1, |p, x| vec![(&p[0] + &p[1] * &x[0]).exp()]),
        );
        Model::new(vec![normal, poisson], &["x"], &["a", "b"]).unwrap()
    }

    fn experiment() -> Experiment {
        Experiment::new(vec![vec![0.0], vec![1.0]], vec![vec![3, 5], vec![0, 2]])
    }

    #[test]
    // Purpose
    // -------
    // Each (row, observation) cell holds exactly `count` values.
    fn sample_honours_counts() {
        let model = mixed_model();

        let data = model
            .sample_seeded(experiment().into(), &array![0.5, 0.2], 1, 3)
            .unwrap()
            .into_single()
            .unwrap();

        let lens: Vec<Vec<usize>> =
            data.observations.iter().map(|row| row.iter().map(Vec::len).collect()).collect();
        assert_eq!(lens, vec![vec![3, 5], vec![0, 2]]);
        assert_eq!(data.inputs, experiment().inputs);
    }

    #[test]
    // Purpose
    // -------
    // Nesting follows experiment-set kind and replicate count.
    fn sample_nesting_follows_inputs() {
        let model = mixed_model();
        let theta = array![0.5, 0.2];

        let single = model.sample_seeded(experiment().into(), &theta, 1, 1).unwrap();
        let reps = model.sample_seeded(experiment().into(), &theta, 4, 1).unwrap();
        let designs = model
            .sample_seeded(ExperimentSet::List(vec![experiment(), experiment()]), &theta, 3, 1)
            .unwrap();
        let one_design =
            model.sample_seeded(ExperimentSet::List(vec![experiment()]), &theta, 1, 1).unwrap();

        assert!(matches!(single, Nested::Single(_)));
        assert_eq!(reps.into_replicates().unwrap().len(), 4);
        assert_eq!(designs.into_designs().unwrap().iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 3]);
        assert_eq!(one_design.into_designs().unwrap().len(), 1);
    }

    #[test]
    // Purpose
    // -------
    // The same seed reproduces the same datasets; a different seed does not.
    fn sample_is_deterministic_per_seed() {
        let model = mixed_model();
        let theta = array![0.5, 0.2];

        let a = model.sample_seeded(experiment().into(), &theta, 2, 42).unwrap();
        let b = model.sample_seeded(experiment().into(), &theta, 2, 42).unwrap();
        let c = model.sample_seeded(experiment().into(), &theta, 2, 43).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    // Purpose
    // -------
    // Zero replicates, bad θ length and malformed experiments are shape errors.
    fn sample_rejects_bad_shapes() {
        let model = mixed_model();
        let theta = array![0.5, 0.2];
        let bad = Experiment::new(vec![vec![0.0]], vec![vec![1]]);

        let cases = [
            model.sample_seeded(experiment().into(), &theta, 0, 1),
            model.sample_seeded(experiment().into(), &array![0.5], 1, 1),
            model.sample_seeded(bad.into(), &theta, 1, 1),
            model.sample_seeded(ExperimentSet::List(vec![]), &theta, 1, 1),
        ];

        for (i, result) in cases.into_iter().enumerate() {
            assert!(matches!(result, Err(ModelError::Shape { .. })), "case {i}: {result:?}");
        }
    }

    #[test]
    // Purpose
    // -------
    // A non-positive variance is reported against its observation.
    fn sample_rejects_invalid_variance() {
        let obs = ObservationDef::with_family(
            "y",
            Distribution::Normal,
            StatisticFn::new(1, 1, |p, x| vec![x[0].clone(), p[0].clone()]),
        );
        let model = Model::new(vec![obs], &["x"], &["v"]).unwrap();
        let exp = Experiment::new(vec![vec![0.0]], vec![vec![2]]);

        let err = model.sample_seeded(exp.into(), &array![-1.0], 1, 1).unwrap_err();

        assert_eq!(
            err,
            ModelError::InvalidStatistic {
                observation: "y".to_string(),
                index: 1,
                value: -1.0,
                reason: "Variance must be strictly positive."
            }
        );
    }
}
