//! Numeric evaluation of a constructed model.
//!
//! Every evaluator validates its argument lengths against the model before
//! calling a compiled function, so shape mistakes surface as
//! [`ModelError::Shape`] rather than as symbolic call errors.
use crate::{
    model::{
        design::{Dataset, Experiment},
        errors::{ModelError, ModelResult},
        registry::Model,
    },
    optimization::loglik_optimizer::Theta,
};
use ndarray::Array2;

impl Model {
    /// Sufficient statistics of observation `obs` at `(θ, x)`.
    pub fn statistics(&self, obs: usize, theta: &[f64], x: &[f64]) -> ModelResult<Vec<f64>> {
        self.check_point(theta, x)?;
        Ok(self.entry(obs)?.statistic_fn.call(&[theta, x])?)
    }

    /// Jacobian of the statistics with respect to θ, `n_statistics × n_params`.
    pub fn sensitivity(&self, obs: usize, theta: &[f64], x: &[f64]) -> ModelResult<Array2<f64>> {
        self.check_point(theta, x)?;
        let entry = self.entry(obs)?;
        let flat = entry.sensitivity_fn.call(&[theta, x])?;
        to_matrix(flat, entry.family.n_statistics(), self.num_params())
    }

    /// Per-sample Fisher information of observation `obs` at `(θ, x)`.
    pub fn observation_fim(&self, obs: usize, theta: &[f64], x: &[f64]) -> ModelResult<Array2<f64>> {
        self.check_point(theta, x)?;
        let flat = self.entry(obs)?.fim_fn.call(&[theta, x])?;
        to_matrix(flat, self.num_params(), self.num_params())
    }

    /// Total Fisher information of an experiment:
    /// `Σ_rows Σ_obs count · I_obs(θ, x_row)`.
    ///
    /// Rows or observations with a zero count contribute nothing and are not
    /// evaluated.
    pub fn fim(&self, experiment: &Experiment, theta: &Theta) -> ModelResult<Array2<f64>> {
        experiment.validate(self.num_inputs(), self.num_observations())?;
        let theta = self.theta_slice(theta)?;
        let n = self.num_params();
        let mut total = Array2::<f64>::zeros((n, n));
        for (x, counts) in experiment.inputs.iter().zip(&experiment.counts) {
            for (obs, &count) in counts.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                let fim = self.observation_fim(obs, theta, x)?;
                total.scaled_add(count as f64, &fim);
            }
        }
        Ok(total)
    }

    /// Total log-likelihood of a dataset at θ.
    ///
    /// # Errors
    /// - [`ModelError::Shape`] for a malformed dataset or a value outside its
    ///   family's sample space (e.g. a non-integer Poisson count).
    pub fn loglik(&self, dataset: &Dataset, theta: &Theta) -> ModelResult<f64> {
        self.check_dataset(dataset)?;
        let theta = self.theta_slice(theta)?;
        let mut total = 0.0;
        for (x, per_obs) in dataset.inputs.iter().zip(&dataset.observations) {
            for (entry, values) in self.observations.iter().zip(per_obs) {
                for &y in values {
                    total += entry.loglik_fn.call(&[&[y], theta, x])?[0];
                }
            }
        }
        Ok(total)
    }

    /// Layout checks plus every value against its observation's family.
    pub(crate) fn check_dataset(&self, dataset: &Dataset) -> ModelResult<()> {
        dataset.validate(self.num_inputs(), self.num_observations())?;
        for (row, per_obs) in dataset.observations.iter().enumerate() {
            for (entry, values) in self.observations.iter().zip(per_obs) {
                if let Err((index, value, reason)) = entry.family.check_observations(values) {
                    return Err(ModelError::shape(format!(
                        "observation '{}' at row {row}, value {index} ({value}): {reason}",
                        entry.name
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn theta_slice<'a>(&self, theta: &'a Theta) -> ModelResult<&'a [f64]> {
        let theta = theta
            .as_slice()
            .ok_or_else(|| ModelError::shape("parameter vector is not contiguous"))?;
        self.check_theta(theta)?;
        Ok(theta)
    }

    pub(crate) fn check_theta(&self, theta: &[f64]) -> ModelResult<()> {
        if theta.len() != self.num_params() {
            return Err(ModelError::shape(format!(
                "parameter vector has {} values, expected {}",
                theta.len(),
                self.num_params()
            )));
        }
        Ok(())
    }

    fn check_point(&self, theta: &[f64], x: &[f64]) -> ModelResult<()> {
        self.check_theta(theta)?;
        if x.len() != self.num_inputs() {
            return Err(ModelError::shape(format!(
                "input vector has {} values, expected {}",
                x.len(),
                self.num_inputs()
            )));
        }
        Ok(())
    }
}

fn to_matrix(flat: Vec<f64>, rows: usize, cols: usize) -> ModelResult<Array2<f64>> {
    Array2::from_shape_vec((rows, cols), flat).map_err(|e| ModelError::shape(e.to_string()))
}

#[cfg(test)]
mod tests {
    use crate::model::{
        design::{Dataset, Experiment},
        distribution::Distribution,
        errors::ModelError,
        observation::{ObservationDef, StatisticFn},
        registry::Model,
    };
    use crate::symbolic::Expr;
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};
    use statrs::distribution::{Continuous, Discrete, Normal, Poisson};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Statistic and sensitivity values for a linear-mean model.
    // - Total FIM as a count-weighted sum, symmetric and PSD.
    // - Dataset log-likelihood against statrs densities.
    // - Shape errors for wrong argument lengths and for values outside a
    //   family's sample space.
    // -------------------------------------------------------------------------

    fn two_observation_model() -> Model {
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

    #[test]
    // Purpose
    // -------
    // Statistics and their Jacobian evaluate to the closed forms.
    fn statistics_and_sensitivity_values() {
        let model = two_observation_model();

        let stats = model.statistics(0, &[2.0, 3.0], &[1.5]).unwrap();
        let sens = model.sensitivity(1, &[0.1, 0.2], &[2.0]).unwrap();

        let lambda = f64::exp(0.1 + 0.2 * 2.0);
        assert_eq!(stats, vec![6.5, 1.0]);
        assert_eq!(sens.dim(), (1, 2));
        assert_relative_eq!(sens[[0, 0]], lambda, epsilon = 1e-12);
        assert_relative_eq!(sens[[0, 1]], 2.0 * lambda, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Experiment FIM is the count-weighted sum of per-sample FIMs.
    //
    // Given
    // -----
    // - Normal-only counts: rows x = 0 (3 samples) and x = 1 (3 samples).
    //
    // Expect
    // ------
    // - FIM = 3·[[1,0],[0,0]] + 3·[[1,1],[1,1]] = [[6,3],[3,3]], PSD.
    fn experiment_fim_is_count_weighted_sum() {
        let model = two_observation_model();
        let exp = Experiment::new(vec![vec![0.0], vec![1.0]], vec![vec![3, 0], vec![3, 0]]);

        let fim = model.fim(&exp, &array![2.0, 3.0]).unwrap();

        assert_eq!(fim, array![[6.0, 3.0], [3.0, 3.0]]);
        let det = fim[[0, 0]] * fim[[1, 1]] - fim[[0, 1]] * fim[[1, 0]];
        assert!(fim[[0, 0]] > 0.0 && det > 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Dataset log-likelihood sums the per-value densities of every observation.
    fn dataset_loglik_matches_statrs() {
        let model = two_observation_model();
        let data = Dataset::new(
            vec![vec![0.0], vec![1.0]],
            vec![vec![vec![1.5, 2.5], vec![1.0]], vec![vec![5.2], vec![]]],
        );
        let theta: Array1<f64> = array![2.0, 0.5];

        let ll = model.loglik(&data, &theta).unwrap();

        let n0 = Normal::new(2.0, 1.0).unwrap();
        let n1 = Normal::new(2.5, 1.0).unwrap();
        let p0 = Poisson::new(f64::exp(2.0)).unwrap();
        let expected = n0.ln_pdf(1.5) + n0.ln_pdf(2.5) + p0.ln_pmf(1) + n1.ln_pdf(5.2);
        assert_relative_eq!(ll, expected, epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Wrong θ or x lengths and bad observation indices are shape errors.
    fn evaluators_reject_wrong_lengths() {
        let model = two_observation_model();

        let cases = [
            model.statistics(0, &[1.0], &[0.0]).map(|_| ()),
            model.statistics(0, &[1.0, 2.0], &[]).map(|_| ()),
            model.observation_fim(5, &[1.0, 2.0], &[0.0]).map(|_| ()),
            model.fim(&Experiment::new(vec![vec![0.0]], vec![vec![1, 1]]), &array![1.0]).map(|_| ()),
        ];

        for (i, result) in cases.into_iter().enumerate() {
            assert!(matches!(result, Err(ModelError::Shape { .. })), "case {i}: {result:?}");
        }
    }

    #[test]
    // Purpose
    // -------
    // A value outside its family's sample space fails before any density is
    // evaluated, naming the observation and row.
    //
    // Given
    // -----
    // - Poisson counts 2.5 and -1 at row 1; an Exponential model with y = -0.5;
    //   a Lognormal model with y = 0.
    //
    // Expect
    // ------
    // - `ModelError::Shape` whose message carries the observation name and
    //   row.
    fn loglik_rejects_values_outside_sample_space() {
        let model = two_observation_model();
        let theta = array![0.0, 0.1];
        let rows = vec![vec![0.0], vec![1.0]];

        for bad in [2.5, -1.0] {
            let data = Dataset::new(rows.clone(), vec![vec![vec![0.3], vec![2.0]], vec![vec![], vec![bad]]]);
            match model.loglik(&data, &theta) {
                Err(ModelError::Shape { reason }) => {
                    assert!(reason.contains("'c'") && reason.contains("row 1"), "{reason}");
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }

        let single = |family: Distribution| {
            let obs = ObservationDef::with_family(
                "y",
                family,
                StatisticFn::new(1, 1, move |p, _x| match family {
                    Distribution::Lognormal => vec![p[0].clone(), Expr::one()],
                    _ => vec![p[0].exp()],
                }),
            );
            Model::new(vec![obs], &["x"], &["p"]).unwrap()
        };
        let cases = [(Distribution::Exponential, -0.5), (Distribution::Lognormal, 0.0)];
        for (family, y) in cases {
            let data = Dataset::new(vec![vec![0.0]], vec![vec![vec![1.0, y]]]);
            let result = single(family).loglik(&data, &array![0.0]);
            assert!(matches!(result, Err(ModelError::Shape { .. })), "{family}: {result:?}");
        }
    }
}
