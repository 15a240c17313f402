//! Per-family random draws from evaluated statistics.
use crate::model::distribution::Distribution;
use rand::Rng;
use rand_distr::{Distribution as _, Exp, LogNormal, Normal, Poisson};

/// Index, value and reason of an offending statistic.
pub(crate) type StatisticIssue = (usize, f64, &'static str);

/// Draw `count` values of `family` parameterised by `stats`.
///
/// `stats` follows the family's statistic order: `(mean, variance)` for
/// Normal, `(mean, variance)` of `ln y` for Lognormal, `(rate)` for Poisson
/// and Exponential. Variances are converted to standard deviations here.
///
/// # Errors
/// The first statistic outside the family's support.
pub(crate) fn draw<R: Rng + ?Sized>(
    family: Distribution, stats: &[f64], count: usize, rng: &mut R,
) -> Result<Vec<f64>, StatisticIssue> {
    family.check_statistics(stats)?;
    let values = match family {
        Distribution::Normal => {
            let normal = Normal::new(stats[0], stats[1].sqrt())
                .map_err(|_| (1, stats[1], "Variance must be strictly positive."))?;
            normal.sample_iter(rng).take(count).collect()
        }
        Distribution::Lognormal => {
            let lognormal = LogNormal::new(stats[0], stats[1].sqrt())
                .map_err(|_| (1, stats[1], "Variance must be strictly positive."))?;
            lognormal.sample_iter(rng).take(count).collect()
        }
        Distribution::Poisson => {
            let poisson = Poisson::new(stats[0])
                .map_err(|_| (0, stats[0], "Rate must be strictly positive."))?;
            poisson.sample_iter(rng).take(count).collect()
        }
        Distribution::Exponential => {
            let exp = Exp::new(stats[0]).map_err(|_| (0, stats[0], "Rate must be strictly positive."))?;
            exp.sample_iter(rng).take(count).collect()
        }
        Distribution::Binomial | Distribution::Gamma => {
            return Err((0, stats.first().copied().unwrap_or(f64::NAN), "Family cannot be sampled."));
        }
    };
    Ok(values)
}
