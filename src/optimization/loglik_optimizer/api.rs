//! High-level entry point for maximizing a [`LogLikelihood`].
//!
//! Selects an L-BFGS solver with a Hager–Zhang, More–Thuente or Armijo
//! backtracking line search, wraps the objective in an `ArgMinAdapter`
//! (which *minimizes* `-ℓ(θ)`), and delegates the run to `run_lbfgs`.
//!
//! The interpolating searches (More–Thuente, Hager–Zhang) abort when a trial
//! step lands where `ℓ(θ)` is not finite, e.g. a variance parameter stepping
//! below zero. When that happens the run resumes from its best point with the
//! backtracking search, which halves such steps instead of failing.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{
            build_optimizer_backtracking, build_optimizer_hager_zhang,
            build_optimizer_more_thuente,
        },
        run::run_lbfgs,
        traits::{LineSearcher, LogLikelihood, MLEOptions},
    },
};

/// Maximize a log-likelihood `ℓ(θ)` using L-BFGS with the chosen line search.
///
/// # Behavior
/// - Validates the initial guess via `f.check(&theta0, data)` and requires a
///   finite `ℓ(θ₀)`.
/// - Builds an L-BFGS solver per `opts.line_searcher` and runs it through
///   `run_lbfgs` (initial params, max iters, timeout, optional observers).
/// - If a More–Thuente or Hager–Zhang run ends on a line-search exit, resumes
///   from its best point with the backtracking search for the iterations
///   left. The returned outcome reports the combined iteration and
///   evaluation counts.
///
/// # Errors
/// - Propagates any error from `f.check` and `f.value` at `theta0`.
/// - [`OptError::NonFiniteCost`] if `ℓ(θ₀)` is not finite.
/// - Propagates builder errors from `build_optimizer_*`.
/// - Propagates runtime errors from `run_lbfgs`.
///
/// Hitting the iteration cap or timeout is **not** an error here; it is
/// reported through [`OptimOutcome::converged`].
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use nloed::optimization::{
///     errors::OptResult,
///     loglik_optimizer::{Grad, LogLikelihood, MLEOptions, Theta, maximize},
/// };
///
/// struct Quadratic;
/// impl LogLikelihood for Quadratic {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
///     fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
///         Ok(theta * -2.0)
///     }
/// }
///
/// let out = maximize(&Quadratic, array![0.1, -0.2], &(), &MLEOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), nloed::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let value0 = f.value(&theta0, data)?;
    if !value0.is_finite() {
        return Err(OptError::NonFiniteCost { value: value0 });
    }
    let first = match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, ArgMinAdapter::new(f, data), solver)?
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, ArgMinAdapter::new(f, data), solver)?
        }
        LineSearcher::Backtracking => return run_backtracking(f, theta0, data, opts),
    };
    if !first.solver_exit {
        return Ok(first);
    }

    let mut resume_opts = opts.clone();
    if let Some(max_iter) = opts.tols.max_iter {
        let left = max_iter.saturating_sub(first.iterations);
        if left == 0 {
            return Ok(first);
        }
        resume_opts.tols.max_iter = Some(left);
    }
    let resumed = run_backtracking(f, first.theta_hat.clone(), data, &resume_opts)?;
    Ok(combine(first, resumed))
}

// ---- Helper Methods ----

fn run_backtracking<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    let solver = build_optimizer_backtracking(opts)?;
    run_lbfgs(theta0, opts, ArgMinAdapter::infeasible_as_infinite(f, data), solver)
}

/// Outcome of `resumed`, with the work of `first` added to its counters.
fn combine(first: OptimOutcome, mut resumed: OptimOutcome) -> OptimOutcome {
    resumed.iterations += first.iterations;
    for (name, count) in first.fn_evals {
        *resumed.fn_evals.entry(name).or_insert(0) += count;
    }
    resumed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::{Grad, Tolerances};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - End-to-end maximization of a concave quadratic with every line search.
    // - Recovery from trial steps outside the objective's domain.
    // - Propagation of `check` failures, non-finite starts and iteration-cap
    //   reporting.
    // -------------------------------------------------------------------------

    /// ℓ(θ) = -Σ w_i (θ_i - c_i)², maximized at θ = c.
    struct Shifted {
        center: Theta,
        weights: Theta,
    }

    impl Shifted {
        fn new(center: Theta) -> Self {
            let weights = Theta::ones(center.len());
            Self { center, weights }
        }
    }

    impl LogLikelihood for Shifted {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
            let d = theta - &self.center;
            Ok(-(&d * &d).dot(&self.weights))
        }

        fn check(&self, theta: &Theta, _: &()) -> OptResult<()> {
            if theta.len() != self.center.len() {
                return Err(OptError::ThetaLengthMismatch {
                    expected: self.center.len(),
                    actual: theta.len(),
                });
            }
            Ok(())
        }

        fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
            Ok((theta - &self.center) * &self.weights * -2.0)
        }
    }

    /// ℓ(θ) = ln θ - rate·θ on θ > 0 (NaN below), maximized at θ = 1 / rate.
    struct LogBarrier {
        rate: f64,
    }

    impl LogLikelihood for LogBarrier {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
            Ok(theta[0].ln() - self.rate * theta[0])
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
            Ok(array![1.0 / theta[0] - self.rate])
        }
    }

    #[test]
    // Purpose
    // -------
    // Every line search reaches the known maximizer.
    fn maximize_finds_quadratic_peak_with_every_line_search() {
        let f = Shifted::new(array![1.5, -2.0]);
        for ls in [LineSearcher::MoreThuente, LineSearcher::HagerZhang, LineSearcher::Backtracking]
        {
            let opts = MLEOptions { line_searcher: ls, ..MLEOptions::default() };

            let out = maximize(&f, array![0.0, 0.0], &(), &opts).unwrap();

            assert!(out.converged, "{ls:?} status: {}", out.status);
            assert_abs_diff_eq!(out.theta_hat[0], 1.5, epsilon = 1e-5);
            assert_abs_diff_eq!(out.theta_hat[1], -2.0, epsilon = 1e-5);
            assert_abs_diff_eq!(out.value, 0.0, epsilon = 1e-8);
        }
    }

    #[test]
    // Purpose
    // -------
    // A first unit step that leaves the domain does not end the run.
    //
    // Given
    // -----
    // - ℓ(θ) = ln θ - 10θ from θ₀ = 1: the steepest-descent unit step lands
    //   at θ = -8, where ℓ is NaN.
    //
    // Expect
    // ------
    // - Every line searcher converges to θ = 0.1.
    fn maximize_recovers_from_steps_outside_the_domain() {
        let f = LogBarrier { rate: 10.0 };
        for ls in [LineSearcher::MoreThuente, LineSearcher::HagerZhang, LineSearcher::Backtracking]
        {
            let opts = MLEOptions { line_searcher: ls, ..MLEOptions::default() };

            let out = maximize(&f, array![1.0], &(), &opts).unwrap();

            assert!(out.converged, "{ls:?} status: {}", out.status);
            assert_abs_diff_eq!(out.theta_hat[0], 0.1, epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // `check` failures and a non-finite ℓ(θ₀) stop the run before any solver
    // work.
    fn maximize_rejects_bad_starts() {
        let f = Shifted::new(array![0.0, 0.0]);
        let barrier = LogBarrier { rate: 1.0 };

        let length = maximize(&f, array![1.0], &(), &MLEOptions::default()).unwrap_err();
        let outside = maximize(&barrier, array![-1.0], &(), &MLEOptions::default()).unwrap_err();

        assert_eq!(length, OptError::ThetaLengthMismatch { expected: 2, actual: 1 });
        assert!(matches!(outside, OptError::NonFiniteCost { .. }));
    }

    #[test]
    // Purpose
    // -------
    // A one-iteration cap on an ill-conditioned quadratic, where a single
    // steepest-descent step cannot land on the optimum, is reported as not
    // converged rather than as an error.
    fn maximize_reports_iteration_cap_as_not_converged() {
        let f = Shifted { center: array![10.0, -10.0], weights: array![1.0, 50.0] };
        let tols = Tolerances::new(Some(1e-12), None, Some(1)).unwrap();
        let opts = MLEOptions::new(tols, LineSearcher::MoreThuente, false, None).unwrap();

        let out = maximize(&f, array![0.0, 0.0], &(), &opts).unwrap();

        assert!(!out.converged);
        assert_eq!(out.status, "MaxItersReached");
    }
}
