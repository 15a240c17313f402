//! Maximum-likelihood fitting of a model to one or many datasets.
//!
//! Purpose
//! -------
//! Compose the stored per-observation log-likelihoods into one scalar
//! negative log-likelihood per (design, replicate) cell, minimise it with
//! L-BFGS, and return fitted parameter vectors in the caller's nesting
//! shape.
//!
//! Key behaviors
//! -------------
//! - All validation (nesting, dataset shapes, values against each family's
//!   sample space, start vector, constraints) happens before any optimizer
//!   run.
//! - Each cell's objective is built fresh: literal inputs, then literal
//!   observed values, are substituted into the symbolic log-likelihood, so
//!   constant sub-graphs fold away before compilation.
//! - A cell that stops for any reason other than solver convergence or
//!   target cost fails the whole call with
//!   [`ModelError::OptimizerNonConvergence`]; no partial results.
//! - With `parallel` set, cells run on the rayon pool. Cells share nothing
//!   mutable.
use crate::{
    fit::{constraints::Reparam, objective::CellObjective, options::FitOptions},
    model::{
        design::Dataset,
        errors::{ModelError, ModelResult},
        nesting::Nested,
        registry::Model,
    },
    optimization::loglik_optimizer::{MLEOptions, Theta, maximize},
    symbolic::{Expr, Substitution},
};
use rayon::prelude::*;

impl Model {
    /// Fit the model to every dataset in `datasets`.
    ///
    /// Parameters
    /// ----------
    /// - `datasets`: one dataset, a list of replicates, or a list of designs
    ///   each holding replicates.
    /// - `start`: initial parameter vector in model space, length
    ///   `num_params`.
    /// - `options`: optimizer settings, optional per-parameter constraints,
    ///   and the parallel switch.
    ///
    /// Returns
    /// -------
    /// Fitted parameter vectors nested exactly like `datasets`.
    ///
    /// Errors
    /// ------
    /// - [`ModelError::Shape`] for an empty nesting, a malformed dataset, a
    ///   value outside its family's sample space, a start vector of the wrong
    ///   length or with non-finite entries, or a constraint list whose length
    ///   is not `num_params`.
    /// - [`ModelError::InvalidConstraint`] for bad bounds or a start outside
    ///   its feasible set.
    /// - [`ModelError::OptimizerNonConvergence`] naming the first failing
    ///   cell.
    /// - [`ModelError::Optimization`] / [`ModelError::Symbolic`] for optimizer
    ///   or evaluation failures.
    pub fn fit(
        &self, datasets: Nested<Dataset>, start: &Theta, options: &FitOptions,
    ) -> ModelResult<Nested<Theta>> {
        let (depth, grid) = datasets.normalize()?;
        let start = self.theta_slice(start)?;
        if let Some((index, value)) = start.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ModelError::shape(format!("start value {index} is not finite: {value}")));
        }
        for design in &grid {
            for dataset in design {
                self.check_dataset(dataset)?;
            }
        }
        let reparam = Reparam::new(&options.constraints, start)?;
        let free_start = reparam.to_free(start);

        let cells: Vec<(usize, usize, &Dataset)> = grid
            .iter()
            .enumerate()
            .flat_map(|(d, design)| design.iter().enumerate().map(move |(r, data)| (d, r, data)))
            .collect();
        let fit_one = |&(design, replicate, data): &(usize, usize, &Dataset)| {
            self.fit_cell(design, replicate, data, &reparam, &free_start, &options.mle)
        };
        let fitted: Vec<Theta> = if options.parallel {
            cells.par_iter().map(fit_one).collect::<ModelResult<_>>()?
        } else {
            cells.iter().map(fit_one).collect::<ModelResult<_>>()?
        };

        let mut fitted = fitted.into_iter();
        let fitted_grid: Vec<Vec<Theta>> =
            grid.iter().map(|design| fitted.by_ref().take(design.len()).collect()).collect();
        Nested::denormalize(depth, fitted_grid)
    }

    fn fit_cell(
        &self, design: usize, replicate: usize, data: &Dataset, reparam: &Reparam,
        free_start: &Theta, mle: &MLEOptions,
    ) -> ModelResult<Theta> {
        log::debug!(
            "fitting design {design}, replicate {replicate} ({} values)",
            data.num_values()
        );
        let nll = self.negative_loglik_expr(data);
        let (args, objective_expr) = reparam.apply(&nll, &self.params);
        let objective = CellObjective::new(&objective_expr, &args)?;

        let outcome = maximize(&objective, free_start.clone(), &(), mle)?;
        if !outcome.converged {
            log::warn!(
                "optimizer stopped without converging for design {design}, replicate {replicate}: \
                 {} after {} iterations",
                outcome.status,
                outcome.iterations
            );
            return Err(ModelError::OptimizerNonConvergence {
                design,
                replicate,
                status: outcome.status,
            });
        }
        log::debug!(
            "design {design}, replicate {replicate} converged in {} iterations, loglik {:.6}",
            outcome.iterations,
            outcome.value
        );
        Ok(reparam.to_model(&outcome.theta_hat))
    }

    /// `-Σ_rows Σ_obs Σ_values ℓ_obs(y, θ, x_row)` with all data substituted.
    fn negative_loglik_expr(&self, data: &Dataset) -> Expr {
        let mut terms = Vec::with_capacity(data.num_values());
        for (x, per_obs) in data.inputs.iter().zip(&data.observations) {
            let row_subs: Substitution =
                self.inputs.iter().cloned().zip(x.iter().map(|&v| Expr::constant(v))).collect();
            for (entry, values) in self.observations.iter().zip(per_obs) {
                if values.is_empty() {
                    continue;
                }
                let row_loglik = entry.loglik_expr.substitute(&row_subs);
                for &y in values {
                    let mut y_subs = Substitution::new();
                    y_subs.insert(entry.y.clone(), Expr::constant(y));
                    terms.push(row_loglik.substitute(&y_subs));
                }
            }
        }
        -Expr::sum(terms)
    }
}
