//! Compiled per-cell objective.
//!
//! One [`CellObjective`] is built per (design, replicate) cell from the
//! cell's total negative log-likelihood expression. Value and exact gradient
//! are compiled once; the optimizer then only runs instruction tapes.
use crate::{
    model::errors::ModelResult,
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Cost, Grad, LogLikelihood, Theta},
    },
    symbolic::{Expr, Function, gradient},
};

#[derive(Debug, Clone)]
pub(crate) struct CellObjective {
    nll: Function,
    nll_grad: Function,
    dim: usize,
}

impl CellObjective {
    /// Compile `nll` and `∇nll` as functions of `args`.
    pub(crate) fn new(nll: &Expr, args: &[Expr]) -> ModelResult<Self> {
        let grad = gradient(nll, args)?;
        Ok(Self {
            nll: Function::new("nll", vec![args.to_vec()], vec![nll.clone()])?,
            nll_grad: Function::new("nll_grad", vec![args.to_vec()], grad)?,
            dim: args.len(),
        })
    }

    fn call(&self, f: &Function, theta: &Theta) -> OptResult<Vec<f64>> {
        let out = match theta.as_slice() {
            Some(values) => f.call(&[values]),
            None => f.call(&[&theta.to_vec()]),
        };
        Ok(out?)
    }
}

impl LogLikelihood for CellObjective {
    type Data = ();

    /// `ℓ(θ) = -nll(θ)`.
    fn value(&self, theta: &Theta, _data: &()) -> OptResult<Cost> {
        Ok(-self.call(&self.nll, theta)?[0])
    }

    fn check(&self, theta: &Theta, _data: &()) -> OptResult<()> {
        if theta.len() != self.dim {
            return Err(OptError::ThetaLengthMismatch { expected: self.dim, actual: theta.len() });
        }
        if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(OptError::InvalidThetaInput { index, value });
        }
        Ok(())
    }

    /// `∇ℓ(θ) = -∇nll(θ)`.
    fn grad(&self, theta: &Theta, _data: &()) -> OptResult<Grad> {
        let g = self.call(&self.nll_grad, theta)?;
        Ok(g.into_iter().map(|v| -v).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Sign convention: value and gradient are the negated NLL.
    // - `check` rejects wrong lengths and non-finite entries.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // For nll = (a - 1)² + 2b², ℓ and ∇ℓ carry the opposite sign.
    fn value_and_grad_negate_nll() {
        let args = Expr::symbols("p", 2);
        let nll = (&args[0] - 1.0).powi(2) + 2.0 * args[1].powi(2);
        let obj = CellObjective::new(&nll, &args).unwrap();
        let theta = array![3.0, -1.0];

        let value = obj.value(&theta, &()).unwrap();
        let grad = obj.grad(&theta, &()).unwrap();

        assert_eq!(value, -6.0);
        assert_eq!(grad, array![-4.0, 4.0]);
    }

    #[test]
    // Purpose
    // -------
    // Malformed parameter vectors are rejected before evaluation.
    fn check_rejects_bad_theta() {
        let args = Expr::symbols("p", 2);
        let obj = CellObjective::new(&(&args[0] * &args[1]), &args).unwrap();

        assert_eq!(
            obj.check(&array![1.0], &()).unwrap_err(),
            OptError::ThetaLengthMismatch { expected: 2, actual: 1 }
        );
        assert!(matches!(
            obj.check(&array![1.0, f64::NAN], &()),
            Err(OptError::InvalidThetaInput { index: 1, .. })
        ));
    }
}
