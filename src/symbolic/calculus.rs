//! Exact symbolic calculus over [`Expr`] graphs.
//!
//! - [`Expr::diff`]: derivative with respect to one symbol.
//! - [`jacobian`]: matrix of derivatives of several outputs with respect to
//!   a vector of symbols.
//! - [`Expr::substitute`]: replace symbols by expressions (typically literal
//!   data), re-simplifying on the way up so constant sub-trees collapse.
//! - [`Expr::free_symbols`]: symbols an expression depends on.
//!
//! Every pass memoises on node identity, so shared sub-graphs are visited
//! once and the output shares structure the same way the input does.
use crate::symbolic::{
    errors::{SymError, SymResult},
    expr::{BinaryOp, Expr, Node, Symbol, UnaryOp},
};
use std::collections::{HashMap, HashSet};

/// Mapping from symbols to replacement expressions.
pub type Substitution = HashMap<Symbol, Expr>;

impl Expr {
    /// Exact derivative of `self` with respect to `wrt`.
    pub fn diff(&self, wrt: &Symbol) -> Expr {
        let mut memo = HashMap::new();
        diff_memo(self, wrt, &mut memo)
    }

    /// Replace every symbol present in `subs`; other symbols are kept.
    pub fn substitute(&self, subs: &Substitution) -> Expr {
        let mut memo = HashMap::new();
        substitute_memo(self, subs, &mut memo)
    }

    /// Distinct symbols in order of first appearance (depth first).
    pub fn free_symbols(&self) -> Vec<Symbol> {
        let mut seen_nodes = HashSet::new();
        let mut seen_symbols = HashSet::new();
        let mut out = Vec::new();
        collect_symbols(self, &mut seen_nodes, &mut seen_symbols, &mut out);
        out
    }

    pub fn depends_on(&self, symbol: &Symbol) -> bool {
        self.free_symbols().iter().any(|s| s == symbol)
    }
}

/// Jacobian `J[i][k] = ∂ outputs[i] / ∂ wrt[k]`.
///
/// # Errors
/// - [`SymError::NotASymbol`] if any entry of `wrt` is not a pure symbol.
pub fn jacobian(outputs: &[Expr], wrt: &[Expr]) -> SymResult<Vec<Vec<Expr>>> {
    let symbols = as_symbols(wrt, 0)?;
    Ok(outputs
        .iter()
        .map(|out| {
            let mut memo = HashMap::new();
            symbols
                .iter()
                .map(|s| {
                    memo.clear();
                    diff_memo(out, s, &mut memo)
                })
                .collect()
        })
        .collect())
}

/// Gradient of a scalar with respect to `wrt` (one Jacobian row).
pub fn gradient(output: &Expr, wrt: &[Expr]) -> SymResult<Vec<Expr>> {
    let mut rows = jacobian(std::slice::from_ref(output), wrt)?;
    Ok(rows.remove(0))
}

/// Extract the symbols of a symbol vector, tagging errors with `arg`.
pub(crate) fn as_symbols(exprs: &[Expr], arg: usize) -> SymResult<Vec<Symbol>> {
    exprs
        .iter()
        .enumerate()
        .map(|(index, e)| e.as_symbol().cloned().ok_or(SymError::NotASymbol { arg, index }))
        .collect()
}

// ---- Helpers ----

fn diff_memo(e: &Expr, wrt: &Symbol, memo: &mut HashMap<usize, Expr>) -> Expr {
    if let Some(hit) = memo.get(&e.key()) {
        return hit.clone();
    }
    let d = match e.node() {
        Node::Const(_) => Expr::zero(),
        Node::Sym(s) => {
            if s == wrt {
                Expr::one()
            } else {
                Expr::zero()
            }
        }
        Node::Unary(op, a) => {
            let da = diff_memo(a, wrt, memo);
            if da.is_zero() {
                Expr::zero()
            } else {
                match op {
                    UnaryOp::Neg => -da,
                    UnaryOp::Ln => da / a,
                    UnaryOp::Exp => da * e,
                    UnaryOp::Sqrt => da / (2.0 * e),
                    UnaryOp::LnFactorial => Expr::zero(),
                    UnaryOp::Softplus => da * a.logistic(),
                    UnaryOp::Logistic => da * e * (1.0 - e),
                }
            }
        }
        Node::Binary(op, a, b) => {
            let da = diff_memo(a, wrt, memo);
            let db = diff_memo(b, wrt, memo);
            match op {
                BinaryOp::Add => da + db,
                BinaryOp::Sub => da - db,
                BinaryOp::Mul => da * b + a * db,
                // d(a/b) = (da - (a/b)·db) / b
                BinaryOp::Div => (da - e * db) / b,
            }
        }
        Node::Powi(a, n) => {
            let da = diff_memo(a, wrt, memo);
            if da.is_zero() { Expr::zero() } else { (*n as f64) * a.powi(n - 1) * da }
        }
        Node::Sum(terms) => Expr::sum(terms.iter().map(|t| diff_memo(t, wrt, memo))),
    };
    memo.insert(e.key(), d.clone());
    d
}

fn substitute_memo(e: &Expr, subs: &Substitution, memo: &mut HashMap<usize, Expr>) -> Expr {
    if let Some(hit) = memo.get(&e.key()) {
        return hit.clone();
    }
    let out = match e.node() {
        Node::Const(_) => e.clone(),
        Node::Sym(s) => subs.get(s).cloned().unwrap_or_else(|| e.clone()),
        Node::Unary(op, a) => Expr::unary(*op, &substitute_memo(a, subs, memo)),
        Node::Binary(op, a, b) => {
            let a = substitute_memo(a, subs, memo);
            let b = substitute_memo(b, subs, memo);
            Expr::binary(*op, &a, &b)
        }
        Node::Powi(a, n) => substitute_memo(a, subs, memo).powi(*n),
        Node::Sum(terms) => Expr::sum(terms.iter().map(|t| substitute_memo(t, subs, memo))),
    };
    memo.insert(e.key(), out.clone());
    out
}

fn collect_symbols(
    e: &Expr, seen_nodes: &mut HashSet<usize>, seen_symbols: &mut HashSet<Symbol>,
    out: &mut Vec<Symbol>,
) {
    if !seen_nodes.insert(e.key()) {
        return;
    }
    match e.node() {
        Node::Const(_) => {}
        Node::Sym(s) => {
            if seen_symbols.insert(s.clone()) {
                out.push(s.clone());
            }
        }
        Node::Unary(_, a) | Node::Powi(a, _) => collect_symbols(a, seen_nodes, seen_symbols, out),
        Node::Binary(_, a, b) => {
            collect_symbols(a, seen_nodes, seen_symbols, out);
            collect_symbols(b, seen_nodes, seen_symbols, out);
        }
        Node::Sum(terms) => {
            for t in terms {
                collect_symbols(t, seen_nodes, seen_symbols, out);
            }
        }
    }
}
