//! Expression graph: symbols, nodes, simplifying constructors and operators.
//!
//! Purpose
//! -------
//! Represent scalar expressions over named symbols as an immutable,
//! reference-counted DAG. Sub-expressions are shared by cloning the `Arc`
//! handle, so building `μ`, `σ²` and their derivatives never deep-copies a
//! tree.
//!
//! Key behaviors
//! -------------
//! - [`Symbol`] carries a process-unique id and a display name; equality and
//!   hashing use the id only, so two symbols named `"theta_0"` created in
//!   different models never alias.
//! - [`Expr`] constructors fold constants and apply the additive and
//!   multiplicative identities (`x + 0`, `x · 1`, `x · 0`, `x / 1`, `x⁰`,
//!   `x¹`, `--x`). Jacobians are dominated by such terms, so this keeps
//!   derivative graphs small.
//! - Arithmetic operators are implemented for every owned / borrowed mix of
//!   `Expr` and `f64`.
//! - [`Expr::ln_factorial`] is the log-factorial primitive used by count
//!   likelihoods. It evaluates `ln Γ(y + 1)` and differentiates to zero.
//! - [`Expr::softplus`] and [`Expr::logistic`] are the guarded transforms
//!   behind parameter constraints; they stay finite where the composed
//!   `ln(1 + exp(x))` would overflow or underflow.
//!
//! Invariants & assumptions
//! ------------------------
//! - Expressions are immutable after construction and `Send + Sync`.
//! - Node identity (the `Arc` pointer) is used as a memoisation key by the
//!   calculus and compilation passes; it is only meaningful while the root
//!   expression is alive.
//!
//! Testing notes
//! -------------
//! - Unit tests cover constant folding, identity simplifications, symbol
//!   identity and display formatting.
use crate::optimization::numerical_stability::{safe_logistic, safe_softplus};
use statrs::function::gamma::ln_gamma;
use std::{
    fmt,
    ops::{Add, Div, Mul, Neg, Sub},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

static NEXT_SYMBOL_ID: AtomicUsize = AtomicUsize::new(0);

/// Named scalar variable.
#[derive(Debug, Clone)]
pub struct Symbol {
    id: usize,
    name: Arc<str>,
}

impl Symbol {
    /// Create a fresh symbol; every call yields a distinct identity.
    pub fn new(name: impl AsRef<str>) -> Self {
        let id = NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed);
        Self { id, name: Arc::from(name.as_ref()) }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Unary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Ln,
    Exp,
    Sqrt,
    /// `ln(y!) = ln Γ(y + 1)`; derivative declared zero.
    LnFactorial,
    /// `ln(1 + exp(a))`, evaluated without overflow for large `a`.
    Softplus,
    /// `1 / (1 + exp(-a))`, evaluated without overflow in either tail.
    Logistic,
}

impl UnaryOp {
    pub(crate) fn apply(self, a: f64) -> f64 {
        match self {
            UnaryOp::Neg => -a,
            UnaryOp::Ln => a.ln(),
            UnaryOp::Exp => a.exp(),
            UnaryOp::Sqrt => a.sqrt(),
            UnaryOp::LnFactorial => ln_gamma(a + 1.0),
            UnaryOp::Softplus => safe_softplus(a),
            UnaryOp::Logistic => safe_logistic(a),
        }
    }
}

/// Binary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Debug)]
pub(crate) enum Node {
    Const(f64),
    Sym(Symbol),
    Unary(UnaryOp, Expr),
    Binary(BinaryOp, Expr, Expr),
    Powi(Expr, i32),
    Sum(Vec<Expr>),
}

/// Scalar symbolic expression (cheap to clone).
#[derive(Debug, Clone)]
pub struct Expr(Arc<Node>);

impl Expr {
    fn from_node(node: Node) -> Self {
        Expr(Arc::new(node))
    }

    pub(crate) fn node(&self) -> &Node {
        &self.0
    }

    /// Identity of the underlying node, used as a memoisation key.
    pub(crate) fn key(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    // ---- Leaves ----

    pub fn constant(value: f64) -> Self {
        Expr::from_node(Node::Const(value))
    }

    pub fn zero() -> Self {
        Expr::constant(0.0)
    }

    pub fn one() -> Self {
        Expr::constant(1.0)
    }

    /// Fresh symbol wrapped as an expression.
    pub fn symbol(name: impl AsRef<str>) -> Self {
        Expr::from_node(Node::Sym(Symbol::new(name)))
    }

    pub fn from_symbol(symbol: &Symbol) -> Self {
        Expr::from_node(Node::Sym(symbol.clone()))
    }

    /// `n` fresh symbols named `name_0 .. name_{n-1}`.
    pub fn symbols(name: &str, n: usize) -> Vec<Expr> {
        (0..n).map(|i| Expr::symbol(format!("{name}_{i}"))).collect()
    }

    // ---- Inspection ----

    pub fn as_constant(&self) -> Option<f64> {
        match self.node() {
            Node::Const(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self.node() {
            Node::Sym(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_constant() == Some(0.0)
    }

    pub fn is_one(&self) -> bool {
        self.as_constant() == Some(1.0)
    }

    // ---- Simplifying constructors ----

    pub fn unary(op: UnaryOp, a: &Expr) -> Expr {
        if let Some(c) = a.as_constant() {
            return Expr::constant(op.apply(c));
        }
        if op == UnaryOp::Neg {
            if let Node::Unary(UnaryOp::Neg, inner) = a.node() {
                return inner.clone();
            }
        }
        Expr::from_node(Node::Unary(op, a.clone()))
    }

    pub fn binary(op: BinaryOp, a: &Expr, b: &Expr) -> Expr {
        if let (Some(x), Some(y)) = (a.as_constant(), b.as_constant()) {
            return Expr::constant(op.apply(x, y));
        }
        match op {
            BinaryOp::Add => {
                if a.is_zero() {
                    return b.clone();
                }
                if b.is_zero() {
                    return a.clone();
                }
            }
            BinaryOp::Sub => {
                if b.is_zero() {
                    return a.clone();
                }
                if a.is_zero() {
                    return Expr::unary(UnaryOp::Neg, b);
                }
            }
            BinaryOp::Mul => {
                if a.is_zero() || b.is_zero() {
                    return Expr::zero();
                }
                if a.is_one() {
                    return b.clone();
                }
                if b.is_one() {
                    return a.clone();
                }
                if a.as_constant() == Some(-1.0) {
                    return Expr::unary(UnaryOp::Neg, b);
                }
                if b.as_constant() == Some(-1.0) {
                    return Expr::unary(UnaryOp::Neg, a);
                }
            }
            BinaryOp::Div => {
                if a.is_zero() {
                    return Expr::zero();
                }
                if b.is_one() {
                    return a.clone();
                }
            }
        }
        Expr::from_node(Node::Binary(op, a.clone(), b.clone()))
    }

    /// `self^n` for an integer exponent.
    pub fn powi(&self, n: i32) -> Expr {
        match n {
            0 => Expr::one(),
            1 => self.clone(),
            _ => match self.as_constant() {
                Some(c) => Expr::constant(c.powi(n)),
                None => Expr::from_node(Node::Powi(self.clone(), n)),
            },
        }
    }

    pub fn ln(&self) -> Expr {
        Expr::unary(UnaryOp::Ln, self)
    }

    pub fn exp(&self) -> Expr {
        Expr::unary(UnaryOp::Exp, self)
    }

    pub fn sqrt(&self) -> Expr {
        Expr::unary(UnaryOp::Sqrt, self)
    }

    /// Log-factorial primitive `ln(self!)`, evaluated through `ln Γ(self + 1)`.
    ///
    /// The derivative is declared zero: the argument is always an observed
    /// count, never a function of the parameters.
    pub fn ln_factorial(&self) -> Expr {
        Expr::unary(UnaryOp::LnFactorial, self)
    }

    /// Softplus primitive `ln(1 + exp(self))`. Its derivative is
    /// `logistic(self)`.
    pub fn softplus(&self) -> Expr {
        Expr::unary(UnaryOp::Softplus, self)
    }

    /// Logistic primitive `1 / (1 + exp(-self))`.
    pub fn logistic(&self) -> Expr {
        Expr::unary(UnaryOp::Logistic, self)
    }

    /// n-ary sum. Constants are folded into a single trailing term and nested
    /// sums are flattened, so summing thousands of per-sample terms produces a
    /// flat node rather than a deep chain.
    pub fn sum<I: IntoIterator<Item = Expr>>(terms: I) -> Expr {
        let mut constant = 0.0;
        let mut flat: Vec<Expr> = Vec::new();
        for term in terms {
            if let Some(c) = term.as_constant() {
                constant += c;
                continue;
            }
            if let Node::Sum(inner) = term.node() {
                for t in inner {
                    match t.as_constant() {
                        Some(c) => constant += c,
                        None => flat.push(t.clone()),
                    }
                }
                continue;
            }
            flat.push(term);
        }
        if constant != 0.0 || flat.is_empty() {
            flat.push(Expr::constant(constant));
        }
        if flat.len() == 1 {
            return flat.remove(0);
        }
        Expr::from_node(Node::Sum(flat))
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::constant(value)
    }
}

impl From<&Symbol> for Expr {
    fn from(symbol: &Symbol) -> Self {
        Expr::from_symbol(symbol)
    }
}

impl std::iter::Sum for Expr {
    fn sum<I: Iterator<Item = Expr>>(iter: I) -> Self {
        Expr::sum(iter)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            Node::Const(c) => write!(f, "{c}"),
            Node::Sym(s) => write!(f, "{}", s.name()),
            Node::Unary(UnaryOp::Neg, a) => write!(f, "(-{a})"),
            Node::Unary(UnaryOp::Ln, a) => write!(f, "ln({a})"),
            Node::Unary(UnaryOp::Exp, a) => write!(f, "exp({a})"),
            Node::Unary(UnaryOp::Sqrt, a) => write!(f, "sqrt({a})"),
            Node::Unary(UnaryOp::LnFactorial, a) => write!(f, "lnfact({a})"),
            Node::Unary(UnaryOp::Softplus, a) => write!(f, "softplus({a})"),
            Node::Unary(UnaryOp::Logistic, a) => write!(f, "logistic({a})"),
            Node::Binary(op, a, b) => write!(f, "({a} {} {b})", op.symbol()),
            Node::Powi(a, n) => write!(f, "{a}^{n}"),
            Node::Sum(terms) => {
                write!(f, "(")?;
                for (i, t) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, ")")
            }
        }
    }
}

// ---- Operator overloading ----

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, &self)
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

macro_rules! impl_binary_op {
    ($Trait:ident, $method:ident, $op:expr) => {
        impl $Trait<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, &self, &rhs)
            }
        }
        impl $Trait<&Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary($op, &self, rhs)
            }
        }
        impl $Trait<Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, &rhs)
            }
        }
        impl $Trait<&Expr> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }
        impl $Trait<f64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                Expr::binary($op, &self, &Expr::constant(rhs))
            }
        }
        impl $Trait<f64> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                Expr::binary($op, self, &Expr::constant(rhs))
            }
        }
        impl $Trait<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, &Expr::constant(self), &rhs)
            }
        }
        impl $Trait<&Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: &Expr) -> Expr {
                Expr::binary($op, &Expr::constant(self), rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, BinaryOp::Add);
impl_binary_op!(Sub, sub, BinaryOp::Sub);
impl_binary_op!(Mul, mul, BinaryOp::Mul);
impl_binary_op!(Div, div, BinaryOp::Div);

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Constant folding in unary, binary, powi and n-ary sum constructors.
    // - Identity simplifications that keep derivative graphs compact.
    // - Symbol identity semantics and display formatting.
    //
    // They intentionally DO NOT cover:
    // - Differentiation and substitution (see `calculus`).
    // - Numerical evaluation of non-constant graphs (see `function`).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Arithmetic on constants should collapse to a single constant node.
    //
    // Given
    // -----
    // - Constants 2 and 3 combined through every binary operator, `powi`,
    //   `ln`, `exp` and `ln_factorial`.
    //
    // Expect
    // ------
    // - Each result is a constant with the expected value.
    fn constants_fold_through_every_constructor() {
        // Arrange
        let two = Expr::constant(2.0);
        let three = Expr::constant(3.0);

        // Act / Assert
        assert_eq!((&two + &three).as_constant(), Some(5.0));
        assert_eq!((&two - &three).as_constant(), Some(-1.0));
        assert_eq!((&two * &three).as_constant(), Some(6.0));
        assert_eq!((&three / 2.0).as_constant(), Some(1.5));
        assert_eq!(two.powi(3).as_constant(), Some(8.0));
        assert_eq!(Expr::one().ln().as_constant(), Some(0.0));
        assert_eq!(Expr::zero().exp().as_constant(), Some(1.0));
        let ln_fact_3 = three.ln_factorial().as_constant().unwrap();
        assert!((ln_fact_3 - 6.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Identity elements should not create new nodes.
    //
    // Given
    // -----
    // - A symbol `x`.
    //
    // Expect
    // ------
    // - `x + 0`, `x * 1`, `x / 1`, `x^1` return `x` itself.
    // - `x * 0` and `0 / x` return the constant zero.
    // - `--x` returns `x`.
    fn identities_return_existing_nodes() {
        // Arrange
        let x = Expr::symbol("x");

        // Act / Assert
        assert_eq!((&x + 0.0).key(), x.key());
        assert_eq!((&x * 1.0).key(), x.key());
        assert_eq!((&x / 1.0).key(), x.key());
        assert_eq!(x.powi(1).key(), x.key());
        assert!((&x * 0.0).is_zero());
        assert!((0.0 / &x).is_zero());
        assert_eq!((-(-&x)).key(), x.key());
        assert!(x.powi(0).is_one());
    }

    #[test]
    // Purpose
    // -------
    // `Expr::sum` should flatten nested sums and fold constants.
    //
    // Given
    // -----
    // - Terms `x`, 1, `(y + 2)` as a nested sum, and 3.
    //
    // Expect
    // ------
    // - One flat sum node with `x`, `y` and a single constant 6.
    fn sum_flattens_and_folds_constants() {
        // Arrange
        let x = Expr::symbol("x");
        let y = Expr::symbol("y");
        let inner = Expr::sum([y.clone(), Expr::constant(2.0)]);

        // Act
        let total = Expr::sum([x.clone(), Expr::constant(1.0), inner, Expr::constant(3.0)]);

        // Assert
        match total.node() {
            Node::Sum(terms) => {
                assert_eq!(terms.len(), 3);
                assert_eq!(terms[0].key(), x.key());
                assert_eq!(terms[1].key(), y.key());
                assert_eq!(terms[2].as_constant(), Some(6.0));
            }
            other => panic!("expected a sum node, found {other:?}"),
        }
        assert_eq!(Expr::sum(Vec::new()).as_constant(), Some(0.0));
    }

    #[test]
    // Purpose
    // -------
    // Symbols are identified by id, not by name.
    //
    // Given
    // -----
    // - Two symbols created with the same name.
    //
    // Expect
    // ------
    // - They compare unequal; a clone compares equal.
    fn symbols_with_equal_names_are_distinct() {
        let a = Symbol::new("theta");
        let b = Symbol::new("theta");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.name(), "theta");
    }

    #[test]
    // Purpose
    // -------
    // Display output should be a readable infix form.
    fn display_renders_infix() {
        let x = Expr::symbol("x");
        let e = (&x + 1.0).ln() * 2.0;
        assert_eq!(e.to_string(), "(ln((x + 1)) * 2)");
    }
}
