//! symbolic — expression graphs, exact differentiation, and compiled functions.
//!
//! Purpose
//! -------
//! Provide the small symbolic engine the likelihood layer is written in:
//! build scalar expressions from named symbols, differentiate them exactly,
//! substitute literal data, and compile the result into a callable
//! [`Function`]. This is the only place derivatives are produced; nothing in
//! the crate uses finite differences for the likelihood or the FIM.
//!
//! Key behaviors
//! -------------
//! - [`Expr`]: immutable, `Arc`-shared DAG with simplifying constructors and
//!   overloaded arithmetic.
//! - [`Expr::diff`], [`jacobian`], [`gradient`]: exact symbolic calculus,
//!   memoised over shared sub-graphs.
//! - [`Expr::substitute`]: replace symbols (e.g. observed values, input rows)
//!   with expressions or constants.
//! - [`Function`]: signature-checked compilation to an instruction tape.
//!
//! Invariants & assumptions
//! ------------------------
//! - Symbols are identified by a process-unique id; names are for display.
//! - All types here are `Send + Sync` and may be shared across worker threads.
//! - Structural misuse is reported as [`SymError`]; numerical edge cases are
//!   values, not errors.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for its own contract; derivative
//!   rules are checked numerically against closed forms.

pub mod calculus;
pub mod errors;
pub mod expr;
pub mod function;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::calculus::{Substitution, gradient, jacobian};
pub use self::errors::{SymError, SymResult};
pub use self::expr::{BinaryOp, Expr, Symbol, UnaryOp};
pub use self::function::Function;
