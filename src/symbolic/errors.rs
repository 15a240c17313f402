//! Errors for the symbolic expression engine.
//!
//! All failures here are structural: a non-symbol where a symbol is
//! required, a symbol that a compiled function cannot bind, or a call whose
//! argument layout disagrees with the compiled signature. Numerical problems
//! (NaN, ±∞) are *not* errors at this layer; they propagate as values and are
//! judged by the optimizer and model layers.

/// Result alias for symbolic operations.
pub type SymResult<T> = Result<T, SymError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SymError {
    // ---- Signatures ----
    /// An argument slot of a function (or a Jacobian variable) is not a pure symbol.
    NotASymbol { arg: usize, index: usize },

    /// The same symbol appears twice across a function's arguments.
    DuplicateArgument { name: String },

    /// An output depends on a symbol that no argument binds.
    FreeSymbol { function: String, name: String },

    // ---- Calls ----
    /// Wrong number of arguments passed to a compiled function.
    ArgCountMismatch { function: String, expected: usize, found: usize },

    /// An argument has the wrong length.
    ArgLengthMismatch { function: String, arg: usize, expected: usize, found: usize },
}

impl std::error::Error for SymError {}

impl std::fmt::Display for SymError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymError::NotASymbol { arg, index } => {
                write!(f, "Argument {arg}, entry {index} is not a pure symbol")
            }
            SymError::DuplicateArgument { name } => {
                write!(f, "Symbol '{name}' is bound by more than one argument entry")
            }
            SymError::FreeSymbol { function, name } => {
                write!(f, "Function '{function}' depends on unbound symbol '{name}'")
            }
            SymError::ArgCountMismatch { function, expected, found } => {
                write!(f, "Function '{function}' expects {expected} arguments, found {found}")
            }
            SymError::ArgLengthMismatch { function, arg, expected, found } => {
                write!(
                    f,
                    "Function '{function}' argument {arg} has length {found}, expected {expected}"
                )
            }
        }
    }
}
