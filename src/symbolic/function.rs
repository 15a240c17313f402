//! Compilation of expression graphs into callable functions.
//!
//! Purpose
//! -------
//! Turn a set of output expressions plus an ordered list of symbolic
//! arguments into a [`Function`]: a flat, topologically ordered instruction
//! tape evaluated with a single forward sweep. Shared sub-expressions are
//! emitted once and reused by slot index.
//!
//! Key behaviors
//! -------------
//! - Validates the signature at construction: every argument entry must be a
//!   distinct pure symbol, and every symbol the outputs depend on must be
//!   bound by some argument.
//! - Validates calls: argument count and per-argument lengths must match the
//!   compiled signature.
//! - Evaluation is allocation-light (one scratch buffer per call) and never
//!   panics on numerical input; NaN / ±∞ propagate as values.
//!
//! Conventions
//! -----------
//! - Arguments are vectors (`Vec<Expr>` of symbols); a scalar argument is a
//!   length-1 vector. Inputs are passed as `&[&[f64]]` in the same order.
//! - Outputs are returned as a flat `Vec<f64>` in the order given at
//!   construction. Matrix-valued functions flatten row-major.
use crate::symbolic::{
    calculus::as_symbols,
    errors::{SymError, SymResult},
    expr::{BinaryOp, Expr, Node, Symbol, UnaryOp},
};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
enum Instr {
    Const(f64),
    Input(usize),
    Unary(UnaryOp, usize),
    Binary(BinaryOp, usize, usize),
    Powi(usize, i32),
    /// Sum of `operands[start .. start + len]`.
    Sum { start: usize, len: usize },
}

/// Compiled, immutable, thread-safe callable.
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    arg_sizes: Vec<usize>,
    tape: Vec<Instr>,
    operands: Vec<usize>,
    outputs: Vec<usize>,
}

impl Function {
    /// Compile `outputs` as a function of `args`.
    ///
    /// # Errors
    /// - [`SymError::NotASymbol`] if an argument entry is not a symbol.
    /// - [`SymError::DuplicateArgument`] if a symbol is bound twice.
    /// - [`SymError::FreeSymbol`] if an output depends on an unbound symbol.
    pub fn new(name: impl Into<String>, args: Vec<Vec<Expr>>, outputs: Vec<Expr>) -> SymResult<Self> {
        let name = name.into();
        let mut slots: HashMap<Symbol, usize> = HashMap::new();
        let mut arg_sizes = Vec::with_capacity(args.len());
        let mut flat = 0usize;
        for (arg, entries) in args.iter().enumerate() {
            for symbol in as_symbols(entries, arg)? {
                if slots.insert(symbol.clone(), flat).is_some() {
                    return Err(SymError::DuplicateArgument { name: symbol.name().to_string() });
                }
                flat += 1;
            }
            arg_sizes.push(entries.len());
        }

        let mut compiler = Compiler {
            function: &name,
            slots: &slots,
            memo: HashMap::new(),
            tape: Vec::new(),
            operands: Vec::new(),
        };
        let output_slots =
            outputs.iter().map(|out| compiler.emit(out)).collect::<SymResult<Vec<usize>>>()?;
        let Compiler { tape, operands, .. } = compiler;
        Ok(Self { name, arg_sizes, tape, operands, outputs: output_slots })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_args(&self) -> usize {
        self.arg_sizes.len()
    }

    pub fn arg_sizes(&self) -> &[usize] {
        &self.arg_sizes
    }

    pub fn n_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Evaluate at numeric arguments.
    ///
    /// # Errors
    /// - [`SymError::ArgCountMismatch`] / [`SymError::ArgLengthMismatch`] when
    ///   `args` does not match the compiled signature.
    pub fn call(&self, args: &[&[f64]]) -> SymResult<Vec<f64>> {
        if args.len() != self.arg_sizes.len() {
            return Err(SymError::ArgCountMismatch {
                function: self.name.clone(),
                expected: self.arg_sizes.len(),
                found: args.len(),
            });
        }
        let mut inputs = Vec::with_capacity(self.arg_sizes.iter().sum());
        for (arg, (values, &expected)) in args.iter().zip(&self.arg_sizes).enumerate() {
            if values.len() != expected {
                return Err(SymError::ArgLengthMismatch {
                    function: self.name.clone(),
                    arg,
                    expected,
                    found: values.len(),
                });
            }
            inputs.extend_from_slice(values);
        }

        let mut vals = Vec::with_capacity(self.tape.len());
        for instr in &self.tape {
            let v = match *instr {
                Instr::Const(c) => c,
                Instr::Input(i) => inputs[i],
                Instr::Unary(op, a) => op.apply(vals[a]),
                Instr::Binary(op, a, b) => op.apply(vals[a], vals[b]),
                Instr::Powi(a, n) => f64::powi(vals[a], n),
                Instr::Sum { start, len } => {
                    self.operands[start..start + len].iter().map(|&i| vals[i]).sum()
                }
            };
            vals.push(v);
        }
        Ok(self.outputs.iter().map(|&slot| vals[slot]).collect())
    }
}

// ---- Helpers ----

struct Compiler<'a> {
    function: &'a str,
    slots: &'a HashMap<Symbol, usize>,
    memo: HashMap<usize, usize>,
    tape: Vec<Instr>,
    operands: Vec<usize>,
}

impl Compiler<'_> {
    fn push(&mut self, instr: Instr) -> usize {
        self.tape.push(instr);
        self.tape.len() - 1
    }

    fn emit(&mut self, e: &Expr) -> SymResult<usize> {
        if let Some(&slot) = self.memo.get(&e.key()) {
            return Ok(slot);
        }
        let instr = match e.node() {
            Node::Const(c) => Instr::Const(*c),
            Node::Sym(s) => match self.slots.get(s) {
                Some(&i) => Instr::Input(i),
                None => {
                    return Err(SymError::FreeSymbol {
                        function: self.function.to_string(),
                        name: s.name().to_string(),
                    });
                }
            },
            Node::Unary(op, a) => Instr::Unary(*op, self.emit(a)?),
            Node::Binary(op, a, b) => {
                let a = self.emit(a)?;
                let b = self.emit(b)?;
                Instr::Binary(*op, a, b)
            }
            Node::Powi(a, n) => Instr::Powi(self.emit(a)?, *n),
            Node::Sum(terms) => {
                let slots = terms.iter().map(|t| self.emit(t)).collect::<SymResult<Vec<usize>>>()?;
                let start = self.operands.len();
                self.operands.extend_from_slice(&slots);
                Instr::Sum { start, len: slots.len() }
            }
        };
        let slot = self.push(instr);
        self.memo.insert(e.key(), slot);
        Ok(slot)
    }
}
