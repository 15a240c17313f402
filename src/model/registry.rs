//! Model registry: validated names, derived likelihoods, compiled functions.
//!
//! Purpose
//! -------
//! Build an immutable [`Model`] from a list of [`ObservationDef`]s plus the
//! ordered input and parameter names. Construction validates every name and
//! arity, runs each family derivation once, and compiles the resulting
//! expressions into [`Function`]s so evaluation, sampling and fitting never
//! re-derive anything.
//!
//! Key behaviors
//! -------------
//! - Validation order: empty observation list, duplicate names (input,
//!   parameter, observation), per-observation statistic arity against the
//!   first observation, then name counts against that arity.
//! - Per observation, four compiled functions are stored:
//!   - statistics `(θ, x) → stats`,
//!   - sensitivity `(θ, x) → ∂stats/∂θ` flattened row-major,
//!   - log-likelihood `([y], θ, x) → ℓ`,
//!   - FIM `(θ, x) → I` flattened row-major.
//! - The symbolic log-likelihood is also kept for the fitter, which
//!   substitutes literal data into it.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameter and input symbols are shared by all observations, so every
//!   stored expression lives in one symbol space.
//! - A constructed `Model` is `Send + Sync` and never mutated.
use crate::{
    model::{
        distribution::Distribution,
        errors::{ModelError, ModelResult, NameCategory},
        observation::{ObservationDef, StatisticFn},
    },
    symbolic::{Expr, Function, Symbol, jacobian},
};
use std::collections::HashMap;

/// Compiled per-observation state.
#[derive(Debug, Clone)]
pub(crate) struct ObservationEntry {
    pub(crate) name: String,
    pub(crate) family: Distribution,
    pub(crate) statistic: StatisticFn,
    pub(crate) y: Symbol,
    pub(crate) loglik_expr: Expr,
    pub(crate) statistic_fn: Function,
    pub(crate) sensitivity_fn: Function,
    pub(crate) loglik_fn: Function,
    pub(crate) fim_fn: Function,
}

/// Immutable nonlinear regression model.
#[derive(Debug, Clone)]
pub struct Model {
    input_names: Vec<String>,
    param_names: Vec<String>,
    input_index: HashMap<String, usize>,
    param_index: HashMap<String, usize>,
    observation_index: HashMap<String, usize>,
    pub(crate) params: Vec<Symbol>,
    pub(crate) inputs: Vec<Symbol>,
    pub(crate) observations: Vec<ObservationEntry>,
}

impl Model {
    /// Validate the definitions and build the model.
    ///
    /// Parameters
    /// ----------
    /// - `observations`: one definition per observable, in index order.
    /// - `input_names`: ordered input names; length must equal the declared
    ///   input arity of every statistic function.
    /// - `param_names`: ordered parameter names; length must equal the
    ///   declared parameter arity of every statistic function.
    ///
    /// Errors
    /// ------
    /// - [`ModelError::DimensionMismatch`] for an empty observation list, an
    ///   observation whose arity differs from the first, name counts that
    ///   disagree with the arity, or a statistic of the wrong length.
    /// - [`ModelError::DuplicateName`] for a repeated name in any namespace.
    /// - [`ModelError::UnsupportedDistribution`] for non-derivable families.
    /// - [`ModelError::Symbolic`] if a statistic uses symbols it was not given.
    pub fn new<S1: AsRef<str>, S2: AsRef<str>>(
        observations: Vec<ObservationDef>, input_names: &[S1], param_names: &[S2],
    ) -> ModelResult<Self> {
        let Some(first) = observations.first() else {
            return Err(ModelError::DimensionMismatch {
                context: "observation list".to_string(),
                expected: 1,
                found: 0,
            });
        };
        let (n_params, n_inputs) = (first.statistic().n_params(), first.statistic().n_inputs());

        let input_index = index_names(input_names.iter().map(AsRef::as_ref), NameCategory::Input)?;
        let param_index =
            index_names(param_names.iter().map(AsRef::as_ref), NameCategory::Parameter)?;
        let observation_index =
            index_names(observations.iter().map(ObservationDef::name), NameCategory::Observation)?;

        for def in &observations {
            check_arity(
                format!("parameter arity of observation '{}'", def.name()),
                n_params,
                def.statistic().n_params(),
            )?;
            check_arity(
                format!("input arity of observation '{}'", def.name()),
                n_inputs,
                def.statistic().n_inputs(),
            )?;
        }
        check_arity("parameter names".to_string(), n_params, param_names.len())?;
        check_arity("input names".to_string(), n_inputs, input_names.len())?;

        let params: Vec<Symbol> = param_names.iter().map(Symbol::new).collect();
        let inputs: Vec<Symbol> = input_names.iter().map(Symbol::new).collect();
        let (param_exprs, input_exprs) = (symbol_exprs(&params), symbol_exprs(&inputs));
        let entries = observations
            .into_iter()
            .map(|def| compile_observation(def, &param_exprs, &input_exprs))
            .collect::<ModelResult<Vec<_>>>()?;

        Ok(Self {
            input_names: input_names.iter().map(|s| s.as_ref().to_string()).collect(),
            param_names: param_names.iter().map(|s| s.as_ref().to_string()).collect(),
            input_index,
            param_index,
            observation_index,
            params,
            inputs,
            observations: entries,
        })
    }

    // ---- Name lookup ----

    pub fn input_index(&self, name: &str) -> ModelResult<usize> {
        lookup(&self.input_index, name, NameCategory::Input)
    }

    pub fn param_index(&self, name: &str) -> ModelResult<usize> {
        lookup(&self.param_index, name, NameCategory::Parameter)
    }

    pub fn observation_index(&self, name: &str) -> ModelResult<usize> {
        lookup(&self.observation_index, name, NameCategory::Observation)
    }

    pub fn input_names(&self) -> &[String] {
        &self.input_names
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Observation names in index order.
    pub fn observation_names(&self) -> Vec<&str> {
        self.observations.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn num_inputs(&self) -> usize {
        self.input_names.len()
    }

    pub fn num_params(&self) -> usize {
        self.param_names.len()
    }

    pub fn num_observations(&self) -> usize {
        self.observations.len()
    }

    // ---- Per-observation accessors ----

    pub fn distribution(&self, obs: usize) -> ModelResult<Distribution> {
        Ok(self.entry(obs)?.family)
    }

    /// The statistic definition as supplied at construction.
    pub fn statistic_def(&self, obs: usize) -> ModelResult<&StatisticFn> {
        Ok(&self.entry(obs)?.statistic)
    }

    /// Compiled statistics, args `(θ, x)`.
    pub fn statistic_fn(&self, obs: usize) -> ModelResult<&Function> {
        Ok(&self.entry(obs)?.statistic_fn)
    }

    /// Compiled per-sample log-likelihood, args `([y], θ, x)`.
    pub fn loglik_fn(&self, obs: usize) -> ModelResult<&Function> {
        Ok(&self.entry(obs)?.loglik_fn)
    }

    /// Compiled per-sample FIM, args `(θ, x)`, flattened row-major.
    pub fn fim_fn(&self, obs: usize) -> ModelResult<&Function> {
        Ok(&self.entry(obs)?.fim_fn)
    }

    pub(crate) fn entry(&self, obs: usize) -> ModelResult<&ObservationEntry> {
        self.observations.get(obs).ok_or_else(|| {
            ModelError::shape(format!(
                "observation index {obs} out of range for {} observations",
                self.observations.len()
            ))
        })
    }
}

// ---- Helpers ----

pub(crate) fn symbol_exprs(symbols: &[Symbol]) -> Vec<Expr> {
    symbols.iter().map(Expr::from_symbol).collect()
}

fn index_names<'a>(
    names: impl Iterator<Item = &'a str>, category: NameCategory,
) -> ModelResult<HashMap<String, usize>> {
    let mut index = HashMap::new();
    for (i, name) in names.enumerate() {
        if index.insert(name.to_string(), i).is_some() {
            return Err(ModelError::DuplicateName { category, name: name.to_string() });
        }
    }
    Ok(index)
}

fn check_arity(context: String, expected: usize, found: usize) -> ModelResult<()> {
    if expected != found {
        return Err(ModelError::DimensionMismatch { context, expected, found });
    }
    Ok(())
}

fn lookup(index: &HashMap<String, usize>, name: &str, category: NameCategory) -> ModelResult<usize> {
    index
        .get(name)
        .copied()
        .ok_or_else(|| ModelError::UnknownName { category, name: name.to_string() })
}

fn compile_observation(
    def: ObservationDef, params: &[Expr], inputs: &[Expr],
) -> ModelResult<ObservationEntry> {
    let name = def.name().to_string();
    let family = def.family();
    let y_symbol = Symbol::new(format!("{name}_y"));
    let y = Expr::from_symbol(&y_symbol);
    let stats = def.statistic().apply(params, inputs);
    let derivation = family.derive(&name, &y, &stats, params)?;
    let sensitivity = jacobian(&stats, params)?;

    let theta_x = vec![params.to_vec(), inputs.to_vec()];
    let statistic_fn = Function::new(format!("{name}_statistics"), theta_x.clone(), stats)?;
    let sensitivity_fn = Function::new(
        format!("{name}_sensitivity"),
        theta_x.clone(),
        sensitivity.into_iter().flatten().collect(),
    )?;
    let loglik_fn = Function::new(
        format!("{name}_loglik"),
        vec![vec![y.clone()], params.to_vec(), inputs.to_vec()],
        vec![derivation.loglik.clone()],
    )?;
    let fim_fn =
        Function::new(format!("{name}_fim"), theta_x, derivation.fim.into_iter().flatten().collect())?;

    log::debug!(
        "registered observation '{name}' ({family}) with {} parameters and {} inputs",
        params.len(),
        inputs.len()
    );

    Ok(ObservationEntry {
        name,
        family,
        statistic: def.statistic().clone(),
        y: y_symbol,
        loglik_expr: derivation.loglik,
        statistic_fn,
        sensitivity_fn,
        loglik_fn,
        fim_fn,
    })
}
