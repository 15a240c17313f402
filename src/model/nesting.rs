//! Shape-preserving nesting for fit and sample results.
//!
//! Purpose
//! -------
//! Fit and sample accept or produce one value, a list of replicates, or a
//! list of designs each holding replicates. [`Nested`] names those three
//! depths explicitly; internally every operation works on the canonical
//! design × replicate grid (`Vec<Vec<T>>`), converting at the boundary with
//! [`Nested::normalize`] and [`Nested::denormalize`].
//!
//! Invariants
//! ----------
//! - `denormalize(normalize(n))` reproduces `n` exactly, including depth.
//! - Normalized grids are never empty and contain no empty design.
use crate::model::errors::{ModelError, ModelResult};

/// One value, a list of replicates, or a list of designs of replicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Nested<T> {
    Single(T),
    Replicates(Vec<T>),
    Designs(Vec<Vec<T>>),
}

/// Depth tag remembered across normalize / denormalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingDepth {
    Single,
    Replicates,
    Designs,
}

impl<T> Nested<T> {
    pub fn depth(&self) -> NestingDepth {
        match self {
            Nested::Single(_) => NestingDepth::Single,
            Nested::Replicates(_) => NestingDepth::Replicates,
            Nested::Designs(_) => NestingDepth::Designs,
        }
    }

    /// Convert to the canonical design × replicate grid.
    ///
    /// # Errors
    /// - [`ModelError::Shape`] for an empty replicate list, an empty design
    ///   list, or a design with no replicates.
    pub fn normalize(self) -> ModelResult<(NestingDepth, Vec<Vec<T>>)> {
        let depth = self.depth();
        let grid = match self {
            Nested::Single(value) => vec![vec![value]],
            Nested::Replicates(values) => vec![values],
            Nested::Designs(designs) => designs,
        };
        if grid.is_empty() {
            return Err(ModelError::shape("no designs"));
        }
        if let Some(design) = grid.iter().position(Vec::is_empty) {
            return Err(ModelError::shape(format!("design {design} has no replicates")));
        }
        Ok((depth, grid))
    }

    /// Rebuild a nested value of the given depth from a grid.
    ///
    /// # Errors
    /// - [`ModelError::Shape`] if the grid cannot be expressed at `depth`
    ///   (more than one cell for `Single`, more than one design for
    ///   `Replicates`).
    pub fn denormalize(depth: NestingDepth, mut grid: Vec<Vec<T>>) -> ModelResult<Self> {
        match depth {
            NestingDepth::Designs => Ok(Nested::Designs(grid)),
            NestingDepth::Replicates if grid.len() == 1 => Ok(Nested::Replicates(grid.remove(0))),
            NestingDepth::Single if grid.len() == 1 && grid[0].len() == 1 => {
                Ok(Nested::Single(grid.remove(0).remove(0)))
            }
            _ => Err(ModelError::shape(format!(
                "cannot express {} designs as {depth:?}",
                grid.len()
            ))),
        }
    }

    /// Total number of leaves.
    pub fn len(&self) -> usize {
        match self {
            Nested::Single(_) => 1,
            Nested::Replicates(values) => values.len(),
            Nested::Designs(designs) => designs.iter().map(Vec::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Leaves in design-major, replicate-minor order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        match self {
            Nested::Single(value) => Box::new(std::iter::once(value)),
            Nested::Replicates(values) => Box::new(values.iter()),
            Nested::Designs(designs) => Box::new(designs.iter().flatten()),
        }
    }

    /// Apply `f` to every leaf, keeping the shape.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Nested<U> {
        match self {
            Nested::Single(value) => Nested::Single(f(value)),
            Nested::Replicates(values) => Nested::Replicates(values.into_iter().map(f).collect()),
            Nested::Designs(designs) => Nested::Designs(
                designs.into_iter().map(|d| d.into_iter().map(&mut f).collect()).collect(),
            ),
        }
    }

    pub fn into_single(self) -> Option<T> {
        match self {
            Nested::Single(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_replicates(self) -> Option<Vec<T>> {
        match self {
            Nested::Replicates(values) => Some(values),
            _ => None,
        }
    }

    pub fn into_designs(self) -> Option<Vec<Vec<T>>> {
        match self {
            Nested::Designs(designs) => Some(designs),
            _ => None,
        }
    }
}
