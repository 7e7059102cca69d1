//! Propagation of (conditional) precedence constraints of the form
//! `tail + offset + offset_var <= head`.
//!
//! Three sibling components share the precedence abstraction:
//! - [`PrecedenceRelations`] accumulates the unconditional relations before search and offers a
//!   build-once transitive view of them;
//! - [`PrecedencesPropagator`] maintains the conditional arcs during search, pushing lower bounds
//!   along the active arcs and detecting positive-weight cycles;
//! - the greater-than-at-least-one-of extraction scans SAT structure for sets of incoming arcs of
//!   which at least one must be present, emitting [`GreaterThanAtLeastOneOf`] constraints.

mod at_least_one_of;
mod propagator;
mod relations;

pub use at_least_one_of::GreaterThanAtLeastOneOf;
pub use propagator::IntegerPrecedence;
pub use propagator::PrecedencesPropagator;
pub use relations::PrecedenceRelations;

use smallvec::SmallVec;

use crate::basic_types::IntegerVariable;
use crate::basic_types::Literal;
use crate::basic_types::StorageKey;

/// Index of an arc in the active-arc storage of the propagator.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ArcIndex(usize);

impl StorageKey for ArcIndex {
    fn index(&self) -> usize {
        self.0
    }

    fn create_from_index(index: usize) -> Self {
        ArcIndex(index)
    }
}

/// Index of an arc in the potential-arc storage of the propagator.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct OptionalArcIndex(usize);

impl StorageKey for OptionalArcIndex {
    fn index(&self) -> usize {
        self.0
    }

    fn create_from_index(index: usize) -> Self {
        OptionalArcIndex(index)
    }
}

/// A precedence arc: when all presence literals are true, the constraint
/// `tail_var + offset + lower_bound(offset_var) <= head_var` must hold.
#[derive(Clone, Debug)]
pub(crate) struct ArcInfo {
    pub(crate) tail_var: IntegerVariable,
    pub(crate) head_var: IntegerVariable,
    pub(crate) offset: i32,
    pub(crate) offset_var: Option<IntegerVariable>,
    pub(crate) presence_literals: SmallVec<[Literal; 6]>,
}

/// For a variable `var`, the subset of some queried variables that precede it: `vars[indices[i]] +
/// offsets[i] <= var` holds for every `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FullIntegerPrecedence {
    pub var: IntegerVariable,
    pub indices: Vec<usize>,
    pub offsets: Vec<i32>,
}
