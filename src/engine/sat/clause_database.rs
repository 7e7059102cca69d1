use crate::basic_types::Literal;

/// Iteration over the problem clauses of the SAT solver, used by the clause-driven extraction of
/// greater-than-at-least-one-of structure.
pub trait ClauseDatabase {
    fn num_clauses(&self) -> usize;

    fn iter_clauses(&self) -> Box<dyn Iterator<Item = &[Literal]> + '_>;
}

impl ClauseDatabase for Vec<Vec<Literal>> {
    fn num_clauses(&self) -> usize {
        self.len()
    }

    fn iter_clauses(&self) -> Box<dyn Iterator<Item = &[Literal]> + '_> {
        Box::new(self.iter().map(|clause| clause.as_slice()))
    }
}
