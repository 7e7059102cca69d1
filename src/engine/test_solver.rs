#![cfg(test)]
//! This module exposes helpers that aid testing of the precedence propagator. The [`TestSolver`]
//! allows setting up specific scenarios under which to test the various operations of the
//! propagator, playing the role of the surrounding search loop: it owns the assignment
//! structures, makes decisions, and orchestrates backtracking in the right order.

use crate::basic_types::IntegerVariable;
use crate::basic_types::Literal;
use crate::basic_types::PropagationStatus;
use crate::engine::AssignmentsPropositional;
use crate::engine::IntegerTrail;
use crate::engine::PropagationContext;
use crate::engine::PropagationContextMut;
use crate::propagators::precedences::PrecedencesPropagator;

#[derive(Default, Debug)]
pub struct TestSolver {
    pub assignments_integer: IntegerTrail,
    pub assignments_propositional: AssignmentsPropositional,
}

impl TestSolver {
    pub fn new_variable(&mut self, lower_bound: i32, upper_bound: i32) -> IntegerVariable {
        self.assignments_integer.grow(lower_bound, upper_bound)
    }

    pub fn new_literal(&mut self) -> Literal {
        Literal::new(self.assignments_propositional.grow(), true)
    }

    /// Creates an optional variable together with the literal that is true when it is absent.
    pub fn new_optional_variable(
        &mut self,
        lower_bound: i32,
        upper_bound: i32,
    ) -> (IntegerVariable, Literal) {
        let var = self.new_variable(lower_bound, upper_bound);
        let is_ignored = self.new_literal();
        self.assignments_integer.mark_as_optional(var, is_ignored);
        (var, is_ignored)
    }

    pub fn context(&self) -> PropagationContext<'_> {
        PropagationContext::new(&self.assignments_integer, &self.assignments_propositional)
    }

    pub fn context_mut(&mut self) -> PropagationContextMut<'_> {
        PropagationContextMut::new(
            &mut self.assignments_integer,
            &mut self.assignments_propositional,
        )
    }

    pub fn increase_decision_level(&mut self) {
        self.assignments_integer.increase_decision_level();
        self.assignments_propositional.increase_decision_level();
    }

    pub fn enqueue_decision_literal(&mut self, literal: Literal) {
        self.assignments_propositional
            .enqueue_decision_literal(literal);
    }

    pub fn tighten_lower_bound(&mut self, var: IntegerVariable, bound: i32) {
        self.assignments_integer
            .tighten_lower_bound(var, bound)
            .expect("the new lower bound should not empty the domain");
    }

    pub fn tighten_upper_bound(&mut self, var: IntegerVariable, bound: i32) {
        self.assignments_integer
            .tighten_upper_bound(var, bound)
            .expect("the new upper bound should not empty the domain");
    }

    pub fn propagate(&mut self, propagator: &mut PrecedencesPropagator) -> PropagationStatus {
        let mut context = PropagationContextMut::new(
            &mut self.assignments_integer,
            &mut self.assignments_propositional,
        );
        propagator.propagate(&mut context)
    }

    /// Backtracks both trails to the given decision level. The propagator is untrailed first,
    /// while the Boolean trail still holds the literals that are about to be unassigned.
    pub fn backtrack(&mut self, propagator: &mut PrecedencesPropagator, decision_level: usize) {
        let target_trail_index = self
            .assignments_propositional
            .num_trail_entries_at_decision_level(decision_level);
        propagator.untrail(
            PropagationContext::new(&self.assignments_integer, &self.assignments_propositional),
            target_trail_index,
        );
        self.assignments_propositional.synchronise(decision_level);
        self.assignments_integer.synchronise(decision_level);
    }

    pub fn lower_bound(&self, var: IntegerVariable) -> i32 {
        self.assignments_integer.lower_bound(var)
    }

    pub fn upper_bound(&self, var: IntegerVariable) -> i32 {
        self.assignments_integer.upper_bound(var)
    }

    pub fn assert_bounds(&self, var: IntegerVariable, lower_bound: i32, upper_bound: i32) {
        let actual_lower_bound = self.lower_bound(var);
        let actual_upper_bound = self.upper_bound(var);

        assert_eq!(
            (lower_bound, upper_bound),
            (actual_lower_bound, actual_upper_bound),
            "expected {var} to be in [{lower_bound}, {upper_bound}] but it was in [{actual_lower_bound}, {actual_upper_bound}]"
        );
    }
}
