use crate::basic_types::Explanation;
use crate::basic_types::IntegerPredicate;
use crate::basic_types::IntegerVariable;
use crate::basic_types::Literal;
use crate::basic_types::PropagationStatus;
use crate::engine::AssignmentsPropositional;
use crate::engine::IntegerTrail;

/// [`PropagationContext`] is passed to the propagator for read-only operations such as arc
/// registration. It may be queried to retrieve information about the current variable domains and
/// the Boolean assignment.
#[derive(Debug)]
pub struct PropagationContext<'a> {
    pub assignments_integer: &'a IntegerTrail,
    pub assignments_propositional: &'a AssignmentsPropositional,
}

impl<'a> PropagationContext<'a> {
    pub fn new(
        assignments_integer: &'a IntegerTrail,
        assignments_propositional: &'a AssignmentsPropositional,
    ) -> Self {
        PropagationContext {
            assignments_integer,
            assignments_propositional,
        }
    }
}

/// [`PropagationContextMut`] is passed to the propagator during propagation. On top of the
/// queries of [`PropagationContext`] it allows applying domain changes and propagating literals;
/// it is the only point of communication between the propagator and the solver state.
#[derive(Debug)]
pub struct PropagationContextMut<'a> {
    pub assignments_integer: &'a mut IntegerTrail,
    pub assignments_propositional: &'a mut AssignmentsPropositional,
}

impl<'a> PropagationContextMut<'a> {
    pub fn new(
        assignments_integer: &'a mut IntegerTrail,
        assignments_propositional: &'a mut AssignmentsPropositional,
    ) -> Self {
        PropagationContextMut {
            assignments_integer,
            assignments_propositional,
        }
    }

    pub fn as_readonly(&self) -> PropagationContext<'_> {
        PropagationContext {
            assignments_integer: self.assignments_integer,
            assignments_propositional: self.assignments_propositional,
        }
    }

    pub fn enqueue(&mut self, predicate: IntegerPredicate, reason: Explanation) -> PropagationStatus {
        self.assignments_integer.enqueue(predicate, reason)
    }

    pub fn enqueue_propagated_literal(&mut self, literal: Literal, reason: Explanation) {
        self.assignments_propositional
            .enqueue_propagated_literal(literal, reason);
    }
}

/// A trait which defines common methods for retrieving the [`IntegerTrail`] and
/// [`AssignmentsPropositional`] from the structure which implements this trait.
pub trait HasAssignments {
    fn assignments_integer(&self) -> &IntegerTrail;
    fn assignments_propositional(&self) -> &AssignmentsPropositional;
}

impl HasAssignments for PropagationContext<'_> {
    fn assignments_integer(&self) -> &IntegerTrail {
        self.assignments_integer
    }

    fn assignments_propositional(&self) -> &AssignmentsPropositional {
        self.assignments_propositional
    }
}

impl HasAssignments for PropagationContextMut<'_> {
    fn assignments_integer(&self) -> &IntegerTrail {
        self.assignments_integer
    }

    fn assignments_propositional(&self) -> &AssignmentsPropositional {
        self.assignments_propositional
    }
}

/// Read-only queries shared by both context types.
pub trait ReadDomains: HasAssignments {
    fn lower_bound(&self, var: IntegerVariable) -> i32 {
        self.assignments_integer().lower_bound(var)
    }

    fn upper_bound(&self, var: IntegerVariable) -> i32 {
        self.assignments_integer().upper_bound(var)
    }

    fn level_zero_lower_bound(&self, var: IntegerVariable) -> i32 {
        self.assignments_integer().level_zero_lower_bound(var)
    }

    fn level_zero_upper_bound(&self, var: IntegerVariable) -> i32 {
        self.assignments_integer().level_zero_upper_bound(var)
    }

    fn is_fixed(&self, var: IntegerVariable) -> bool {
        self.assignments_integer().is_fixed(var)
    }

    fn lower_bound_as_predicate(&self, var: IntegerVariable) -> IntegerPredicate {
        self.assignments_integer().lower_bound_as_predicate(var)
    }

    fn upper_bound_as_predicate(&self, var: IntegerVariable) -> IntegerPredicate {
        self.assignments_integer().upper_bound_as_predicate(var)
    }

    fn is_optional(&self, var: IntegerVariable) -> bool {
        self.assignments_integer().is_optional(var)
    }

    fn is_ignored_literal(&self, var: IntegerVariable) -> Literal {
        self.assignments_integer().is_ignored_literal(var)
    }

    /// Whether the optional variable is currently absent (its is-ignored literal is true).
    fn is_currently_ignored(&self, var: IntegerVariable) -> bool {
        self.is_optional(var)
            && self
                .assignments_propositional()
                .is_literal_assigned_true(self.is_ignored_literal(var))
    }

    fn literal_is_true(&self, literal: Literal) -> bool {
        self.assignments_propositional()
            .is_literal_assigned_true(literal)
    }

    fn literal_is_false(&self, literal: Literal) -> bool {
        self.assignments_propositional()
            .is_literal_assigned_false(literal)
    }

    fn current_decision_level(&self) -> usize {
        self.assignments_propositional().get_decision_level()
    }
}

impl<Context: HasAssignments> ReadDomains for Context {}
