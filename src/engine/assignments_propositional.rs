use crate::basic_types::Explanation;
use crate::basic_types::KeyedVec;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::basic_types::Trail;
#[cfg(test)]
use crate::quince_assert_moderate;
use crate::quince_assert_simple;

/// The Boolean trail: per-variable assignment information together with the trail of literals in
/// assignment order. Propagated literals carry their [`Explanation`] so that conflict analysis can
/// recover why a presence literal was forced.
#[derive(Default, Debug)]
pub struct AssignmentsPropositional {
    assignment_info: KeyedVec<PropositionalVariable, PropositionalAssignmentInfo>,
    trail: Trail<Literal>,
}

impl AssignmentsPropositional {
    pub fn grow(&mut self) -> PropositionalVariable {
        self.assignment_info
            .push(PropositionalAssignmentInfo::Unassigned)
    }

    pub fn num_propositional_variables(&self) -> u32 {
        self.assignment_info.len() as u32
    }

    pub fn increase_decision_level(&mut self) {
        self.trail.increase_decision_level()
    }

    pub fn get_decision_level(&self) -> usize {
        self.trail.get_decision_level()
    }

    pub fn num_trail_entries(&self) -> usize {
        self.trail.len()
    }

    pub fn num_trail_entries_at_decision_level(&self, decision_level: usize) -> usize {
        self.trail.num_entries_at_decision_level(decision_level)
    }

    pub fn get_trail_entry(&self, index: usize) -> Literal {
        self.trail[index]
    }

    pub fn is_variable_assigned(&self, variable: PropositionalVariable) -> bool {
        !matches!(
            self.assignment_info[variable],
            PropositionalAssignmentInfo::Unassigned
        )
    }

    pub fn is_literal_assigned(&self, literal: Literal) -> bool {
        self.is_variable_assigned(literal.get_propositional_variable())
    }

    pub fn is_literal_assigned_true(&self, literal: Literal) -> bool {
        match &self.assignment_info[literal.get_propositional_variable()] {
            PropositionalAssignmentInfo::Unassigned => false,
            PropositionalAssignmentInfo::Assigned { truth_value, .. } => {
                *truth_value == literal.is_positive()
            }
        }
    }

    pub fn is_literal_assigned_false(&self, literal: Literal) -> bool {
        self.is_literal_assigned(literal) && !self.is_literal_assigned_true(literal)
    }

    pub fn get_literal_assignment_level(&self, literal: Literal) -> usize {
        match &self.assignment_info[literal.get_propositional_variable()] {
            PropositionalAssignmentInfo::Unassigned => {
                panic!("unassigned literals do not have an assignment level")
            }
            PropositionalAssignmentInfo::Assigned { decision_level, .. } => *decision_level,
        }
    }

    pub fn is_at_the_root_level(&self) -> bool {
        self.get_decision_level() == 0
    }

    pub fn enqueue_decision_literal(&mut self, decision_literal: Literal) {
        quince_assert_simple!(!self.is_literal_assigned(decision_literal));
        self.make_assignment(decision_literal, None);
    }

    pub fn enqueue_propagated_literal(&mut self, propagated_literal: Literal, reason: Explanation) {
        quince_assert_simple!(
            !self.is_literal_assigned_false(propagated_literal),
            "propagating a falsified literal must be reported as a conflict by the propagator"
        );
        if self.is_literal_assigned_true(propagated_literal) {
            return;
        }
        self.make_assignment(propagated_literal, Some(reason));
    }

    fn make_assignment(&mut self, true_literal: Literal, reason: Option<Explanation>) {
        self.assignment_info[true_literal.get_propositional_variable()] =
            PropositionalAssignmentInfo::Assigned {
                truth_value: true_literal.is_positive(),
                decision_level: self.get_decision_level(),
                reason,
            };
        self.trail.push(true_literal);
    }

    /// Backtracks to the given decision level, unassigning every literal above it.
    pub fn synchronise(&mut self, new_decision_level: usize) {
        self.trail.synchronise(new_decision_level).for_each(|entry| {
            self.assignment_info[entry.get_propositional_variable()] =
                PropositionalAssignmentInfo::Unassigned;
        });
    }
}

#[cfg(test)]
impl AssignmentsPropositional {
    pub fn get_literal_reason(&self, literal: Literal) -> &Explanation {
        quince_assert_moderate!(self.is_literal_assigned_true(literal));
        match &self.assignment_info[literal.get_propositional_variable()] {
            PropositionalAssignmentInfo::Assigned {
                reason: Some(reason),
                ..
            } => reason,
            _ => panic!("literal {} was not propagated", literal),
        }
    }
}

#[derive(Default, Clone, Debug)]
enum PropositionalAssignmentInfo {
    #[default]
    Unassigned,
    Assigned {
        truth_value: bool,
        decision_level: usize,
        reason: Option<Explanation>,
    },
}
