use crate::basic_types::Explanation;
use crate::basic_types::IntegerPredicate;
use crate::basic_types::IntegerVariable;
use crate::basic_types::KeyedVec;
use crate::basic_types::Literal;
use crate::basic_types::PropagationStatus;
use crate::basic_types::Trail;
use crate::quince_assert_moderate;
use crate::quince_assert_simple;

/// The domain store for [`IntegerVariable`]s.
///
/// Only lower bounds are stored: every variable lives next to its negation in the index space, and
/// the upper bound of `v` is the negated lower bound of `v.negation()`. Raising an upper bound is
/// therefore enqueueing a lower bound on the negation, which is what makes the symmetric companion
/// arcs of the precedence propagator work without any special casing.
///
/// Bound changes are recorded on a trail with decision-level delimiters so that
/// [`IntegerTrail::synchronise`] can restore any earlier level. Propagated changes carry their
/// [`Explanation`] on the trail entry.
#[derive(Default, Debug)]
pub struct IntegerTrail {
    trail: Trail<IntegerTrailEntry>,
    lower_bounds: KeyedVec<IntegerVariable, i32>,
    level_zero_lower_bounds: KeyedVec<IntegerVariable, i32>,
    is_ignored_literals: KeyedVec<IntegerVariable, Option<Literal>>,
}

#[derive(Clone, Debug)]
pub struct IntegerTrailEntry {
    /// The bound that was applied by this entry.
    pub predicate: IntegerPredicate,
    /// The bound that was in effect before this entry, restored on backtracking.
    pub old_lower_bound: i32,
    /// `None` for decisions and externally forced bounds.
    pub reason: Option<Explanation>,
}

impl IntegerTrail {
    /// Registers a new variable with the given initial bounds and returns it. The negation of the
    /// returned variable is registered as well, with bounds `[-upper_bound, -lower_bound]`.
    pub fn grow(&mut self, lower_bound: i32, upper_bound: i32) -> IntegerVariable {
        quince_assert_simple!(lower_bound <= upper_bound, "cannot create an empty domain");

        let var = self.lower_bounds.push(lower_bound);
        let _ = self.lower_bounds.push(-upper_bound);
        let _ = self.level_zero_lower_bounds.push(lower_bound);
        let _ = self.level_zero_lower_bounds.push(-upper_bound);
        let _ = self.is_ignored_literals.push(None);
        let _ = self.is_ignored_literals.push(None);

        quince_assert_moderate!(var.is_positive());
        var
    }

    /// Marks the variable (and its negation) as optional: when `is_ignored` is true the variable
    /// is absent and its bounds no longer constrain anything.
    pub fn mark_as_optional(&mut self, var: IntegerVariable, is_ignored: Literal) {
        self.is_ignored_literals[var] = Some(is_ignored);
        self.is_ignored_literals[var.negation()] = Some(is_ignored);
    }

    pub fn num_integer_variables(&self) -> usize {
        self.lower_bounds.len()
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

    pub fn get_trail_entry(&self, index: usize) -> &IntegerTrailEntry {
        &self.trail[index]
    }
}

// methods for getting info about the domains
impl IntegerTrail {
    pub fn lower_bound(&self, var: IntegerVariable) -> i32 {
        self.lower_bounds[var]
    }

    pub fn upper_bound(&self, var: IntegerVariable) -> i32 {
        -self.lower_bounds[var.negation()]
    }

    pub fn level_zero_lower_bound(&self, var: IntegerVariable) -> i32 {
        self.level_zero_lower_bounds[var]
    }

    pub fn level_zero_upper_bound(&self, var: IntegerVariable) -> i32 {
        -self.level_zero_lower_bounds[var.negation()]
    }

    pub fn is_fixed(&self, var: IntegerVariable) -> bool {
        self.lower_bound(var) == self.upper_bound(var)
    }

    pub fn is_optional(&self, var: IntegerVariable) -> bool {
        self.is_ignored_literals[var].is_some()
    }

    /// The literal that is true iff the optional variable is absent. Must only be called for
    /// variables previously marked through [`IntegerTrail::mark_as_optional`].
    pub fn is_ignored_literal(&self, var: IntegerVariable) -> Literal {
        self.is_ignored_literals[var].expect("variable is not optional")
    }

    pub fn lower_bound_as_predicate(&self, var: IntegerVariable) -> IntegerPredicate {
        IntegerPredicate::greater_or_equal(var, self.lower_bound(var))
    }

    pub fn upper_bound_as_predicate(&self, var: IntegerVariable) -> IntegerPredicate {
        IntegerPredicate::greater_or_equal(var.negation(), self.lower_bounds[var.negation()])
    }
}

// methods to change the domains
impl IntegerTrail {
    /// Applies the bound atom with the given propagation reason. Returns an error carrying the
    /// conflict explanation if the new lower bound exceeds the current upper bound.
    pub fn enqueue(&mut self, predicate: IntegerPredicate, reason: Explanation) -> PropagationStatus {
        self.push_bound(predicate, Some(reason))
    }

    /// Applies the bound atom without a reason (a decision or an externally forced bound).
    pub fn tighten_lower_bound(
        &mut self,
        var: IntegerVariable,
        new_lower_bound: i32,
    ) -> PropagationStatus {
        self.push_bound(IntegerPredicate::greater_or_equal(var, new_lower_bound), None)
    }

    /// Equivalent to tightening the lower bound of the negation.
    pub fn tighten_upper_bound(
        &mut self,
        var: IntegerVariable,
        new_upper_bound: i32,
    ) -> PropagationStatus {
        self.push_bound(IntegerPredicate::lower_or_equal(var, new_upper_bound), None)
    }

    fn push_bound(
        &mut self,
        predicate: IntegerPredicate,
        reason: Option<Explanation>,
    ) -> PropagationStatus {
        let var = predicate.var;
        let old_lower_bound = self.lower_bounds[var];
        if predicate.lower_bound <= old_lower_bound {
            return Ok(());
        }

        if predicate.lower_bound > self.upper_bound(var) {
            let mut conflict = reason.unwrap_or_default();
            conflict.integer_reason.push(self.upper_bound_as_predicate(var));
            return Err(conflict);
        }

        self.trail.push(IntegerTrailEntry {
            predicate,
            old_lower_bound,
            reason,
        });
        self.lower_bounds[var] = predicate.lower_bound;
        if self.trail.get_decision_level() == 0 {
            self.level_zero_lower_bounds[var] = predicate.lower_bound;
        }
        Ok(())
    }

    /// Weakens a conjunction of `x >= c` atoms while preserving the implied sum: the bounds of the
    /// atoms may jointly be lowered by at most `slack`, weighted by the given coefficients. Every
    /// weakened atom still holds in the current state since bounds are only moved towards the
    /// level-zero bound of the variable.
    pub fn relax_linear_reason(
        &self,
        slack: i64,
        coefficients: &[i64],
        integer_reason: &mut [IntegerPredicate],
    ) {
        quince_assert_simple!(slack >= 0);
        quince_assert_simple!(coefficients.len() == integer_reason.len());

        let mut slack = slack;
        for (atom, &coefficient) in integer_reason.iter_mut().zip(coefficients) {
            if slack < coefficient {
                break;
            }
            let room = (atom.lower_bound - self.level_zero_lower_bound(atom.var)) as i64;
            if room <= 0 {
                continue;
            }
            let taken = room.min(slack / coefficient);
            atom.lower_bound -= taken as i32;
            slack -= taken * coefficient;
        }
    }

    /// Backtracks to the given decision level, restoring all bounds changed above it.
    pub fn synchronise(&mut self, new_decision_level: usize) {
        for entry in self.trail.synchronise(new_decision_level) {
            self.lower_bounds[entry.predicate.var] = entry.old_lower_bound;
        }
    }
}

#[cfg(test)]
impl IntegerTrail {
    pub fn get_reason_for_predicate(&self, predicate: IntegerPredicate) -> &Explanation {
        self.trail
            .iter()
            .find_map(|entry| {
                if entry.predicate == predicate {
                    entry.reason.as_ref()
                } else {
                    None
                }
            })
            .unwrap_or_else(|| panic!("found no reason with predicate {}", predicate))
    }
}
