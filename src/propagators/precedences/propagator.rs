use std::collections::VecDeque;

use log::debug;
use smallvec::SmallVec;

use super::ArcIndex;
use super::ArcInfo;
use super::FullIntegerPrecedence;
use super::OptionalArcIndex;
use crate::basic_types::hash_structures::HashMap;
use crate::basic_types::Explanation;
use crate::basic_types::IntegerPredicate;
use crate::basic_types::IntegerVariable;
use crate::basic_types::KeyedVec;
use crate::basic_types::Literal;
use crate::basic_types::PropagationStatus;
use crate::basic_types::SparseBitset;
use crate::basic_types::StorageKey;
use crate::engine::PropagationContext;
use crate::engine::PropagationContextMut;
use crate::engine::ReadDomains;
use crate::quince_assert_eq_simple;
use crate::quince_assert_moderate;
use crate::quince_assert_simple;

/// Propagator of the constraints `tail + offset + lower_bound(offset_var) <= head`, guarded by
/// presence literals.
///
/// An arc becomes active once every one of its presence literals is true. Active arcs push the
/// lower bound of their head whenever the lower bound of their tail (or of the offset variable)
/// increases; the pushes run to a fixed point with a Bellman-Ford relaxation that uses Tarjan's
/// subtree disassembly to detect positive-weight cycles without looping forever. Arcs that still
/// have exactly one undecided presence literal and can no longer fit between their endpoints have
/// that literal's negation propagated.
///
/// All activation bookkeeping is backtrackable: [`PrecedencesPropagator::untrail`] undoes arc
/// activations in the reverse order of the corresponding literal assignments.
#[derive(Default, Debug)]
pub struct PrecedencesPropagator {
    /// The active-arc storage. Arcs are never removed; whether an arc is currently active is
    /// tracked through `arc_counts` and `impacted_arcs`.
    pub(crate) arcs: KeyedVec<ArcIndex, ArcInfo>,
    /// Scratch state of the Bellman-Ford shortest-path forest: whether the arc is a tree edge.
    arc_is_marked: KeyedVec<ArcIndex, bool>,
    /// The number of presence literals of the arc that are not yet true. The arc is active iff
    /// this is zero.
    arc_counts: KeyedVec<ArcIndex, u32>,
    /// Arcs waiting for at least one undecided presence literal.
    potential_arcs: KeyedVec<OptionalArcIndex, ArcInfo>,
    /// For each tail variable, the indices of the active arcs leaving it. Maintained as a stack:
    /// untrail pops activations in reverse order.
    impacted_arcs: KeyedVec<IntegerVariable, Vec<ArcIndex>>,
    /// For each variable, the potential arcs in which it appears as tail, negated head, or offset
    /// variable.
    impacted_potential_arcs: KeyedVec<IntegerVariable, Vec<OptionalArcIndex>>,
    /// For each literal, the arcs it could newly activate.
    pub(crate) literal_to_new_impacted_arcs: KeyedVec<Literal, Vec<ArcIndex>>,
    /// For pairs `(tail, head)` related by an active arc with a single presence literal and no
    /// offset variable: that literal and the offset.
    conditional_relations: HashMap<(IntegerVariable, IntegerVariable), (Literal, i32)>,

    /// The variables whose lower bound changed since the last propagation.
    modified_vars: SparseBitset<IntegerVariable>,
    /// Cursor into the Boolean trail: everything below it has been processed.
    propagation_trail_index: usize,
    /// Cursor into the integer trail, used to discover external lower-bound changes.
    integer_trail_index: usize,

    bf_queue: VecDeque<usize>,
    bf_in_queue: Vec<bool>,
    bf_can_be_skipped: Vec<bool>,
    bf_parent_arc_of: Vec<Option<ArcIndex>>,
    tmp_vector: Vec<usize>,

    var_to_degree: KeyedVec<IntegerVariable, i64>,
    var_to_last_index: KeyedVec<IntegerVariable, i64>,

    num_cycles: u64,
    num_pushes: u64,
    num_enforcement_pushes: u64,
}

/// An element of the output of [`PrecedencesPropagator::compute_precedences`]: the variable
/// `vars[index]` precedes `var` with the given offset.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct IntegerPrecedence {
    pub index: usize,
    pub var: IntegerVariable,
    pub(crate) arc_index: ArcIndex,
    pub offset: i32,
}

fn effective_offset<Context: ReadDomains>(context: &Context, arc: &ArcInfo) -> i64 {
    arc.offset as i64
        + arc
            .offset_var
            .map_or(0, |offset_var| context.lower_bound(offset_var) as i64)
}

impl PrecedencesPropagator {
    /// Adds the constraint `tail + offset <= head`.
    pub fn add_precedence(
        &mut self,
        context: PropagationContext<'_>,
        tail: IntegerVariable,
        head: IntegerVariable,
    ) {
        self.add_arc(context, tail, head, 0, None, &[]);
    }

    pub fn add_precedence_with_offset(
        &mut self,
        context: PropagationContext<'_>,
        tail: IntegerVariable,
        head: IntegerVariable,
        offset: i32,
    ) {
        self.add_arc(context, tail, head, offset, None, &[]);
    }

    pub fn add_precedence_with_variable_offset(
        &mut self,
        context: PropagationContext<'_>,
        tail: IntegerVariable,
        head: IntegerVariable,
        offset_var: IntegerVariable,
    ) {
        self.add_arc(context, tail, head, 0, Some(offset_var), &[]);
    }

    /// Adds the constraint `tail + offset <= head`, enforced when all of `presence_literals` are
    /// true.
    pub fn add_conditional_precedence_with_offset(
        &mut self,
        context: PropagationContext<'_>,
        tail: IntegerVariable,
        head: IntegerVariable,
        offset: i32,
        presence_literals: &[Literal],
    ) {
        self.add_arc(context, tail, head, offset, None, presence_literals);
    }

    /// Adds `tail + offset <= head` unless an arc between the same endpoints with at least this
    /// offset already exists. Returns whether an arc was added. Only valid at the root level.
    pub fn add_precedence_with_offset_if_new(
        &mut self,
        context: PropagationContext<'_>,
        tail: IntegerVariable,
        head: IntegerVariable,
        offset: i32,
    ) -> bool {
        quince_assert_eq_simple!(context.current_decision_level(), 0);
        if tail.index() < self.impacted_arcs.len() && head.index() < self.impacted_arcs.len() {
            for &arc_index in &self.impacted_arcs[tail] {
                let arc = &self.arcs[arc_index];
                if arc.head_var == head {
                    let current = effective_offset(&context, arc);
                    if offset as i64 <= current {
                        return false;
                    }
                    break;
                }
            }
        }

        self.add_precedence_with_offset(context, tail, head, offset);
        true
    }

    /// Registers the arc `tail + offset + lower_bound(offset_var) <= head`, enforced when all
    /// presence literals are true, together with all its symmetric companions.
    pub fn add_arc(
        &mut self,
        context: PropagationContext<'_>,
        tail: IntegerVariable,
        head: IntegerVariable,
        offset: i32,
        offset_var: Option<IntegerVariable>,
        presence_literals: &[Literal],
    ) {
        self.adjust_size_for(tail);
        self.adjust_size_for(head);
        if let Some(offset_var) = offset_var {
            self.adjust_size_for(offset_var);
        }

        // This arc is present iff all the literals here are true.
        let mut enforcement_literals: SmallVec<[Literal; 6]> =
            presence_literals.iter().copied().collect();
        if context.is_optional(tail) {
            enforcement_literals.push(!context.is_ignored_literal(tail));
        }
        if context.is_optional(head) {
            enforcement_literals.push(!context.is_ignored_literal(head));
        }
        if let Some(offset_var) = offset_var {
            if context.is_optional(offset_var) {
                enforcement_literals.push(!context.is_ignored_literal(offset_var));
            }
        }
        enforcement_literals.sort_unstable();
        enforcement_literals.dedup();

        if context.current_decision_level() == 0 {
            if enforcement_literals
                .iter()
                .any(|&literal| context.literal_is_false(literal))
            {
                // A presence literal is false at the root: the arc can never be present.
                return;
            }
            enforcement_literals.retain(|&mut literal| !context.literal_is_true(literal));
        }

        if head == tail {
            // A self-arc is either plain SAT or plain UNSAT or it forces something on the given
            // offset_var or presence literals. Its semantics is left to presolve; surface it.
            debug!(
                "self arc: var={tail} offset={offset} offset_var={offset_var:?} conditioned_by={presence_literals:?}"
            );
        }

        // Remove the offset_var if it is fixed at the root.
        let mut offset = offset;
        let mut offset_var = offset_var;
        if let Some(var) = offset_var {
            let level_zero_lower_bound = context.level_zero_lower_bound(var);
            if level_zero_lower_bound == context.level_zero_upper_bound(var) {
                offset += level_zero_lower_bound;
                offset_var = None;
            }
        }

        // Deal first with the potential-arc storage.
        if !enforcement_literals.is_empty() {
            let arc_index = self.potential_arcs.push(ArcInfo {
                tail_var: tail,
                head_var: head,
                offset,
                offset_var,
                presence_literals: enforcement_literals.clone(),
            });
            self.impacted_potential_arcs[tail].push(arc_index);
            self.impacted_potential_arcs[head.negation()].push(arc_index);
            if let Some(offset_var) = offset_var {
                self.impacted_potential_arcs[offset_var].push(arc_index);
            }
        }

        // Now deal with the active-arc storage: the arc itself and its symmetric companions. For a
        // fixed offset these are `a + k <= b` and `~b + k <= ~a`; with an offset variable, the
        // three cyclic permutations of `a + b + k <= c` and their negations.
        struct InternalArc {
            tail_var: IntegerVariable,
            head_var: IntegerVariable,
            offset_var: Option<IntegerVariable>,
        }
        let mut to_add: Vec<InternalArc> = Vec::new();
        match offset_var {
            None => {
                to_add.push(InternalArc {
                    tail_var: tail,
                    head_var: head,
                    offset_var: None,
                });
                to_add.push(InternalArc {
                    tail_var: head.negation(),
                    head_var: tail.negation(),
                    offset_var: None,
                });
            }
            Some(offset_var) => {
                // tail (a) and offset_var (b) are symmetric, with head (c):
                // a + b + offset <= c
                to_add.push(InternalArc {
                    tail_var: tail,
                    head_var: head,
                    offset_var: Some(offset_var),
                });
                to_add.push(InternalArc {
                    tail_var: offset_var,
                    head_var: head,
                    offset_var: Some(tail),
                });
                // a - c + offset <= -b
                to_add.push(InternalArc {
                    tail_var: tail,
                    head_var: offset_var.negation(),
                    offset_var: Some(head.negation()),
                });
                to_add.push(InternalArc {
                    tail_var: head.negation(),
                    head_var: offset_var.negation(),
                    offset_var: Some(tail),
                });
                // b - c + offset <= -a
                to_add.push(InternalArc {
                    tail_var: offset_var,
                    head_var: tail.negation(),
                    offset_var: Some(head.negation()),
                });
                to_add.push(InternalArc {
                    tail_var: head.negation(),
                    head_var: tail.negation(),
                    offset_var: Some(offset_var),
                });
            }
        }

        for internal_arc in to_add {
            // The tail of a new arc has to be considered during the next propagation.
            self.modified_vars.set(internal_arc.tail_var);

            let arc_index = self.arcs.push(ArcInfo {
                tail_var: internal_arc.tail_var,
                head_var: internal_arc.head_var,
                offset,
                offset_var: internal_arc.offset_var,
                presence_literals: enforcement_literals.clone(),
            });
            let _ = self.arc_is_marked.push(false);

            // If the head is optional, the arc is vacuous once the head is absent, so its
            // not-ignored literal does not have to be part of the presence literals.
            if context.is_optional(internal_arc.head_var) {
                let to_remove = !context.is_ignored_literal(internal_arc.head_var);
                let presence_literals = &mut self.arcs[arc_index].presence_literals;
                if let Some(position) = presence_literals
                    .iter()
                    .position(|&literal| literal == to_remove)
                {
                    let _ = presence_literals.remove(position);
                }
            }

            let num_presence_literals = self.arcs[arc_index].presence_literals.len();
            if num_presence_literals == 0 {
                self.impacted_arcs[internal_arc.tail_var].push(arc_index);
            } else {
                for position in 0..num_presence_literals {
                    let literal = self.arcs[arc_index].presence_literals[position];
                    self.literal_to_new_impacted_arcs
                        .accommodate(literal, vec![]);
                    self.literal_to_new_impacted_arcs[literal].push(arc_index);
                }
            }

            if context.current_decision_level() == 0 {
                let _ = self.arc_counts.push(num_presence_literals as u32);
            } else {
                let count = self.arcs[arc_index]
                    .presence_literals
                    .iter()
                    .filter(|&&literal| !context.literal_is_true(literal))
                    .count() as u32;
                quince_assert_simple!(num_presence_literals == 0 || count > 0);
                let _ = self.arc_counts.push(count);
            }
        }
    }

    fn adjust_size_for(&mut self, var: IntegerVariable) {
        let index = var.index().max(var.negation().index());
        if index >= self.impacted_arcs.len() {
            self.impacted_arcs.resize(index + 1, vec![]);
            self.impacted_potential_arcs.resize(index + 1, vec![]);
            self.var_to_degree.resize(index + 1, 0);
            self.var_to_last_index.resize(index + 1, -1);
        }
    }

    /// Consumes the trails since the last call and propagates all active arcs to a fixed point.
    ///
    /// Either every active arc `(tail, head)` with a present head satisfies
    /// `lower_bound(tail) + effective_offset <= lower_bound(head)` on return, or the first
    /// detected conflict is returned and the caller must backtrack before calling again.
    pub fn propagate(&mut self, context: &mut PropagationContextMut<'_>) -> PropagationStatus {
        // Pick up external lower-bound changes from the integer trail.
        self.integer_trail_index = self
            .integer_trail_index
            .min(context.assignments_integer.num_trail_entries());
        while self.integer_trail_index < context.assignments_integer.num_trail_entries() {
            let var = context
                .assignments_integer
                .get_trail_entry(self.integer_trail_index)
                .predicate
                .var;
            self.modified_vars.set(var);
            self.integer_trail_index += 1;
        }

        while self.propagation_trail_index
            < context.assignments_propositional.num_trail_entries()
        {
            let literal = context
                .assignments_propositional
                .get_trail_entry(self.propagation_trail_index);
            self.propagation_trail_index += 1;
            if literal.index() >= self.literal_to_new_impacted_arcs.len() {
                continue;
            }

            // Because of the way untrail works, all the arcs triggered by this literal have to be
            // activated before propagation may abort; hence the two passes.
            for position in 0..self.literal_to_new_impacted_arcs[literal].len() {
                let arc_index = self.literal_to_new_impacted_arcs[literal][position];
                self.arc_counts[arc_index] -= 1;
                if self.arc_counts[arc_index] == 0 {
                    self.add_to_conditional_relations(arc_index);
                    let tail_var = self.arcs[arc_index].tail_var;
                    self.impacted_arcs[tail_var].push(arc_index);
                }
            }

            // Second pass: check the now-active arcs for an immediate push.
            for position in 0..self.literal_to_new_impacted_arcs[literal].len() {
                let arc_index = self.literal_to_new_impacted_arcs[literal][position];
                if self.arc_counts[arc_index] > 0 {
                    continue;
                }
                let (tail_var, head_var) = {
                    let arc = &self.arcs[arc_index];
                    (arc.tail_var, arc.head_var)
                };
                if context.is_currently_ignored(head_var) {
                    continue;
                }
                let new_head_lb = context.lower_bound(tail_var) as i64
                    + effective_offset(&context.as_readonly(), &self.arcs[arc_index]);
                if new_head_lb > context.lower_bound(head_var) as i64 {
                    self.enqueue_and_check(context, arc_index, new_head_lb)?;
                }
            }
        }

        // Do the actual propagation of the integer variable bounds.
        self.initialize_bf_queue_with_modified_nodes();
        self.bellman_ford_tarjan(context)?;

        // Propagate the presence literals of the arcs that can no longer fit.
        self.propagate_optional_arcs(context);

        // Clean up modified_vars to do as little as possible on the next call.
        self.modified_vars
            .clear_and_resize(context.assignments_integer.num_integer_variables());
        self.integer_trail_index = context.assignments_integer.num_trail_entries();
        Ok(())
    }

    /// One-shot relaxation of the active arcs leaving `var`, without running the fixed-point loop.
    pub fn propagate_outgoing_arcs(
        &mut self,
        context: &mut PropagationContextMut<'_>,
        var: IntegerVariable,
    ) -> PropagationStatus {
        if var.index() >= self.impacted_arcs.len() {
            return Ok(());
        }
        for position in 0..self.impacted_arcs[var].len() {
            let arc_index = self.impacted_arcs[var][position];
            let (tail_var, head_var) = {
                let arc = &self.arcs[arc_index];
                (arc.tail_var, arc.head_var)
            };
            if context.is_currently_ignored(head_var) {
                continue;
            }
            let new_head_lb = context.lower_bound(tail_var) as i64
                + effective_offset(&context.as_readonly(), &self.arcs[arc_index]);
            if new_head_lb > context.lower_bound(head_var) as i64 {
                self.enqueue_and_check(context, arc_index, new_head_lb)?;
            }
        }
        Ok(())
    }

    /// Undoes the arc activations of every literal above `target_trail_index` on the Boolean
    /// trail, in reverse assignment order. Must be called while the Boolean trail still holds the
    /// literals that are about to be unassigned.
    pub fn untrail(&mut self, context: PropagationContext<'_>, target_trail_index: usize) {
        if self.propagation_trail_index > target_trail_index {
            // Everything up to target_trail_index was already propagated, so the modified set can
            // be dropped.
            self.modified_vars
                .clear_and_resize(context.assignments_integer.num_integer_variables());
        }
        while self.propagation_trail_index > target_trail_index {
            self.propagation_trail_index -= 1;
            let literal = context
                .assignments_propositional
                .get_trail_entry(self.propagation_trail_index);
            if literal.index() >= self.literal_to_new_impacted_arcs.len() {
                continue;
            }
            for position in 0..self.literal_to_new_impacted_arcs[literal].len() {
                let arc_index = self.literal_to_new_impacted_arcs[literal][position];
                self.arc_counts[arc_index] += 1;
                if self.arc_counts[arc_index] == 1 {
                    self.remove_from_conditional_relations(arc_index);
                    let tail_var = self.arcs[arc_index].tail_var;
                    let popped = self.impacted_arcs[tail_var].pop();
                    quince_assert_moderate!(popped == Some(arc_index));
                }
            }
        }
    }

    /// The conditional offset between the two variables, if an active arc with a single presence
    /// literal and a fixed offset relates them.
    pub fn conditional_offset(
        &self,
        tail: IntegerVariable,
        head: IntegerVariable,
    ) -> Option<(Literal, i32)> {
        self.conditional_relations.get(&(tail, head)).copied()
    }

    pub fn log_statistics(&self) {
        debug!(
            "precedences: num_cycles={} num_pushes={} num_enforcement_pushes={}",
            self.num_cycles, self.num_pushes, self.num_enforcement_pushes
        );
    }

    fn add_to_conditional_relations(&mut self, arc_index: ArcIndex) {
        let arc = &self.arcs[arc_index];
        if arc.presence_literals.len() != 1 || arc.offset_var.is_some() {
            return;
        }
        let key = (arc.tail_var, arc.head_var);
        let value = (arc.presence_literals[0], arc.offset);
        // Only insert if not already present: the arc activated first wins.
        let _ = self.conditional_relations.entry(key).or_insert(value);
    }

    fn remove_from_conditional_relations(&mut self, arc_index: ArcIndex) {
        let arc = &self.arcs[arc_index];
        if arc.presence_literals.len() != 1 || arc.offset_var.is_some() {
            return;
        }
        let key = (arc.tail_var, arc.head_var);
        let Some(&(literal, _)) = self.conditional_relations.get(&key) else {
            return;
        };
        // Erasing an entry added by a different arc would forget an activation that is still live;
        // erasing the wrong one of two identical activations is harmless.
        if literal != arc.presence_literals[0] {
            return;
        }
        let _ = self.conditional_relations.remove(&key);
    }

    /// Pushes `head >= new_head_lb` with the arc as the reason. A push past the upper bound is a
    /// conflict, except for an optional head which is instead forced absent.
    fn enqueue_and_check(
        &mut self,
        context: &mut PropagationContextMut<'_>,
        arc_index: ArcIndex,
        new_head_lb: i64,
    ) -> PropagationStatus {
        self.num_pushes += 1;

        let arc = &self.arcs[arc_index];
        let tail_var = arc.tail_var;
        let head_var = arc.head_var;
        quince_assert_moderate!(new_head_lb > context.lower_bound(head_var) as i64);

        let mut literal_reason: Vec<Literal> = arc
            .presence_literals
            .iter()
            .map(|&literal| !literal)
            .collect();
        let mut integer_reason = vec![context.lower_bound_as_predicate(tail_var)];
        if let Some(offset_var) = arc.offset_var {
            integer_reason.push(context.lower_bound_as_predicate(offset_var));
        }

        // A push past the upper bound is handled here rather than in the enqueue so that the
        // conflict reason can be relaxed: the reason is a linear one over the tail lower bound,
        // the head upper bound and possibly the offset-variable lower bound, so any slack may be
        // spent on weakening those atoms.
        let upper_bound = context.upper_bound(head_var) as i64;
        if new_head_lb > upper_bound {
            let slack = new_head_lb - upper_bound - 1;
            integer_reason.push(context.upper_bound_as_predicate(head_var));
            let coefficients = vec![1_i64; integer_reason.len()];
            context
                .assignments_integer
                .relax_linear_reason(slack, &coefficients, &mut integer_reason);

            if !context.is_optional(head_var) {
                return Err(Explanation::new(literal_reason, integer_reason));
            }
            quince_assert_simple!(!context.is_currently_ignored(head_var));
            let is_ignored = context.is_ignored_literal(head_var);
            if context.literal_is_false(is_ignored) {
                literal_reason.push(is_ignored);
                return Err(Explanation::new(literal_reason, integer_reason));
            }
            // The push does not fit, so the optional head cannot be present.
            context.enqueue_propagated_literal(
                is_ignored,
                Explanation::new(literal_reason, integer_reason),
            );
            return Ok(());
        }

        context.enqueue(
            IntegerPredicate::greater_or_equal(head_var, new_head_lb as i32),
            Explanation::new(literal_reason, integer_reason),
        )?;
        self.modified_vars.set(head_var);
        Ok(())
    }

    fn initialize_bf_queue_with_modified_nodes(&mut self) {
        let num_nodes = self.impacted_arcs.len();
        self.bf_in_queue.resize(num_nodes, false);
        for node in self.bf_queue.drain(..) {
            self.bf_in_queue[node] = false;
        }
        quince_assert_moderate!(self.bf_in_queue.iter().all(|&in_queue| !in_queue));
        for var in self.modified_vars.iter() {
            if var.index() >= num_nodes {
                continue;
            }
            self.bf_queue.push_back(var.index());
            self.bf_in_queue[var.index()] = true;
        }
    }

    fn clean_up_marked_arcs_and_parents(&mut self) {
        // Every node with a parent arc is in modified_vars, so this clear is sparse.
        let num_nodes = self.impacted_arcs.len();
        for var in self.modified_vars.iter() {
            if var.index() >= num_nodes {
                continue;
            }
            if let Some(parent_arc) = self.bf_parent_arc_of[var.index()] {
                self.arc_is_marked[parent_arc] = false;
                self.bf_parent_arc_of[var.index()] = None;
                self.bf_can_be_skipped[var.index()] = false;
            }
        }
        quince_assert_moderate!(self.bf_parent_arc_of.iter().all(|parent| parent.is_none()));
        quince_assert_moderate!(self.bf_can_be_skipped.iter().all(|&skipped| !skipped));
    }

    /// DFS through the marked tree arcs from `source`, unmarking every traversed arc and flagging
    /// every visited node as skippable. Returns true if `target` is reached, which means that the
    /// arc `source -> target` would close a cycle of tree arcs. Because the disassembly unmarks as
    /// it goes, the cost is amortised over the whole Bellman-Ford run.
    fn disassemble_subtree(&mut self, source: usize, target: usize) -> bool {
        self.tmp_vector.clear();
        self.tmp_vector.push(source);
        while let Some(tail) = self.tmp_vector.pop() {
            let tail_var = IntegerVariable::create_from_index(tail);
            for position in 0..self.impacted_arcs[tail_var].len() {
                let arc_index = self.impacted_arcs[tail_var][position];
                if self.arc_is_marked[arc_index] {
                    self.arc_is_marked[arc_index] = false;
                    let head = self.arcs[arc_index].head_var.index();
                    if head == target {
                        return true;
                    }
                    quince_assert_moderate!(!self.bf_can_be_skipped[head]);
                    self.bf_can_be_skipped[head] = true;
                    self.tmp_vector.push(head);
                }
            }
        }
        false
    }

    /// Follows the parent arcs to reconstruct the positive cycle closed by `first_arc`, collecting
    /// its presence literals and offset-variable bounds as the reason. Heads of optional variables
    /// on the cycle are returned separately: the cycle is only possible when all of them are
    /// absent.
    fn analyze_positive_cycle(
        &mut self,
        context: &PropagationContextMut<'_>,
        first_arc: ArcIndex,
    ) -> (Vec<Literal>, Explanation) {
        let mut must_be_all_true = Vec::new();
        let mut literal_reason = Vec::new();
        let mut integer_reason = Vec::new();

        // The maximum cycle size on a graph with n nodes is n; more means first_arc is not on a
        // cycle of parent arcs, which should never happen.
        let num_nodes = self.impacted_arcs.len();
        let first_arc_head = self.arcs[first_arc].head_var;
        let mut arc_index = first_arc;
        let mut arcs_on_cycle = Vec::new();
        while arcs_on_cycle.len() <= num_nodes {
            arcs_on_cycle.push(arc_index);
            let arc = &self.arcs[arc_index];
            if arc.tail_var == first_arc_head {
                break;
            }
            arc_index = self.bf_parent_arc_of[arc.tail_var.index()]
                .expect("the cycle is closed through parent arcs");
        }
        quince_assert_simple!(arcs_on_cycle.len() != num_nodes + 1, "infinite loop");

        let mut sum: i64 = 0;
        for &cycle_arc in &arcs_on_cycle {
            let arc = &self.arcs[cycle_arc];
            sum += effective_offset(&context.as_readonly(), arc);
            if let Some(offset_var) = arc.offset_var {
                integer_reason.push(context.lower_bound_as_predicate(offset_var));
            }
            for &literal in &arc.presence_literals {
                literal_reason.push(!literal);
            }

            // A cycle through optional variables that are not yet absent is not a conflict: since
            // the propagation pushed through them regardless of their presence, their presence
            // literals must form a cycle as well, so they can only all be absent together.
            if context.is_optional(arc.head_var) {
                must_be_all_true.push(context.is_ignored_literal(arc.head_var));
            }
        }
        quince_assert_moderate!(sum > 0);

        (
            must_be_all_true,
            Explanation::new(literal_reason, integer_reason),
        )
    }

    fn bellman_ford_tarjan(&mut self, context: &mut PropagationContextMut<'_>) -> PropagationStatus {
        let num_nodes = self.impacted_arcs.len();
        self.bf_can_be_skipped.resize(num_nodes, false);
        self.bf_parent_arc_of.resize(num_nodes, None);

        let result = self.bellman_ford_tarjan_inner(context);
        self.clean_up_marked_arcs_and_parents();
        result
    }

    fn bellman_ford_tarjan_inner(
        &mut self,
        context: &mut PropagationContextMut<'_>,
    ) -> PropagationStatus {
        while let Some(node) = self.bf_queue.pop_front() {
            self.bf_in_queue[node] = false;

            if self.bf_can_be_skipped[node] {
                // The node was disassembled mid-iteration; it will be propagated again later.
                quince_assert_moderate!(self.bf_parent_arc_of[node].is_some());
                continue;
            }

            let node_var = IntegerVariable::create_from_index(node);
            let tail_lb = context.lower_bound(node_var) as i64;
            for position in 0..self.impacted_arcs[node_var].len() {
                let arc_index = self.impacted_arcs[node_var][position];
                let head_var = self.arcs[arc_index].head_var;
                quince_assert_eq_simple!(self.arcs[arc_index].tail_var, node_var);

                let candidate = tail_lb + effective_offset(&context.as_readonly(), &self.arcs[arc_index]);
                if candidate <= context.lower_bound(head_var) as i64 {
                    continue;
                }
                if context.is_currently_ignored(head_var) {
                    continue;
                }
                self.enqueue_and_check(context, arc_index, candidate)?;

                // Tarjan's contribution to Bellman-Ford: the disassembly detects positive cycles
                // and amortises its own cost, and the disassembled nodes are marked skippable so
                // that they are not propagated before their bounds settle.
                if self.disassemble_subtree(head_var.index(), node) {
                    let (mut must_be_all_true, mut explanation) =
                        self.analyze_positive_cycle(context, arc_index);
                    if must_be_all_true.is_empty() {
                        self.num_cycles += 1;
                        return Err(explanation);
                    }
                    must_be_all_true.sort_unstable();
                    must_be_all_true.dedup();
                    for &literal in &must_be_all_true {
                        if context.literal_is_false(literal) {
                            explanation.literal_reason.push(literal);
                            return Err(explanation);
                        }
                    }
                    for &literal in &must_be_all_true {
                        if context.literal_is_true(literal) {
                            continue;
                        }
                        context.enqueue_propagated_literal(literal, explanation.clone());
                    }

                    // Some optional variables were just forced absent; no parent update needed.
                    continue;
                }

                // Only arcs referenced from bf_parent_arc_of may stay marked.
                if let Some(parent_arc) = self.bf_parent_arc_of[head_var.index()] {
                    self.arc_is_marked[parent_arc] = false;
                }

                // The lower bound of the head may have jumped past the candidate on a discrete
                // domain. In that case the parent is cleared so that this extra push cannot fake a
                // positive cycle.
                let new_bound = context.lower_bound(head_var) as i64;
                if new_bound == candidate {
                    self.bf_parent_arc_of[head_var.index()] = Some(arc_index);
                    self.arc_is_marked[arc_index] = true;
                } else {
                    self.bf_parent_arc_of[head_var.index()] = None;
                }

                self.bf_can_be_skipped[head_var.index()] = false;
                if !self.bf_in_queue[head_var.index()] && new_bound >= candidate {
                    self.bf_queue.push_back(head_var.index());
                    self.bf_in_queue[head_var.index()] = true;
                }
            }
        }
        Ok(())
    }

    fn propagate_optional_arcs(&mut self, context: &mut PropagationContextMut<'_>) {
        let modified: Vec<IntegerVariable> = self.modified_vars.iter().collect();
        for var in modified {
            if var.index() >= self.impacted_potential_arcs.len() {
                continue;
            }

            // The same arc can be checked up to three times here, once for each of the variables
            // it is indexed under: tail, negated head and offset variable.
            for position in 0..self.impacted_potential_arcs[var].len() {
                let arc_index = self.impacted_potential_arcs[var][position];
                let arc = self.potential_arcs[arc_index].clone();

                let mut num_not_true = 0;
                let mut to_propagate = None;
                for &literal in &arc.presence_literals {
                    if !context.literal_is_true(literal) {
                        num_not_true += 1;
                        to_propagate = Some(literal);
                    }
                }
                if num_not_true != 1 {
                    continue;
                }
                let to_propagate = to_propagate.expect("exactly one literal is undecided");
                if context.literal_is_false(to_propagate) {
                    continue;
                }

                // Test whether this arc can still fit; note that arc.tail_var can differ from var.
                let tail_lb = context.lower_bound(arc.tail_var) as i64;
                let head_ub = context.upper_bound(arc.head_var) as i64;
                if tail_lb + effective_offset(&context.as_readonly(), &arc) > head_ub {
                    let mut integer_reason = vec![
                        context.lower_bound_as_predicate(arc.tail_var),
                        context.upper_bound_as_predicate(arc.head_var),
                    ];
                    if let Some(offset_var) = arc.offset_var {
                        integer_reason.push(context.lower_bound_as_predicate(offset_var));
                    }
                    let literal_reason = arc
                        .presence_literals
                        .iter()
                        .filter(|&&literal| literal != to_propagate)
                        .map(|&literal| !literal)
                        .collect();
                    self.num_enforcement_pushes += 1;
                    context.enqueue_propagated_literal(
                        !to_propagate,
                        Explanation::new(literal_reason, integer_reason),
                    );
                }
            }
        }
    }
}

// Offline collection of the active precedence structure, used between search phases.
impl PrecedencesPropagator {
    /// For each variable of `vars`, collects the active arcs leaving it whose effective offset is
    /// non-negative, grouped by head variable. Heads reached by fewer than two of `vars` are
    /// dropped, as are duplicate entries caused by multi-arcs; the groups are ordered by the
    /// current lower bound of the head.
    pub fn compute_precedences(
        &mut self,
        context: PropagationContext<'_>,
        vars: &[IntegerVariable],
        output: &mut Vec<IntegerPrecedence>,
    ) {
        let mut sorted_vars: Vec<(i32, IntegerVariable)> = Vec::new();
        let mut precedences: Vec<IntegerPrecedence> = Vec::new();

        for (index, &var) in vars.iter().enumerate() {
            if var.index() >= self.impacted_arcs.len() {
                continue;
            }
            for position in 0..self.impacted_arcs[var].len() {
                let arc_index = self.impacted_arcs[var][position];
                let head_var = self.arcs[arc_index].head_var;
                if context.is_currently_ignored(head_var) {
                    continue;
                }

                let offset = effective_offset(&context, &self.arcs[arc_index]);
                // Relations with a negative effective offset are usually of the form
                // `interval_start >= interval_end - length` and are not useful here.
                if offset < 0 {
                    continue;
                }

                if self.var_to_degree[head_var] == 0 {
                    sorted_vars.push((context.lower_bound(head_var), head_var));
                } else if self.var_to_last_index[head_var] == index as i64 {
                    // A multi-arc towards the same head; only one entry per (index, head) pair.
                    continue;
                }
                self.var_to_last_index[head_var] = index as i64;
                self.var_to_degree[head_var] += 1;
                precedences.push(IntegerPrecedence {
                    index,
                    var: head_var,
                    arc_index,
                    offset: offset as i32,
                });
            }
        }

        // This order is topological for the precedence relation, provided all the offsets between
        // the involved variables are positive.
        sorted_vars.sort_unstable();

        // Permute the precedences into the output by turning var_to_degree into the start position
        // of each head in the output.
        let mut start: i64 = 0;
        for &(_, var) in &sorted_vars {
            let degree = self.var_to_degree[var];
            if degree > 1 {
                self.var_to_degree[var] = start;
                start += degree;
            } else {
                // Degree-one relations are already fully propagated; drop them.
                self.var_to_degree[var] = -1;
            }
        }
        output.clear();
        output.resize(start as usize, IntegerPrecedence::default());
        for precedence in &precedences {
            if self.var_to_degree[precedence.var] < 0 {
                continue;
            }
            output[self.var_to_degree[precedence.var] as usize] = precedence.clone();
            self.var_to_degree[precedence.var] += 1;
        }

        // Restore var_to_degree; var_to_last_index does not need to be cleaned.
        for &(_, var) in &sorted_vars {
            self.var_to_degree[var] = 0;
        }
    }

    /// Converts the output of [`PrecedencesPropagator::compute_precedences`] into one
    /// [`FullIntegerPrecedence`] record per head variable. Only valid at the root level.
    pub fn compute_partial_precedences(
        &mut self,
        context: PropagationContext<'_>,
        vars: &[IntegerVariable],
        output: &mut Vec<FullIntegerPrecedence>,
    ) {
        output.clear();
        quince_assert_eq_simple!(context.current_decision_level(), 0);

        let mut precedences = Vec::new();
        self.compute_precedences(context, vars, &mut precedences);

        let mut position = 0;
        while position < precedences.len() {
            let var = precedences[position].var;
            let mut data = FullIntegerPrecedence {
                var,
                indices: vec![],
                offsets: vec![],
            };
            while position < precedences.len() && precedences[position].var == var {
                data.indices.push(precedences[position].index);
                data.offsets.push(precedences[position].offset);
                position += 1;
            }
            output.push(data);
        }
    }

    /// Appends the reason for `vars[precedence.index] + min_offset <= precedence.var` to the given
    /// reason buffers.
    pub fn add_precedence_reason(
        &self,
        precedence: &IntegerPrecedence,
        min_offset: i32,
        literal_reason: &mut Vec<Literal>,
        integer_reason: &mut Vec<IntegerPredicate>,
    ) {
        let arc = &self.arcs[precedence.arc_index];
        for &literal in &arc.presence_literals {
            literal_reason.push(!literal);
        }
        if let Some(offset_var) = arc.offset_var {
            // Reason for the effective offset of the arc to be at least min_offset.
            integer_reason.push(IntegerPredicate::greater_or_equal(
                offset_var,
                min_offset - arc.offset,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_solver::TestSolver;

    #[test]
    fn bounds_are_pushed_along_a_chain_of_arcs() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 10);
        let y = solver.new_variable(0, 10);
        let z = solver.new_variable(0, 10);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_precedence_with_offset(solver.context(), x, y, 2);
        propagator.add_precedence_with_offset(solver.context(), y, z, 3);

        solver.tighten_lower_bound(x, 1);
        solver.propagate(&mut propagator).expect("no conflict");

        assert_eq!(3, solver.lower_bound(y));
        assert_eq!(6, solver.lower_bound(z));
    }

    #[test]
    fn the_symmetric_companions_propagate_upper_bounds() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 10);
        let y = solver.new_variable(0, 10);
        let z = solver.new_variable(0, 10);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_precedence_with_offset(solver.context(), x, y, 2);
        propagator.add_precedence_with_offset(solver.context(), y, z, 3);

        solver.tighten_lower_bound(x, 1);
        solver.propagate(&mut propagator).expect("no conflict");

        // x <= 10 - 3 - 2 and y <= 10 - 3 through the negation arcs.
        solver.assert_bounds(x, 1, 5);
        solver.assert_bounds(y, 3, 7);
        solver.assert_bounds(z, 6, 10);
    }

    #[test]
    fn pushes_record_the_tail_bound_and_presence_literals_as_reason() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 10);
        let y = solver.new_variable(0, 10);
        let z = solver.new_variable(0, 10);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_precedence_with_offset(solver.context(), x, y, 2);
        propagator.add_precedence_with_offset(solver.context(), y, z, 3);

        solver.tighten_lower_bound(x, 1);
        solver.propagate(&mut propagator).expect("no conflict");

        let reason = solver
            .assignments_integer
            .get_reason_for_predicate(IntegerPredicate::greater_or_equal(y, 3));
        assert!(reason.literal_reason.is_empty());
        assert_eq!(vec![IntegerPredicate::greater_or_equal(x, 1)], reason.integer_reason);

        let reason = solver
            .assignments_integer
            .get_reason_for_predicate(IntegerPredicate::greater_or_equal(z, 6));
        assert_eq!(vec![IntegerPredicate::greater_or_equal(y, 3)], reason.integer_reason);
    }

    #[test]
    fn a_positive_cycle_of_unconditional_arcs_is_a_conflict() {
        let mut solver = TestSolver::default();
        let a = solver.new_variable(0, 10);
        let b = solver.new_variable(0, 10);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_precedence_with_offset(solver.context(), a, b, 1);
        propagator.add_precedence_with_offset(solver.context(), b, a, 1);

        let conflict = solver
            .propagate(&mut propagator)
            .expect_err("the cycle has positive weight");

        // The cycle is structurally infeasible: no presence literals, no offset variables.
        assert!(conflict.is_empty());
    }

    #[test]
    fn a_push_past_the_upper_bound_is_a_conflict_over_the_bounds_read() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(5, 10);
        let y = solver.new_variable(0, 4);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_precedence(solver.context(), x, y);

        let conflict = solver
            .propagate(&mut propagator)
            .expect_err("x cannot fit below y");

        assert!(conflict
            .integer_reason
            .contains(&IntegerPredicate::greater_or_equal(x, 5)));
        assert!(conflict
            .integer_reason
            .contains(&IntegerPredicate::lower_or_equal(y, 4)));
    }

    #[test]
    fn a_conditional_arc_activates_on_its_literal_and_deactivates_on_backtrack() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 10);
        let y = solver.new_variable(0, 10);
        let p = solver.new_literal();

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_conditional_precedence_with_offset(solver.context(), x, y, 5, &[p]);

        solver.tighten_lower_bound(x, 3);
        solver.propagate(&mut propagator).expect("no conflict");
        assert_eq!(0, solver.lower_bound(y));
        assert_eq!(None, propagator.conditional_offset(x, y));

        solver.increase_decision_level();
        solver.enqueue_decision_literal(p);
        solver.propagate(&mut propagator).expect("no conflict");
        assert_eq!(8, solver.lower_bound(y));
        assert_eq!(Some((p, 5)), propagator.conditional_offset(x, y));

        solver.backtrack(&mut propagator, 0);
        assert_eq!(0, solver.lower_bound(y));
        assert_eq!(None, propagator.conditional_offset(x, y));

        // The arc is back to potential: nothing is propagated without p.
        solver.tighten_lower_bound(x, 4);
        solver.propagate(&mut propagator).expect("no conflict");
        assert_eq!(0, solver.lower_bound(y));
    }

    #[test]
    fn activation_state_is_identical_after_repeated_assignment_and_backtrack() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 10);
        let y = solver.new_variable(0, 10);
        let p = solver.new_literal();
        let q = solver.new_literal();

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_conditional_precedence_with_offset(solver.context(), x, y, 2, &[p, q]);

        solver.propagate(&mut propagator).expect("no conflict");

        for _ in 0..3 {
            solver.increase_decision_level();
            solver.enqueue_decision_literal(p);
            solver.propagate(&mut propagator).expect("no conflict");
            assert_eq!(0, solver.lower_bound(y));

            solver.increase_decision_level();
            solver.enqueue_decision_literal(q);
            solver.propagate(&mut propagator).expect("no conflict");
            assert_eq!(2, solver.lower_bound(y));
            assert_eq!(None, propagator.conditional_offset(x, y));

            solver.backtrack(&mut propagator, 0);
            assert_eq!(0, solver.lower_bound(y));
        }
    }

    #[test]
    fn a_potential_arc_that_cannot_fit_has_its_presence_literal_falsified() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 10);
        let y = solver.new_variable(0, 4);
        let p = solver.new_literal();

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_conditional_precedence_with_offset(solver.context(), x, y, 7, &[p]);

        solver.propagate(&mut propagator).expect("no conflict");

        assert!(solver.assignments_propositional.is_literal_assigned_true(!p));
        let reason = solver.assignments_propositional.get_literal_reason(!p);
        assert!(reason
            .integer_reason
            .contains(&IntegerPredicate::greater_or_equal(x, 0)));
        assert!(reason
            .integer_reason
            .contains(&IntegerPredicate::lower_or_equal(y, 4)));
    }

    #[test]
    fn an_infeasible_push_onto_an_optional_head_forces_it_absent() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(5, 10);
        let (y, is_ignored) = solver.new_optional_variable(0, 4);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_precedence(solver.context(), x, y);

        solver.propagate(&mut propagator).expect("no conflict");

        assert!(solver
            .assignments_propositional
            .is_literal_assigned_true(is_ignored));
    }

    #[test]
    fn variable_offsets_push_through_all_symmetric_companions() {
        let mut solver = TestSolver::default();
        let a = solver.new_variable(0, 10);
        let d = solver.new_variable(2, 5);
        let c = solver.new_variable(0, 10);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_precedence_with_variable_offset(solver.context(), a, c, d);

        solver.propagate(&mut propagator).expect("no conflict");
        assert_eq!(2, solver.lower_bound(c));

        solver.tighten_upper_bound(c, 4);
        solver.propagate(&mut propagator).expect("no conflict");

        // a + d <= c together with c <= 4 and d >= 2 bounds both a and d from above.
        assert_eq!(2, solver.upper_bound(a));
        assert_eq!(4, solver.upper_bound(d));
    }

    #[test]
    fn fixed_offset_variables_are_folded_into_the_offset() {
        let mut solver = TestSolver::default();
        let a = solver.new_variable(0, 10);
        let d = solver.new_variable(3, 3);
        let c = solver.new_variable(0, 10);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_precedence_with_variable_offset(solver.context(), a, c, d);

        solver.tighten_lower_bound(a, 2);
        solver.propagate(&mut propagator).expect("no conflict");

        assert_eq!(5, solver.lower_bound(c));
    }

    #[test]
    fn arcs_with_a_root_falsified_presence_literal_are_dropped() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 10);
        let y = solver.new_variable(0, 10);
        let p = solver.new_literal();

        solver.enqueue_decision_literal(!p);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_conditional_precedence_with_offset(solver.context(), x, y, 2, &[p]);

        solver.tighten_lower_bound(x, 1);
        solver.propagate(&mut propagator).expect("no conflict");

        assert_eq!(0, solver.lower_bound(y));
    }

    #[test]
    fn arcs_with_a_root_satisfied_presence_literal_are_unconditional() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 10);
        let y = solver.new_variable(0, 10);
        let p = solver.new_literal();

        solver.enqueue_decision_literal(p);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_conditional_precedence_with_offset(solver.context(), x, y, 2, &[p]);

        solver.tighten_lower_bound(x, 1);
        solver.propagate(&mut propagator).expect("no conflict");

        assert_eq!(3, solver.lower_bound(y));
    }

    #[test]
    fn dominated_arcs_are_not_added_again() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 10);
        let y = solver.new_variable(0, 10);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_precedence_with_offset(solver.context(), x, y, 2);

        assert!(!propagator.add_precedence_with_offset_if_new(solver.context(), x, y, 1));
        assert!(!propagator.add_precedence_with_offset_if_new(solver.context(), x, y, 2));
        assert!(propagator.add_precedence_with_offset_if_new(solver.context(), x, y, 3));
    }

    #[test]
    fn outgoing_arcs_can_be_relaxed_without_the_fixed_point_loop() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 10);
        let y = solver.new_variable(0, 10);
        let z = solver.new_variable(0, 10);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_precedence_with_offset(solver.context(), x, y, 2);
        propagator.add_precedence_with_offset(solver.context(), y, z, 3);

        solver.tighten_lower_bound(x, 1);
        let mut context = solver.context_mut();
        propagator
            .propagate_outgoing_arcs(&mut context, x)
            .expect("no conflict");

        // Only the arcs leaving x were relaxed.
        assert_eq!(3, solver.lower_bound(y));
        assert_eq!(0, solver.lower_bound(z));
    }

    #[test]
    fn precedences_are_collected_per_head_for_the_queried_variables() {
        let mut solver = TestSolver::default();
        let a = solver.new_variable(0, 10);
        let b = solver.new_variable(0, 10);
        let c = solver.new_variable(0, 10);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_precedence_with_offset(solver.context(), a, c, 2);
        propagator.add_precedence_with_offset(solver.context(), b, c, 3);

        let mut output = vec![];
        propagator.compute_partial_precedences(solver.context(), &[a, b], &mut output);

        let record = output
            .iter()
            .find(|record| record.var == c)
            .expect("c is preceded by both a and b");
        assert_eq!(vec![0, 1], record.indices);
        assert_eq!(vec![2, 3], record.offsets);
    }

    #[test]
    fn degree_one_heads_are_dropped_from_collected_precedences() {
        let mut solver = TestSolver::default();
        let a = solver.new_variable(0, 10);
        let b = solver.new_variable(0, 10);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_precedence_with_offset(solver.context(), a, b, 2);

        let mut output = vec![];
        propagator.compute_partial_precedences(solver.context(), &[a], &mut output);

        assert!(output.is_empty());
    }

    #[test]
    fn precedence_reasons_cite_the_offset_variable_bound() {
        let mut solver = TestSolver::default();
        let a = solver.new_variable(0, 10);
        let b = solver.new_variable(0, 10);
        let d = solver.new_variable(2, 5);
        let c = solver.new_variable(0, 20);

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_precedence_with_variable_offset(solver.context(), a, c, d);
        propagator.add_precedence_with_offset(solver.context(), b, c, 3);

        let mut output = vec![];
        propagator.compute_precedences(solver.context(), &[a, b], &mut output);

        let entry = output
            .iter()
            .find(|precedence| precedence.index == 0)
            .expect("the arc from a is collected");
        assert_eq!(c, entry.var);
        assert_eq!(2, entry.offset);

        let mut literal_reason = vec![];
        let mut integer_reason = vec![];
        propagator.add_precedence_reason(entry, 2, &mut literal_reason, &mut integer_reason);

        assert!(literal_reason.is_empty());
        assert_eq!(
            vec![IntegerPredicate::greater_or_equal(d, 2)],
            integer_reason
        );
    }

    #[test]
    fn self_arcs_are_accepted_as_a_diagnostic() {
        let mut solver = TestSolver::default();
        let x = solver.new_variable(0, 10);
        let p = solver.new_literal();

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_conditional_precedence_with_offset(solver.context(), x, x, -1, &[p]);

        solver.propagate(&mut propagator).expect("no conflict");
    }
}
