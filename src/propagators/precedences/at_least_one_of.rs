use itertools::Itertools;

use log::debug;
use log::info;

use super::ArcIndex;
use super::ArcInfo;
use super::PrecedencesPropagator;
use crate::basic_types::hash_structures::HashSet;
use crate::basic_types::IntegerVariable;
use crate::basic_types::KeyedVec;
use crate::basic_types::Literal;
use crate::basic_types::PropositionalVariable;
use crate::basic_types::StorageKey;
use crate::engine::sat::ClauseDatabase;
use crate::engine::sat::ProbeStatus;
use crate::engine::sat::SatProbingSolver;
use crate::engine::termination::TerminationCondition;
use crate::engine::PropagationContext;
use crate::engine::ReadDomains;
use crate::quince_assert_eq_simple;

/// With more clauses than this, the clause-driven extraction is replaced by probing.
const CLAUSE_SCAN_LIMIT: usize = 1_000_000;
/// The degenerate two-literal clauses `{x, ~x}` are only scanned below this variable count.
const VARIABLE_SCAN_LIMIT: u32 = 1_000_000;

/// The constraint `head >= min over selected i of (tails[i] + offsets[i])`, provided all
/// enforcement literals are true; `selectors[i]` being true selects entry `i`.
///
/// Produced by the extraction passes of [`PrecedencesPropagator`] and handed to the model layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GreaterThanAtLeastOneOf {
    pub head: IntegerVariable,
    pub tails: Vec<IntegerVariable>,
    pub offsets: Vec<i32>,
    pub selectors: Vec<Literal>,
    pub enforcements: Vec<Literal>,
}

impl PrecedencesPropagator {
    /// Collects, for each head variable, the arcs whose single presence literal occurs in the
    /// clause; a head covered by (almost) the whole clause yields a [`GreaterThanAtLeastOneOf`]
    /// whose enforcements are the negations of the uncovered clause literals. Only valid at the
    /// root level. Returns the number of emitted constraints.
    pub fn add_greater_than_at_least_one_of_constraints_from_clause(
        &self,
        context: PropagationContext<'_>,
        clause: &[Literal],
        output: &mut Vec<GreaterThanAtLeastOneOf>,
    ) -> usize {
        quince_assert_eq_simple!(context.current_decision_level(), 0);
        if clause.len() < 2 {
            return 0;
        }

        // Collect all arcs impacted by this clause. Arcs with several presence literals or a
        // variable offset are not captured by this structure.
        let mut infos: Vec<ArcInfo> = Vec::new();
        for &literal in clause {
            if literal.index() >= self.literal_to_new_impacted_arcs.len() {
                continue;
            }
            for &arc_index in &self.literal_to_new_impacted_arcs[literal] {
                let arc = &self.arcs[arc_index];
                if arc.presence_literals.len() != 1 {
                    continue;
                }
                if arc.offset_var.is_some() {
                    continue;
                }
                infos.push(arc.clone());
            }
        }
        if infos.len() <= 1 {
            return 0;
        }

        // The stable sort keeps, within a head group, the entries in the order the clause lists
        // their literals, which the clause walk below relies on.
        infos.sort_by_key(|info| info.head_var);

        let mut num_added_constraints = 0;
        for (head_var, group) in &infos.iter().chunk_by(|info| info.head_var) {
            let arcs: Vec<&ArcInfo> = group.collect();

            // A single arc is already fully propagated on its own.
            if arcs.len() < 2 {
                continue;
            }

            // Heuristic: only look at full or almost full clauses.
            if arcs.len() + 1 < clause.len() {
                continue;
            }

            let mut tails = Vec::new();
            let mut offsets = Vec::new();
            let mut selectors = Vec::new();
            let mut enforcements = Vec::new();

            let mut position = 0;
            for &literal in clause {
                let mut added = false;
                while position < arcs.len() && literal == arcs[position].presence_literals[0] {
                    added = true;
                    tails.push(arcs[position].tail_var);
                    offsets.push(arcs[position].offset);
                    // Duplicate selectors are supported.
                    selectors.push(literal);
                    position += 1;
                }
                if !added {
                    enforcements.push(!literal);
                }
            }

            // Without at least two distinct selector literals there is nothing to gain.
            if enforcements.len() + 1 == clause.len() {
                continue;
            }

            num_added_constraints += 1;
            output.push(GreaterThanAtLeastOneOf {
                head: head_var,
                tails,
                offsets,
                selectors,
                enforcements,
            });
        }
        num_added_constraints
    }

    /// Probing-based detection: for each head with at least two incoming conditional arcs, assume
    /// the negations of the presence literals one by one; an assumptions-unsat answer yields a
    /// core of arcs of which at least one must be present. The SAT solver is always left at the
    /// root level. Returns the number of emitted constraints.
    pub fn add_greater_than_at_least_one_of_constraints_with_clause_auto_detection(
        &self,
        sat_solver: &mut dyn SatProbingSolver,
        termination: &mut dyn TerminationCondition,
        output: &mut Vec<GreaterThanAtLeastOneOf>,
    ) -> usize {
        // The set of incoming conditional arcs for each variable; only arcs with a fixed offset
        // and a single presence literal participate.
        let mut incoming_arcs: KeyedVec<IntegerVariable, Vec<ArcIndex>> = KeyedVec::default();
        for arc_index in self.arcs.keys() {
            let arc = &self.arcs[arc_index];
            if arc.offset_var.is_some() {
                continue;
            }
            if arc.tail_var == arc.head_var {
                continue;
            }
            if arc.presence_literals.len() != 1 {
                continue;
            }
            incoming_arcs.accommodate(arc.head_var, vec![]);
            incoming_arcs[arc.head_var].push(arc_index);
        }

        let mut num_added_constraints = 0;
        for target in incoming_arcs.keys() {
            if incoming_arcs[target].len() <= 1 {
                continue;
            }
            if termination.should_stop() {
                return num_added_constraints;
            }

            // Detect a set of incoming arcs of which at least one must be present.
            sat_solver.backtrack_to_root();
            if sat_solver.model_is_unsat() {
                return num_added_constraints;
            }
            let mut core: Vec<Literal> = Vec::new();
            for &arc_index in &incoming_arcs[target] {
                let literal = self.arcs[arc_index].presence_literals[0];
                if sat_solver.literal_is_false(literal) {
                    continue;
                }
                match sat_solver.enqueue_decision_and_backtrack_on_conflict(!literal) {
                    ProbeStatus::Feasible => {}
                    ProbeStatus::Infeasible => return num_added_constraints,
                    ProbeStatus::AssumptionsUnsat => {
                        core = sat_solver.get_last_incompatible_decisions();
                        break;
                    }
                }
            }
            sat_solver.backtrack_to_root();

            if core.len() > 1 {
                // Extract the set of arcs of which at least one must be present.
                let core_set: HashSet<Literal> = core.iter().copied().collect();
                let mut tails = Vec::new();
                let mut offsets = Vec::new();
                let mut selectors = Vec::new();
                for &arc_index in &incoming_arcs[target] {
                    let arc = &self.arcs[arc_index];
                    let literal = arc.presence_literals[0];
                    if core_set.contains(&!literal) {
                        tails.push(arc.tail_var);
                        offsets.push(arc.offset);
                        selectors.push(literal);
                    }
                }

                debug!(
                    "{}/{} incoming arcs of {target} form a core",
                    selectors.len(),
                    incoming_arcs[target].len()
                );

                num_added_constraints += 1;
                output.push(GreaterThanAtLeastOneOf {
                    head: target,
                    tails,
                    offsets,
                    selectors,
                    enforcements: vec![],
                });
                if !sat_solver.finish_propagation() {
                    return num_added_constraints;
                }
            }
        }

        num_added_constraints
    }

    /// Runs the clause-driven extraction over all problem clauses (including the degenerate
    /// two-literal clauses `{x, ~x}`), or the probing-based detection when the clause database is
    /// too large to scan. Honours the termination condition and stops early once the model is
    /// known to be unsatisfiable. Returns the number of emitted constraints.
    pub fn add_greater_than_at_least_one_of_constraints(
        &self,
        context: PropagationContext<'_>,
        clauses: &dyn ClauseDatabase,
        sat_solver: &mut dyn SatProbingSolver,
        termination: &mut dyn TerminationCondition,
        output: &mut Vec<GreaterThanAtLeastOneOf>,
    ) -> usize {
        debug!("detecting greater-than-at-least-one-of constraints...");
        let mut num_added_constraints = 0;

        if clauses.num_clauses() < CLAUSE_SCAN_LIMIT {
            for clause in clauses.iter_clauses() {
                if termination.should_stop() {
                    return num_added_constraints;
                }
                if sat_solver.model_is_unsat() {
                    return num_added_constraints;
                }
                let num_added = self.add_greater_than_at_least_one_of_constraints_from_clause(
                    PropagationContext::new(
                        context.assignments_integer,
                        context.assignments_propositional,
                    ),
                    clause,
                    output,
                );
                num_added_constraints += num_added;
                if num_added > 0 && !sat_solver.finish_propagation() {
                    return num_added_constraints;
                }
            }

            // It is common that there are only two alternatives to push a variable, controlled by
            // a single Boolean; the degenerate clauses `{x, ~x}` capture those.
            let num_booleans = sat_solver.num_propositional_variables();
            if num_booleans < VARIABLE_SCAN_LIMIT {
                for index in 0..num_booleans {
                    if termination.should_stop() {
                        return num_added_constraints;
                    }
                    if sat_solver.model_is_unsat() {
                        return num_added_constraints;
                    }
                    let variable = PropositionalVariable::new(index);
                    let clause = [
                        Literal::new(variable, true),
                        Literal::new(variable, false),
                    ];
                    let num_added = self
                        .add_greater_than_at_least_one_of_constraints_from_clause(
                            PropagationContext::new(
                                context.assignments_integer,
                                context.assignments_propositional,
                            ),
                            &clause,
                            output,
                        );
                    num_added_constraints += num_added;
                    if num_added > 0 && !sat_solver.finish_propagation() {
                        return num_added_constraints;
                    }
                }
            }
        } else {
            num_added_constraints += self
                .add_greater_than_at_least_one_of_constraints_with_clause_auto_detection(
                    sat_solver,
                    termination,
                    output,
                );
        }

        if num_added_constraints > 0 {
            info!("[precedences] added {num_added_constraints} greater-than-at-least-one-of constraints");
        }
        num_added_constraints
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::engine::termination::Indefinite;
    use crate::engine::test_solver::TestSolver;

    /// A scripted stand-in for a live SAT solver: probe outcomes and the conflict core are
    /// supplied up front, interactions are recorded.
    #[derive(Default)]
    struct ScriptedSatSolver {
        num_variables: u32,
        false_literals: Vec<Literal>,
        probe_statuses: VecDeque<ProbeStatus>,
        core: Vec<Literal>,
        is_unsat: bool,
        num_backtracks: usize,
        probed_decisions: Vec<Literal>,
    }

    impl SatProbingSolver for ScriptedSatSolver {
        fn backtrack_to_root(&mut self) {
            self.num_backtracks += 1;
        }

        fn model_is_unsat(&self) -> bool {
            self.is_unsat
        }

        fn num_propositional_variables(&self) -> u32 {
            self.num_variables
        }

        fn literal_is_false(&self, literal: Literal) -> bool {
            self.false_literals.contains(&literal)
        }

        fn enqueue_decision_and_backtrack_on_conflict(&mut self, decision: Literal) -> ProbeStatus {
            self.probed_decisions.push(decision);
            self.probe_statuses
                .pop_front()
                .unwrap_or(ProbeStatus::Feasible)
        }

        fn get_last_incompatible_decisions(&mut self) -> Vec<Literal> {
            self.core.clone()
        }

        fn finish_propagation(&mut self) -> bool {
            !self.is_unsat
        }
    }

    #[test]
    fn a_clause_covering_two_arcs_into_the_same_head_yields_a_constraint() {
        let mut solver = TestSolver::default();
        let x1 = solver.new_variable(0, 10);
        let x2 = solver.new_variable(0, 10);
        let head = solver.new_variable(0, 20);
        let l1 = solver.new_literal();
        let l2 = solver.new_literal();

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_conditional_precedence_with_offset(solver.context(), x1, head, 3, &[l1]);
        propagator.add_conditional_precedence_with_offset(solver.context(), x2, head, 5, &[l2]);

        let mut output = vec![];
        let num_added = propagator.add_greater_than_at_least_one_of_constraints_from_clause(
            solver.context(),
            &[l1, l2],
            &mut output,
        );

        assert_eq!(1, num_added);
        let constraint = &output[0];
        assert_eq!(head, constraint.head);
        assert_eq!(vec![x1, x2], constraint.tails);
        assert_eq!(vec![3, 5], constraint.offsets);
        assert_eq!(vec![l1, l2], constraint.selectors);
        assert!(constraint.enforcements.is_empty());
    }

    #[test]
    fn uncovered_clause_literals_become_enforcements() {
        let mut solver = TestSolver::default();
        let x1 = solver.new_variable(0, 10);
        let x2 = solver.new_variable(0, 10);
        let head = solver.new_variable(0, 20);
        let l1 = solver.new_literal();
        let l2 = solver.new_literal();
        let l3 = solver.new_literal();

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_conditional_precedence_with_offset(solver.context(), x1, head, 3, &[l1]);
        propagator.add_conditional_precedence_with_offset(solver.context(), x2, head, 5, &[l2]);

        let mut output = vec![];
        let num_added = propagator.add_greater_than_at_least_one_of_constraints_from_clause(
            solver.context(),
            &[l1, l2, l3],
            &mut output,
        );

        assert_eq!(1, num_added);
        assert_eq!(vec![!l3], output[0].enforcements);
    }

    #[test]
    fn a_single_distinct_selector_is_not_worth_a_constraint() {
        let mut solver = TestSolver::default();
        let x1 = solver.new_variable(0, 10);
        let x2 = solver.new_variable(0, 10);
        let head = solver.new_variable(0, 20);
        let l1 = solver.new_literal();
        let l2 = solver.new_literal();

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_conditional_precedence_with_offset(solver.context(), x1, head, 3, &[l1]);
        propagator.add_conditional_precedence_with_offset(solver.context(), x2, head, 5, &[l1]);

        let mut output = vec![];
        let num_added = propagator.add_greater_than_at_least_one_of_constraints_from_clause(
            solver.context(),
            &[l1, l2],
            &mut output,
        );

        assert_eq!(0, num_added);
        assert!(output.is_empty());
    }

    #[test]
    fn two_way_alternatives_are_found_through_the_degenerate_clauses() {
        let mut solver = TestSolver::default();
        let x1 = solver.new_variable(0, 10);
        let x2 = solver.new_variable(0, 10);
        let head = solver.new_variable(0, 20);
        let p = solver.new_literal();

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_conditional_precedence_with_offset(solver.context(), x1, head, 3, &[p]);
        propagator.add_conditional_precedence_with_offset(solver.context(), x2, head, 5, &[!p]);

        let clauses: Vec<Vec<Literal>> = vec![];
        let mut sat_solver = ScriptedSatSolver {
            num_variables: solver.assignments_propositional.num_propositional_variables(),
            ..Default::default()
        };
        let mut termination = Indefinite;

        let mut output = vec![];
        let num_added = propagator.add_greater_than_at_least_one_of_constraints(
            solver.context(),
            &clauses,
            &mut sat_solver,
            &mut termination,
            &mut output,
        );

        assert_eq!(1, num_added);
        let constraint = &output[0];
        assert_eq!(head, constraint.head);
        assert_eq!(2, constraint.selectors.len());
        assert!(constraint.enforcements.is_empty());
    }

    #[test]
    fn probing_extracts_the_core_of_incompatible_presence_negations() {
        let mut solver = TestSolver::default();
        let x1 = solver.new_variable(0, 10);
        let x2 = solver.new_variable(0, 10);
        let head = solver.new_variable(0, 20);
        let l1 = solver.new_literal();
        let l2 = solver.new_literal();

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_conditional_precedence_with_offset(solver.context(), x1, head, 3, &[l1]);
        propagator.add_conditional_precedence_with_offset(solver.context(), x2, head, 5, &[l2]);

        let mut sat_solver = ScriptedSatSolver {
            num_variables: solver.assignments_propositional.num_propositional_variables(),
            probe_statuses: VecDeque::from([ProbeStatus::Feasible, ProbeStatus::AssumptionsUnsat]),
            core: vec![!l1, !l2],
            ..Default::default()
        };
        let mut termination = Indefinite;

        let mut output = vec![];
        let num_added = propagator
            .add_greater_than_at_least_one_of_constraints_with_clause_auto_detection(
                &mut sat_solver,
                &mut termination,
                &mut output,
            );

        assert_eq!(1, num_added);
        let constraint = &output[0];
        assert_eq!(head, constraint.head);
        assert_eq!(vec![x1, x2], constraint.tails);
        assert_eq!(vec![l1, l2], constraint.selectors);
        assert!(constraint.enforcements.is_empty());

        assert_eq!(vec![!l1, !l2], sat_solver.probed_decisions);
        // The decision level is restored to the root before and after the probe sequence.
        assert!(sat_solver.num_backtracks >= 2);
    }

    #[test]
    fn probing_reports_nothing_for_an_unsat_model() {
        let mut solver = TestSolver::default();
        let x1 = solver.new_variable(0, 10);
        let x2 = solver.new_variable(0, 10);
        let head = solver.new_variable(0, 20);
        let l1 = solver.new_literal();
        let l2 = solver.new_literal();

        let mut propagator = PrecedencesPropagator::default();
        propagator.add_conditional_precedence_with_offset(solver.context(), x1, head, 3, &[l1]);
        propagator.add_conditional_precedence_with_offset(solver.context(), x2, head, 5, &[l2]);

        let mut sat_solver = ScriptedSatSolver {
            num_variables: solver.assignments_propositional.num_propositional_variables(),
            is_unsat: true,
            ..Default::default()
        };
        let mut termination = Indefinite;

        let mut output = vec![];
        let num_added = propagator
            .add_greater_than_at_least_one_of_constraints_with_clause_auto_detection(
                &mut sat_solver,
                &mut termination,
                &mut output,
            );

        assert_eq!(0, num_added);
        assert!(output.is_empty());
    }
}
