use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::debug;

use super::FullIntegerPrecedence;
use crate::basic_types::hash_structures::HashMap;
use crate::basic_types::hash_structures::HashSet;
use crate::basic_types::ConstraintOperationError;
use crate::basic_types::IntegerVariable;
use crate::basic_types::StorageKey;
use crate::engine::IntegerTrail;
use crate::quince_assert_eq_simple;

/// Caps the number of insert operations of the transitive closure; once exceeded the closure is
/// simply left incomplete, which consumers must tolerate.
const CLOSURE_WORK_LIMIT: u64 = 1_000_000;

/// A build-once store of the unconditional precedence relations `tail + offset <= head` that are
/// known before search.
///
/// Relations are accumulated through [`PrecedenceRelations::add`]; the first query finalises the
/// store: a stable topological order of the variables is computed and, if the graph is acyclic, a
/// work-limited transitive closure populates the relation map queried by
/// [`PrecedenceRelations::get_offset`]. Negative offsets are refused here since they admit cycles
/// even over an acyclic variable graph; the propagator handles them fine during search.
#[derive(Default, Debug)]
pub struct PrecedenceRelations {
    is_built: bool,
    is_dag: bool,
    num_nodes: usize,
    /// Both the relation and its negation companion are stored; sorted by tail once built.
    arcs: Vec<Relation>,
    /// At index i, the position in `arcs` where the arcs of node i start; built lazily.
    first_arc: Vec<usize>,
    topological_order: Vec<IntegerVariable>,
    /// For an ordered pair `(a, b)`, the largest known offset such that `a + offset <= b`.
    all_relations: HashMap<(IntegerVariable, IntegerVariable), i32>,
}

#[derive(Clone, Copy, Debug)]
struct Relation {
    tail: IntegerVariable,
    head: IntegerVariable,
    offset: i32,
}

impl PrecedenceRelations {
    /// Records the relation `tail + offset <= head` together with its negation companion.
    ///
    /// Relations that are trivially satisfied by the current domains, self-loops after
    /// normalisation, and negative offsets are ignored. Additions after the store has been built
    /// are rejected.
    pub fn add(
        &mut self,
        integer_trail: &IntegerTrail,
        tail: IntegerVariable,
        head: IntegerVariable,
        offset: i32,
    ) -> Result<(), ConstraintOperationError> {
        if self.is_built {
            return Err(ConstraintOperationError::RelationAddedAfterBuild);
        }

        if integer_trail.upper_bound(tail) as i64 + offset as i64
            <= integer_trail.lower_bound(head) as i64
        {
            return Ok(());
        }
        if tail.positive_variable() == head.positive_variable() {
            return Ok(());
        }
        if offset < 0 {
            return Ok(());
        }

        self.arcs.push(Relation { tail, head, offset });
        self.arcs.push(Relation {
            tail: head.negation(),
            head: tail.negation(),
            offset,
        });
        let used = tail.index().max(tail.negation().index());
        let used = used.max(head.index()).max(head.negation().index());
        self.num_nodes = self.num_nodes.max(used + 1);
        Ok(())
    }

    /// Whether the relation graph was acyclic when built. Builds the store if necessary.
    pub fn is_dag(&mut self) -> bool {
        self.build();
        self.is_dag
    }

    /// The stable topological order of the variables; partial if the graph had a cycle.
    pub fn topological_order(&self) -> &[IntegerVariable] {
        &self.topological_order
    }

    /// The largest known offset such that `tail + offset <= head`, if any. Builds the store if
    /// necessary. The closure is work-limited, so a missing relation does not imply that no path
    /// exists.
    pub fn get_offset(
        &mut self,
        tail: IntegerVariable,
        head: IntegerVariable,
    ) -> Option<i32> {
        self.build();
        self.all_relations.get(&(tail, head)).copied()
    }

    /// Finalises the store. Called lazily by the first query.
    pub fn build(&mut self) {
        if self.is_built {
            return;
        }
        self.is_built = true;

        // Arcs are grouped by tail; the stable sort keeps insertion order within a group.
        self.arcs.sort_by_key(|relation| relation.tail);
        self.first_arc = vec![0; self.num_nodes + 1];
        for relation in &self.arcs {
            self.first_arc[relation.tail.index() + 1] += 1;
        }
        for node in 0..self.num_nodes {
            self.first_arc[node + 1] += self.first_arc[node];
        }

        // A stable topological order: among the ready nodes, the smallest index goes first.
        let mut in_degree = vec![0_usize; self.num_nodes];
        for relation in &self.arcs {
            in_degree[relation.head.index()] += 1;
        }
        let mut ready: BinaryHeap<Reverse<usize>> = (0..self.num_nodes)
            .filter(|&node| in_degree[node] == 0)
            .map(Reverse)
            .collect();
        self.topological_order.clear();
        while let Some(Reverse(node)) = ready.pop() {
            let var = IntegerVariable::create_from_index(node);
            self.topological_order.push(var);
            for relation in &self.arcs[self.first_arc[node]..self.first_arc[node + 1]] {
                in_degree[relation.head.index()] -= 1;
                if in_degree[relation.head.index()] == 0 {
                    ready.push(Reverse(relation.head.index()));
                }
            }
        }
        self.is_dag = self.topological_order.len() == self.num_nodes;
        if !self.is_dag {
            return;
        }

        // Work-limited transitive closure over the topological order. Insertion takes the maximum
        // offset on collision; `before[b]` lists the variables recorded as predecessors of b.
        let mut work: u64 = 0;
        let mut before: Vec<Vec<IntegerVariable>> = vec![vec![]; self.num_nodes];

        fn insert(
            all_relations: &mut HashMap<(IntegerVariable, IntegerVariable), i32>,
            before: &mut [Vec<IntegerVariable>],
            a: IntegerVariable,
            b: IntegerVariable,
            offset: i32,
        ) {
            match all_relations.entry((a, b)) {
                std::collections::hash_map::Entry::Vacant(entry) => {
                    let _ = entry.insert(offset);
                    before[b.index()].push(a);
                }
                std::collections::hash_map::Entry::Occupied(mut entry) => {
                    let stored = entry.get_mut();
                    *stored = (*stored).max(offset);
                }
            }
        }

        'outer: for position in 0..self.topological_order.len() {
            let tail_var = self.topological_order[position];
            work += 1;
            if work > CLOSURE_WORK_LIMIT {
                break;
            }
            let arc_range = self.first_arc[tail_var.index()]..self.first_arc[tail_var.index() + 1];
            for arc in arc_range {
                let head_var = self.arcs[arc].head;
                let arc_offset = self.arcs[arc].offset;
                quince_assert_eq_simple!(tail_var, self.arcs[arc].tail);

                work += 1;
                if work > CLOSURE_WORK_LIMIT {
                    break 'outer;
                }
                insert(&mut self.all_relations, &mut before, tail_var, head_var, arc_offset);
                insert(
                    &mut self.all_relations,
                    &mut before,
                    head_var.negation(),
                    tail_var.negation(),
                    arc_offset,
                );

                for position_before in 0..before[tail_var.index()].len() {
                    work += 1;
                    if work > CLOSURE_WORK_LIMIT {
                        break 'outer;
                    }
                    let before_var = before[tail_var.index()][position_before];
                    let offset = self.all_relations[&(before_var, tail_var)] + arc_offset;
                    insert(&mut self.all_relations, &mut before, before_var, head_var, offset);
                    insert(
                        &mut self.all_relations,
                        &mut before,
                        head_var.negation(),
                        before_var.negation(),
                        offset,
                    );
                }
            }
        }

        debug!(
            "precedence closure: work={} relations={}",
            work,
            self.all_relations.len()
        );
    }

    /// For each variable preceded by at least two of `vars`, emits the indices of the preceding
    /// variables together with the largest known offsets. Records are only emitted for heads whose
    /// predecessor set is not already covered by a single intermediate predecessor.
    pub fn compute_full_precedences(
        &mut self,
        vars: &[IntegerVariable],
        output: &mut Vec<FullIntegerPrecedence>,
    ) {
        output.clear();
        self.build();
        if !self.is_dag {
            return;
        }

        debug!(
            "full precedences: num_nodes={} num_arcs={}",
            self.num_nodes,
            self.arcs.len()
        );

        let to_consider: HashSet<IntegerVariable> = vars.iter().copied().collect();
        let mut is_interesting: HashSet<IntegerVariable> = HashSet::default();
        let mut vars_before_with_offset: HashMap<
            IntegerVariable,
            HashMap<IntegerVariable, i32>,
        > = HashMap::default();

        for position in 0..self.topological_order.len() {
            let tail_var = self.topological_order[position];
            if !to_consider.contains(&tail_var) && !vars_before_with_offset.contains_key(&tail_var)
            {
                continue;
            }

            // The data for tail_var is copied out because entries for the heads are created while
            // it is still being read.
            let tail_map: HashMap<IntegerVariable, i32> = vars_before_with_offset
                .get(&tail_var)
                .cloned()
                .unwrap_or_default();

            let arc_range = self.first_arc[tail_var.index()]..self.first_arc[tail_var.index() + 1];
            for arc in arc_range {
                let head_var = self.arcs[arc].head;
                let arc_offset = self.arcs[arc].offset;

                // No need to create an empty entry in this case.
                if tail_map.is_empty() && !to_consider.contains(&tail_var) {
                    continue;
                }

                let to_update = vars_before_with_offset.entry(head_var).or_default();
                for (&var_before, &offset) in &tail_map {
                    let merged = to_update.entry(var_before).or_insert(arc_offset + offset);
                    *merged = (*merged).max(arc_offset + offset);
                }
                if to_consider.contains(&tail_var) {
                    let merged = to_update.entry(tail_var).or_insert(arc_offset);
                    *merged = (*merged).max(arc_offset);
                }

                // Filtering heuristic: the head is only interesting if its predecessor list holds
                // something that is not already a predecessor of the tail.
                if to_update.len() > tail_map.len() {
                    let _ = is_interesting.insert(head_var);
                } else {
                    let _ = is_interesting.remove(&head_var);
                }
            }

            // Extract the output for tail_var. Because of the topological ordering, the data for
            // tail_var is already final now.
            if !is_interesting.contains(&tail_var) {
                continue;
            }
            if tail_map.len() == 1 {
                continue;
            }

            let mut data = FullIntegerPrecedence {
                var: tail_var,
                indices: vec![],
                offsets: vec![],
            };
            for (index, var) in vars.iter().enumerate() {
                if let Some(&offset) = tail_map.get(var) {
                    data.indices.push(index);
                    data.offsets.push(offset);
                }
            }
            output.push(data);
        }
    }
}
