use crate::basic_types::Literal;

/// The outcome of probing a single decision through
/// [`SatProbingSolver::enqueue_decision_and_backtrack_on_conflict`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The decision was enqueued and propagation finished without conflict.
    Feasible,
    /// The model is unsatisfiable at the root level.
    Infeasible,
    /// The decisions taken so far are incompatible; a core is available through
    /// [`SatProbingSolver::get_last_incompatible_decisions`].
    AssumptionsUnsat,
}

/// The surface of a SAT solver required by the probing-based extraction of
/// greater-than-at-least-one-of structure. Implementations are expected to be live solvers: the
/// extractor enqueues assumption-style decisions and reads back conflict cores.
pub trait SatProbingSolver {
    /// Undo all decisions, restoring the root decision level.
    fn backtrack_to_root(&mut self);

    /// Whether unsatisfiability of the whole model has been established.
    fn model_is_unsat(&self) -> bool;

    fn num_propositional_variables(&self) -> u32;

    fn literal_is_false(&self, literal: Literal) -> bool;

    /// Enqueues the decision and propagates. When propagation conflicts, the solver backtracks on
    /// its own and reports how far the conflict reaches through the returned [`ProbeStatus`].
    fn enqueue_decision_and_backtrack_on_conflict(&mut self, decision: Literal) -> ProbeStatus;

    /// The subset of the taken decisions that cannot hold together. Only meaningful directly after
    /// [`ProbeStatus::AssumptionsUnsat`] was returned.
    fn get_last_incompatible_decisions(&mut self) -> Vec<Literal>;

    /// Propagates everything that is pending. Returns false if unsatisfiability was detected.
    fn finish_propagation(&mut self) -> bool;
}
