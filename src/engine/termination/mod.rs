mod indefinite;
mod time_budget;

pub use indefinite::Indefinite;
pub use time_budget::TimeBudget;

/// A condition which is polled by long-running offline passes (such as the extraction of
/// greater-than-at-least-one-of structure) to determine whether to give up with partial results.
pub trait TerminationCondition {
    /// Returns `true` when the work should stop.
    fn should_stop(&mut self) -> bool;
}
