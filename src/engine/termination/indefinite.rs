use super::TerminationCondition;

/// A [`TerminationCondition`] which never triggers; the work can run to completion.
#[derive(Clone, Copy, Debug)]
pub struct Indefinite;

impl TerminationCondition for Indefinite {
    fn should_stop(&mut self) -> bool {
        false
    }
}
