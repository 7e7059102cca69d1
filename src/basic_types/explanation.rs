use itertools::Itertools;

use crate::basic_types::IntegerPredicate;
use crate::basic_types::Literal;

/// The result of invoking the precedence propagator. The propagation either reaches a fixed point
/// or identifies a conflict, in which case the necessary conditions for the conflict are captured
/// in the error variant.
pub type PropagationStatus = Result<(), Explanation>;

/// A conjunction of currently-true facts justifying a propagation or a conflict: the literals in
/// `literal_reason` together with the bound atoms in `integer_reason` imply the propagated fact
/// (or, in the conflict case, a contradiction).
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Explanation {
    pub literal_reason: Vec<Literal>,
    pub integer_reason: Vec<IntegerPredicate>,
}

impl Explanation {
    pub fn new(literal_reason: Vec<Literal>, integer_reason: Vec<IntegerPredicate>) -> Explanation {
        Explanation {
            literal_reason,
            integer_reason,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.literal_reason.is_empty() && self.integer_reason.is_empty()
    }
}

impl From<Vec<IntegerPredicate>> for Explanation {
    fn from(integer_reason: Vec<IntegerPredicate>) -> Explanation {
        Explanation {
            literal_reason: vec![],
            integer_reason,
        }
    }
}

impl std::fmt::Display for Explanation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "{{empty}}");
        }
        let literals = self.literal_reason.iter().map(|l| l.to_string());
        let atoms = self.integer_reason.iter().map(|p| p.to_string());
        write!(f, "{}", literals.chain(atoms).join("; "))
    }
}

impl std::fmt::Debug for Explanation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}
