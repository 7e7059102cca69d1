use crate::basic_types::IntegerVariable;

/// The atomic constraint `var >= lower_bound`.
///
/// Since every [`IntegerVariable`] lives next to its negation, an upper-bound atom `v <= b` is
/// canonically represented as `~v >= -b`; [`IntegerPredicate::lower_or_equal`] performs this
/// translation.
#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerPredicate {
    pub var: IntegerVariable,
    pub lower_bound: i32,
}

impl IntegerPredicate {
    pub fn greater_or_equal(var: IntegerVariable, lower_bound: i32) -> IntegerPredicate {
        IntegerPredicate { var, lower_bound }
    }

    pub fn lower_or_equal(var: IntegerVariable, upper_bound: i32) -> IntegerPredicate {
        IntegerPredicate {
            var: var.negation(),
            lower_bound: -upper_bound,
        }
    }
}

impl std::fmt::Display for IntegerPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.var.is_positive() {
            write!(f, "[{} >= {}]", self.var, self.lower_bound)
        } else {
            write!(
                f,
                "[{} <= {}]",
                self.var.positive_variable(),
                -self.lower_bound
            )
        }
    }
}

impl std::fmt::Debug for IntegerPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_bound_atoms_are_translated_onto_the_negation() {
        let variable = IntegerVariable::new(2);
        let atom = IntegerPredicate::lower_or_equal(variable, 7);

        assert_eq!(variable.negation(), atom.var);
        assert_eq!(-7, atom.lower_bound);
        assert_eq!("[x1 <= 7]", atom.to_string());
    }
}
