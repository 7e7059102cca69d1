mod constraint_operation_error;
mod explanation;
pub(crate) mod hash_structures;
mod integer_predicate;
mod integer_variable;
mod keyed_vec;
mod literal;
mod propositional_variable;
mod sparse_bitset;
mod trail;

pub use constraint_operation_error::ConstraintOperationError;
pub use explanation::Explanation;
pub use explanation::PropagationStatus;
pub use integer_predicate::IntegerPredicate;
pub use integer_variable::IntegerVariable;
pub use keyed_vec::KeyedVec;
pub use keyed_vec::StorageKey;
pub use literal::Literal;
pub use propositional_variable::PropositionalVariable;
pub use sparse_bitset::SparseBitset;
pub use trail::Trail;
