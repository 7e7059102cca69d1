use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConstraintOperationError {
    #[error("Adding the relation failed because the store has already been built")]
    RelationAddedAfterBuild,
}
