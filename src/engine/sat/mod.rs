mod clause_database;
mod probing;

pub use clause_database::ClauseDatabase;
pub use probing::ProbeStatus;
pub use probing::SatProbingSolver;
