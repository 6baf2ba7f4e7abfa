use thiserror::Error;

use crate::core::io::csv_table::TableError;
use crate::core::solver::engine::SolverError;
use crate::engine::persist::PersistError;

/// Failures while loading or normalizing the candidate table.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read candidate table: {0}")]
    Table(#[from] TableError),

    #[error("Candidate table contains no rows")]
    Empty,

    #[error("No protein has at least {required} distinct peptides")]
    NoProteinsRemaining { required: usize },

    #[error("Peptide {sequence} has an unusable elution time ({value} s)")]
    RetentionTimeOutOfRange { sequence: String, value: f64 },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Satisfiability engine failed: {source}")]
    Solver {
        #[from]
        source: SolverError,
    },

    #[error("Failed to persist solution: {source}")]
    Persist {
        #[from]
        source: PersistError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
