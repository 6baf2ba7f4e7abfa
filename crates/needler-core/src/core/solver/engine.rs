use super::constraint::{BoolVar, Constraint};
use std::time::Duration;
use thiserror::Error;

/// Outcome of a satisfiability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckResult {
    Sat,
    Unsat,
    /// The engine could not decide within its time limit or gave up.
    Unknown,
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Solver backend failed: {0}")]
    Backend(String),
    #[error("Solver worker is no longer reachable")]
    Disconnected,
    #[error("Variable {0:?} was not declared on this engine")]
    UnknownVariable(BoolVar),
}

/// A boolean / pseudo-boolean satisfiability engine.
///
/// The constraint store is append-only: constraints added between checks stay in force for
/// every later check.
pub trait SatEngine {
    /// Declares a fresh boolean variable. The name is informational.
    fn declare_bool(&mut self, name: &str) -> BoolVar;

    /// Adds a constraint that must hold in every subsequent model.
    fn add(&mut self, constraint: Constraint) -> Result<(), SolverError>;

    /// Sets the wall-clock limit for the next call to [`SatEngine::check`]. `None` removes it.
    fn set_timeout(&mut self, timeout: Option<Duration>);

    /// Decides the current constraint store.
    fn check(&mut self) -> Result<CheckResult, SolverError>;

    /// Truth value of `var` in the model found by the last successful check.
    ///
    /// Returns `None` if the last check was not [`CheckResult::Sat`] or `var` is unknown.
    fn value(&self, var: BoolVar) -> Option<bool>;
}
