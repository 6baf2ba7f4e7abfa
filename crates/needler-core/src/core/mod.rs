//! # Core Module
//!
//! Stateless building blocks of the targeting optimizer.
//!
//! - **Catalog Representation** ([`models`]) - Peptides, proteins and elution windows
//! - **Tabular I/O** ([`io`]) - Reading candidate tables and writing selected targets
//! - **Satisfiability Interface** ([`solver`]) - Constraint expressions, the `SatEngine`
//!   trait and the bundled CNF backend

pub mod io;
pub mod models;
pub mod solver;
