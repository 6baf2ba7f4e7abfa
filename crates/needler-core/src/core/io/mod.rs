//! Provides input/output functionality for candidate and result tables.
//!
//! Candidate tables are read through the [`traits::TableFormat`] interface; header aliases are
//! resolved by [`columns`]. The same format writes the projection of selected targets.

pub mod columns;
pub mod csv_table;
pub mod traits;
