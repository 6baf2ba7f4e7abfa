//! # Needler Core Library
//!
//! An anytime optimizer that chooses which peptides an instrument should target during a
//! single acquisition gradient. Proteins are only counted when exactly the configured number
//! of their peptides is selected, and no instant of the gradient may have more selected
//! peptides eluting than the instrument can schedule per cycle.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Catalog`, `Peptide`, `Protein`),
//!   tabular I/O, and the satisfiability interface (`SatEngine`) together with the bundled
//!   CNF backend.
//!
//! - **[`engine`]: The Logic Core.** Configuration, catalog normalization, constraint-model
//!   construction, the ratcheting search loop and atomic persistence of the best solution.
//!
//! - **[`workflows`]: The Public API.** Ties `core` and `engine` together into a single
//!   end-to-end targeting run.

pub mod core;
pub mod engine;
pub mod workflows;
