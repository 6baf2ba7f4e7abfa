//! # Core Models Module
//!
//! Data structures describing the candidate catalog handed to the optimizer.
//!
//! ## Key Components
//!
//! - [`catalog`] - The normalized catalog: peptides, proteins, memberships and processing orders
//! - [`peptide`] - A targetable peptide and its elution window
//! - [`protein`] - A protein and its member peptides
//! - [`ids`] - Slot-map keys for peptides and proteins

pub mod catalog;
pub mod ids;
pub mod peptide;
pub mod protein;
