//! # Workflows Module
//!
//! High-level entry points that run a complete targeting optimization.
//!
//! ## Overview
//!
//! A workflow loads (or receives) the candidate rows, normalizes them, builds the constraint
//! model, runs the anytime search and persists each improvement. Callers choose the
//! satisfiability engine and the solution sink, or use the file-based convenience entry that
//! wires the bundled varisat backend to an atomic CSV writer.
//!
//! - **Targeting Workflow** ([`target`]) - Catalog to persisted peptide selection

pub mod target;
