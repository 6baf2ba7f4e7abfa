//! Utility functions for the engine module.
//!
//! Currently this is the seeded randomization shared by catalog normalization and model
//! construction.

pub mod shuffle;
