//! Boolean constraint expressions and the satisfiability engines that decide them.
//!
//! The search layer only talks to [`engine::SatEngine`]; [`varisat_backend::VarisatEngine`]
//! is the bundled implementation.

pub mod constraint;
mod encoder;
pub mod engine;
pub mod varisat_backend;
