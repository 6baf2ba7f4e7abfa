//! Tasks that make up a targeting run.
//!
//! Each task is one step of the workflow: [`normalize`] turns raw rows into a catalog,
//! [`constraints`] translates the catalog into engine constraints, and [`search`] drives the
//! engine toward better selections, persisting each improvement.

pub mod constraints;
pub mod normalize;
pub mod search;
