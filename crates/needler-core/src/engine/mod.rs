//! # Engine Module
//!
//! The optimization engine of the peptide targeting optimizer.
//!
//! ## Overview
//!
//! The engine normalizes a candidate catalog, builds the constraint model on a
//! [`SatEngine`](crate::core::solver::engine::SatEngine), and runs the anytime search that
//! keeps tightening the objective until the engine can no longer improve or the time budget
//! is spent. Every improving selection is handed to a [`persist::SolutionSink`] immediately.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Model, search and ordering parameters with a validating builder
//! - **State Tracking** ([`state`]) - Best selection, deadline bookkeeping and terminal outcomes
//! - **Persistence** ([`persist`]) - Projection of a selection to result rows and atomic CSV output
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Input and engine error types

pub mod config;
pub(crate) mod context;
pub mod error;
pub mod persist;
pub mod progress;
pub mod state;
pub(crate) mod tasks;
pub(crate) mod utils;
