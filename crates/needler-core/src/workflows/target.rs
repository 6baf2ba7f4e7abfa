use crate::core::io::csv_table::CsvTable;
use crate::core::io::traits::TableFormat;
use crate::core::models::catalog::{Catalog, CatalogRecord};
use crate::core::solver::engine::SatEngine;
use crate::core::solver::varisat_backend::VarisatEngine;
use crate::engine::config::TargetingConfig;
use crate::engine::context::OptimizationContext;
use crate::engine::error::{EngineError, InputError};
use crate::engine::persist::{CsvResultWriter, SolutionSink};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::SearchReport;
use crate::engine::tasks;
use crate::engine::utils::shuffle::seeded_rng;
use std::path::Path;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone)]
pub struct TargetingResult {
    /// The normalized catalog the search ran on.
    pub catalog: Catalog,
    pub report: SearchReport,
}

/// Runs a complete targeting optimization over already loaded candidate rows.
///
/// Every improving selection is passed to `sink` as soon as it is found, so the sink always
/// holds the best selection known at that moment, even if the run is interrupted later.
///
/// # Errors
///
/// Returns [`WorkflowError::Input`] if the rows cannot be normalized and
/// [`WorkflowError::Engine`] for engine or persistence failures. Infeasibility and timeouts
/// are reported through [`SearchReport::outcome`], not as errors.
#[instrument(skip_all, name = "targeting_workflow")]
pub fn run<E: SatEngine, S: SolutionSink>(
    records: Vec<CatalogRecord>,
    config: &TargetingConfig,
    engine: &mut E,
    sink: &mut S,
    reporter: &ProgressReporter,
) -> Result<TargetingResult, WorkflowError> {
    let mut rng = seeded_rng(config.ordering.seed);

    // === Phase 1: Normalize the catalog ===
    reporter.report(Progress::PhaseStart {
        name: "Normalizing Catalog",
    });
    let catalog = tasks::normalize::run(records, config, &mut rng)?;
    info!(
        proteins = catalog.protein_count(),
        peptides = catalog.peptide_count(),
        "Catalog ready."
    );
    reporter.report(Progress::PhaseFinish);

    let context = OptimizationContext::new(&catalog, config, reporter);

    // === Phase 2: Build the constraint model ===
    reporter.report(Progress::PhaseStart {
        name: "Building Constraint Model",
    });
    let model = tasks::constraints::run(engine, &context, &mut rng)?;
    info!(
        slots = model.slot_constraints,
        max_selectable = model.max_selectable,
        "Constraint model built."
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Anytime search ===
    reporter.report(Progress::PhaseStart { name: "Searching" });
    let report = tasks::search::run(engine, &model, &context, sink)?;
    reporter.report(Progress::PhaseFinish);

    Ok(TargetingResult { catalog, report })
}

/// Reads the candidate table at `input`, optimizes with the bundled engine and keeps the best
/// selection in the CSV file at `destination`.
///
/// # Errors
///
/// Same as [`run`]; table read failures are reported as [`WorkflowError::Input`].
pub fn run_from_path(
    input: &Path,
    destination: &Path,
    config: &TargetingConfig,
    reporter: &ProgressReporter,
) -> Result<TargetingResult, WorkflowError> {
    reporter.report(Progress::PhaseStart {
        name: "Loading Catalog",
    });
    info!(path = %input.display(), "Loading candidate table.");
    let records = CsvTable::read_catalog_from_path(input).map_err(InputError::from)?;
    reporter.report(Progress::PhaseFinish);

    let mut engine = VarisatEngine::new().map_err(EngineError::from)?;
    let mut sink = CsvResultWriter::new(destination);
    run(records, config, &mut engine, &mut sink, reporter)
}
