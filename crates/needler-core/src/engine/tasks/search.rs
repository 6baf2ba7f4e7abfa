use crate::core::solver::constraint::Constraint;
use crate::core::solver::engine::{CheckResult, SatEngine};
use crate::engine::context::OptimizationContext;
use crate::engine::error::EngineError;
use crate::engine::persist::SolutionSink;
use crate::engine::progress::Progress;
use crate::engine::state::{ConvergeReason, SearchOutcome, SearchReport, SearchState, Selection};
use crate::engine::tasks::constraints::TargetingModel;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Budget pushed to the engine once the deadline has already passed, so that it returns
/// promptly and the loop can still wind down normally.
const EXPIRED_BUDGET: Duration = Duration::from_millis(1);

/// Anytime search: repeatedly asks the engine for a model, persists every strictly better
/// one, and demands at least one more targeted protein before asking again.
///
/// Stops when every protein is targeted, when a model fails to improve, when no better model
/// exists, or when the engine gives up (time budget exhausted or otherwise).
///
/// # Errors
///
/// Engine backend failures, persistence failures, and models that violate the protein
/// balance are returned as [`EngineError`].
#[instrument(skip_all, name = "search_task")]
pub fn run<E: SatEngine, S: SolutionSink>(
    engine: &mut E,
    model: &TargetingModel,
    context: &OptimizationContext,
    sink: &mut S,
) -> Result<SearchReport, EngineError> {
    let catalog = context.catalog;
    let num_proteins = model.protein_members.len();
    let mut state = SearchState::new(context.config.search.timeout);
    info!(proteins = num_proteins, "Begin model evaluation.");

    let outcome = loop {
        let budget = state
            .remaining()
            .map(|left| if left.is_zero() { EXPIRED_BUDGET } else { left });
        engine.set_timeout(budget);
        state.begin_iteration();

        match engine.check()? {
            CheckResult::Sat => {
                let selection = read_selection(engine, model, context)?;
                let protein_target = selection.protein_target();
                debug!(
                    iteration = state.iterations(),
                    protein_target,
                    peptides = selection.peptide_count(),
                    "Engine produced a model."
                );

                if protein_target <= state.best_protein_target() {
                    warn!(
                        best = state.best_protein_target(),
                        "Model did not improve on the best; stopping."
                    );
                    break SearchOutcome::Converged(ConvergeReason::Stalled);
                }

                sink.persist(catalog, &selection)?;
                state.offer(selection);
                context
                    .reporter
                    .report(Progress::Improved { protein_target });
                info!(protein_target, "New best selection persisted.");

                if protein_target == num_proteins {
                    info!("Model targets all provided proteins.");
                    break SearchOutcome::Converged(ConvergeReason::AllProteinsTargeted);
                }
                engine.add(Constraint::at_least(
                    model.objective.clone(),
                    protein_target + 1,
                ))?;
            }
            CheckResult::Unsat => {
                info!(
                    best = state.best_protein_target(),
                    "Impossible to generate a better model. Relax the constraints to target more."
                );
                break SearchOutcome::Infeasible;
            }
            CheckResult::Unknown => {
                if state.deadline_passed() {
                    error!(best = state.best_protein_target(), "Model timeout reached.");
                    break SearchOutcome::TimedOut;
                }
                error!(
                    best = state.best_protein_target(),
                    "Model generation was halted before the deadline."
                );
                break SearchOutcome::Halted;
            }
        }
    };

    let report = state.finish(outcome);
    info!(
        outcome = ?report.outcome,
        best = report.best_protein_target,
        iterations = report.iterations,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Search finished."
    );
    Ok(report)
}

/// Reads the selected peptides and fully targeted proteins out of the engine's model.
fn read_selection<E: SatEngine>(
    engine: &E,
    model: &TargetingModel,
    context: &OptimizationContext,
) -> Result<Selection, EngineError> {
    let required = context.config.model.peptides_per_protein;

    let mut peptides = HashSet::new();
    for (id, &var) in &model.peptide_vars {
        let value = engine.value(var).ok_or_else(|| {
            EngineError::Internal(format!("Engine model has no value for peptide {id:?}"))
        })?;
        if value {
            peptides.insert(id);
        }
    }

    let mut proteins = HashSet::new();
    for (protein, members) in &model.protein_members {
        let selected = members
            .iter()
            .filter(|&&var| engine.value(var) == Some(true))
            .count();
        if selected == required {
            proteins.insert(*protein);
        } else if selected != 0 {
            let accession = context
                .catalog
                .protein(*protein)
                .map_or("<unknown>", |p| p.accession.as_str());
            return Err(EngineError::Internal(format!(
                "Protein {accession} has {selected} of {required} peptides selected"
            )));
        }
    }
    Ok(Selection::new(peptides, proteins))
}
