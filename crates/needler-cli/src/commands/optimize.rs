use crate::cli::OptimizeArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use needler::engine::progress::ProgressReporter;
use needler::engine::state::{ConvergeReason, SearchOutcome, SearchReport};
use needler::workflows;
use tracing::{info, warn};

pub async fn run(args: OptimizeArgs) -> Result<()> {
    info!("Merging configuration from defaults, file and CLI arguments...");
    let app_config = build_config(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting targeting optimization...");
    info!(
        input = %app_config.input_path.display(),
        destination = %app_config.destination.display(),
        "Invoking the core targeting workflow..."
    );

    let result = tokio::task::block_in_place(|| {
        workflows::target::run_from_path(
            &app_config.input_path,
            &app_config.destination,
            &app_config.core_config,
            &reporter,
        )
    })?;

    info!(
        proteins = result.catalog.protein_count(),
        peptides = result.catalog.peptide_count(),
        best = result.report.best_protein_target,
        "Workflow finished."
    );
    println!(
        "{}",
        summary(&result.report, result.catalog.protein_count())
    );

    if result.report.best.is_some() {
        println!(
            "✓ Best selection written to: {}",
            app_config.destination.display()
        );
    } else {
        warn!("Search finished without any feasible selection; no result file was written.");
        println!("Warning: no feasible selection was found, no result file was written.");
    }

    Ok(())
}

fn summary(report: &SearchReport, total_proteins: usize) -> String {
    let reason = match report.outcome {
        SearchOutcome::Converged(ConvergeReason::AllProteinsTargeted) => {
            "every protein is targeted"
        }
        SearchOutcome::Converged(ConvergeReason::Stalled) => "the engine stopped improving",
        SearchOutcome::Infeasible => "no larger selection exists",
        SearchOutcome::TimedOut => "the time budget ran out",
        SearchOutcome::Halted => "the engine gave up",
    };
    format!(
        "Search finished after {} iteration(s) in {:.1}s ({}): {} of {} proteins targeted.",
        report.iterations,
        report.elapsed.as_secs_f64(),
        reason,
        report.best_protein_target,
        total_proteins
    )
}
