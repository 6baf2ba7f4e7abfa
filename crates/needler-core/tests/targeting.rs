use needler::core::io::csv_table::{CsvTable, TargetRow};
use needler::core::models::catalog::{Catalog, CatalogRecord};
use needler::core::solver::varisat_backend::VarisatEngine;
use needler::core::io::csv_table::{TableError, TableParseErrorKind};
use needler::engine::config::{TargetingConfig, TargetingConfigBuilder};
use needler::engine::error::InputError;
use needler::engine::persist::{CsvResultWriter, PersistError, SolutionSink};
use needler::engine::progress::ProgressReporter;
use needler::engine::state::{ConvergeReason, SearchOutcome, Selection};
use needler::workflows::target::{self, TargetingResult, WorkflowError};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn record(accession: &str, sequence: &str, rt: f64) -> CatalogRecord {
    CatalogRecord {
        accession: accession.to_string(),
        name: format!("{accession} protein"),
        peptide_sequence: sequence.to_string(),
        peptide: sequence.to_string(),
        predicted_rt_seconds: rt,
        ..Default::default()
    }
}

fn config(targets_per_cycle: usize, shuffle: bool) -> TargetingConfig {
    TargetingConfigBuilder::new()
        .targets_per_cycle(targets_per_cycle)
        .peptides_per_protein(2)
        .rt_width(5)
        .shuffle(shuffle)
        .seed(Some(42))
        .build()
        .unwrap()
}

/// Wraps the CSV writer and checks every artifact right after it is written.
struct CheckingSink {
    inner: CsvResultWriter,
    targets_per_cycle: usize,
    persisted: Vec<usize>,
}

impl CheckingSink {
    fn new(destination: &Path, targets_per_cycle: usize) -> Self {
        Self {
            inner: CsvResultWriter::new(destination),
            targets_per_cycle,
            persisted: Vec::new(),
        }
    }
}

impl SolutionSink for CheckingSink {
    fn persist(&mut self, catalog: &Catalog, selection: &Selection) -> Result<(), PersistError> {
        self.inner.persist(catalog, selection)?;
        let rows = read_rows(self.inner.destination());
        assert_artifact_invariants(&rows, 2, self.targets_per_cycle);
        assert_eq!(protein_target(&rows), selection.protein_target());
        assert!(!self.inner.temp_path().exists());
        self.persisted.push(selection.protein_target());
        Ok(())
    }
}

fn read_rows(path: &Path) -> Vec<TargetRow> {
    CsvTable::read_targets(&mut File::open(path).unwrap()).unwrap()
}

fn protein_target(rows: &[TargetRow]) -> usize {
    rows.iter()
        .map(|r| r.accession.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len()
}

/// All-or-nothing per protein and per-second capacity over the written rows.
fn assert_artifact_invariants(rows: &[TargetRow], required: usize, capacity: usize) {
    let mut per_protein: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *per_protein.entry(row.accession.as_str()).or_default() += 1;
    }
    for (accession, count) in &per_protein {
        assert_eq!(*count, required, "protein {accession} is partially targeted");
    }

    let mut windows: HashMap<&str, (i64, i64)> = HashMap::new();
    for row in rows {
        windows.insert(row.peptide_sequence.as_str(), (row.rt_start, row.rt_stop));
    }
    let last = windows.values().map(|w| w.1).max().unwrap_or(0);
    for t in 0..=last {
        let active = windows.values().filter(|(s, e)| *s <= t && t <= *e).count();
        assert!(active <= capacity, "{active} peptides active at t={t}");
    }
}

fn run_in(
    dir: &Path,
    records: Vec<CatalogRecord>,
    config: &TargetingConfig,
) -> (TargetingResult, PathBuf, Vec<usize>) {
    let destination = dir.join("targets.csv");
    let mut engine = VarisatEngine::new().unwrap();
    let mut sink = CheckingSink::new(&destination, config.model.targets_per_cycle);
    let result = target::run(
        records,
        config,
        &mut engine,
        &mut sink,
        &ProgressReporter::new(),
    )
    .unwrap();
    (result, destination, sink.persisted)
}

/// A: [0,10] [20,30]; B: [5,15] [25,35]; C: two peptides on [0,10]. Half-width 5.
fn three_protein_records() -> Vec<CatalogRecord> {
    vec![
        record("A", "AAAK", 5.0),
        record("A", "AAAR", 25.0),
        record("B", "BBBK", 10.0),
        record("B", "BBBR", 30.0),
        record("C", "CCCK", 5.0),
        record("C", "CCCR", 5.0),
    ]
}

#[test]
fn overlapping_proteins_cannot_all_be_targeted() {
    let dir = tempdir().unwrap();
    let (result, destination, persisted) =
        run_in(dir.path(), three_protein_records(), &config(2, false));

    assert_eq!(result.report.best_protein_target, 2);
    assert_eq!(result.report.outcome, SearchOutcome::Infeasible);
    assert_eq!(persisted.last(), Some(&2));

    let rows = read_rows(&destination);
    let active_at_7 = rows
        .iter()
        .filter(|r| r.rt_start <= 7 && 7 <= r.rt_stop)
        .count();
    assert!(active_at_7 <= 2);
}

#[test]
fn single_target_per_cycle_leaves_one_protein() {
    let dir = tempdir().unwrap();
    let (result, destination, _) =
        run_in(dir.path(), three_protein_records(), &config(1, false));

    assert_eq!(result.report.best_protein_target, 1);
    let rows = read_rows(&destination);
    assert!(rows.iter().filter(|r| r.rt_start <= 7 && 7 <= r.rt_stop).count() <= 1);
}

#[test]
fn protein_with_one_peptide_never_appears() {
    let dir = tempdir().unwrap();
    let mut records = three_protein_records();
    records.push(record("D", "DDDK", 100.0));
    records.push(record("D", "DDDK", 100.0));

    let (result, destination, _) = run_in(dir.path(), records, &config(2, false));

    assert!(result.catalog.proteins_iter().all(|(_, p)| p.accession != "D"));
    let rows = read_rows(&destination);
    assert!(rows.iter().all(|r| r.accession != "D" && r.peptide_sequence != "DDDK"));
}

#[test]
fn zero_capacity_is_infeasible_without_artifact() {
    let dir = tempdir().unwrap();
    let (result, destination, persisted) =
        run_in(dir.path(), three_protein_records(), &config(0, false));

    assert_eq!(result.report.outcome, SearchOutcome::Infeasible);
    assert_eq!(result.report.best_protein_target, 0);
    assert!(persisted.is_empty());
    assert!(!destination.exists());
}

#[test]
fn disjoint_proteins_are_all_targeted() {
    let dir = tempdir().unwrap();
    let records = vec![
        record("A", "AAAK", 10.0),
        record("A", "AAAR", 30.0),
        record("B", "BBBK", 50.0),
        record("B", "BBBR", 70.0),
    ];
    let (result, _, persisted) = run_in(dir.path(), records, &config(1, true));

    assert_eq!(
        result.report.outcome,
        SearchOutcome::Converged(ConvergeReason::AllProteinsTargeted)
    );
    assert_eq!(persisted.last(), Some(&2));
}

#[test]
fn absurd_elution_time_fails_before_any_artifact() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("catalog.csv");
    let destination = dir.path().join("targets.csv");
    std::fs::write(&input, "accession,peptide_sequence,rt\nP1,AAA,1e19\nP1,CCC,20\n").unwrap();

    let err = target::run_from_path(
        &input,
        &destination,
        &config(1, false),
        &ProgressReporter::new(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Input(InputError::Table(TableError::Parse {
            kind: TableParseErrorKind::OutOfRange { .. },
            ..
        }))
    ));
    assert!(!destination.exists());
}

#[test]
fn absurd_elution_time_in_memory_is_an_input_error() {
    let dir = tempdir().unwrap();
    let destination = dir.path().join("targets.csv");
    let mut engine = VarisatEngine::new().unwrap();
    let mut sink = CsvResultWriter::new(&destination);

    let err = target::run(
        vec![record("P1", "AAA", 5e10), record("P1", "CCC", 20.0)],
        &config(1, false),
        &mut engine,
        &mut sink,
        &ProgressReporter::new(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Input(InputError::RetentionTimeOutOfRange { .. })
    ));
    assert!(!destination.exists());
}

/// Brute-force optimum over every assignment of the distinct peptides.
fn exhaustive_optimum(
    records: &[CatalogRecord],
    required: usize,
    capacity: usize,
    width: i64,
) -> usize {
    let mut sequences: Vec<&str> = records
        .iter()
        .map(|r| r.peptide_sequence.as_str())
        .collect();
    sequences.sort_unstable();
    sequences.dedup();
    let index: HashMap<&str, usize> = sequences
        .iter()
        .enumerate()
        .map(|(i, s)| (*s, i))
        .collect();

    let mut windows = vec![(0i64, 0i64); sequences.len()];
    for r in records.iter().rev() {
        let center = r.predicted_rt_seconds.round() as i64;
        windows[index[r.peptide_sequence.as_str()]] = ((center - width).max(0), center + width);
    }
    let mut members: HashMap<&str, Vec<usize>> = HashMap::new();
    for r in records {
        let entry = members.entry(r.accession.as_str()).or_default();
        let idx = index[r.peptide_sequence.as_str()];
        if !entry.contains(&idx) {
            entry.push(idx);
        }
    }
    members.retain(|_, m| m.len() >= required);
    let horizon = windows.iter().map(|w| w.1).max().unwrap_or(0);

    let mut best = 0;
    for mask in 0u32..(1 << sequences.len()) {
        let selected = |i: usize| mask & (1 << i) != 0;
        let mut targeted = 0;
        let mut balanced = true;
        for m in members.values() {
            match m.iter().filter(|&&i| selected(i)).count() {
                0 => {}
                n if n == required => targeted += 1,
                _ => balanced = false,
            }
        }
        // Peptides of dropped proteins are not in the model and stay unselected.
        let in_model = |i: usize| members.values().any(|m| m.contains(&i));
        if !balanced || (0..sequences.len()).any(|i| selected(i) && !in_model(i)) {
            continue;
        }
        let fits = (0..=horizon).all(|t| {
            (0..sequences.len())
                .filter(|&i| selected(i) && windows[i].0 <= t && t <= windows[i].1)
                .count()
                <= capacity
        });
        if fits {
            best = best.max(targeted);
        }
    }
    best
}

fn random_instance(rng: &mut StdRng) -> Vec<CatalogRecord> {
    let mut records = Vec::new();
    let shared = format!("SHARED{}", rng.gen_range(0..1000));
    for p in 0..4 {
        let accession = format!("P{p}");
        for k in 0..rng.gen_range(2..=3) {
            let rt = rng.gen_range(5..80) as f64;
            records.push(record(&accession, &format!("{accession}PEP{k}"), rt));
        }
        if p < 2 {
            records.push(record(&accession, &shared, 40.0));
        }
    }
    records
}

#[test]
fn unlimited_search_reaches_the_exhaustive_optimum() {
    let mut rng = StdRng::seed_from_u64(2024);
    for round in 0..6 {
        let records = random_instance(&mut rng);
        let capacity = 1 + round % 2;
        let expected = exhaustive_optimum(&records, 2, capacity, 5);

        for shuffle in [false, true] {
            let dir = tempdir().unwrap();
            let (result, _, persisted) =
                run_in(dir.path(), records.clone(), &config(capacity, shuffle));

            assert_eq!(
                result.report.best_protein_target, expected,
                "round {round}, shuffle {shuffle}"
            );
            assert!(matches!(
                result.report.outcome,
                SearchOutcome::Infeasible
                    | SearchOutcome::Converged(ConvergeReason::AllProteinsTargeted)
            ));
            assert!(persisted.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
