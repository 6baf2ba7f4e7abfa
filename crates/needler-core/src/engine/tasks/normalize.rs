use crate::core::models::catalog::{Catalog, CatalogRecord};
use crate::core::models::ids::{PeptideId, ProteinId};
use crate::core::models::peptide::{ElutionWindow, Peptide};
use crate::core::models::protein::Protein;
use crate::engine::config::TargetingConfig;
use crate::engine::error::InputError;
use crate::engine::utils::shuffle::{permute, random_keys};
use itertools::Itertools;
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Turns raw candidate rows into a [`Catalog`] ready for model construction.
///
/// Duplicate (protein, peptide) rows collapse to the first one. Proteins with fewer than
/// `peptides_per_protein` distinct peptides are dropped together with their rows. Peptides
/// are identified by sequence; the first row listing a sequence supplies its elution time and
/// modified form.
///
/// # Errors
///
/// Returns [`InputError::Empty`] for an empty table,
/// [`InputError::NoProteinsRemaining`] if the filter removes every protein, and
/// [`InputError::RetentionTimeOutOfRange`] for a kept peptide whose elution time has no
/// window.
#[instrument(skip_all, name = "normalize_task")]
pub fn run(
    records: Vec<CatalogRecord>,
    config: &TargetingConfig,
    rng: &mut impl Rng,
) -> Result<Catalog, InputError> {
    if records.is_empty() {
        return Err(InputError::Empty);
    }
    let required = config.model.peptides_per_protein;
    let shuffle = config.ordering.shuffle;

    let records: Vec<CatalogRecord> = records
        .into_iter()
        .unique_by(|r| (r.accession.clone(), r.peptide_sequence.clone()))
        .collect();
    log_summary("Input", &records);

    let peptides_per_accession = records.iter().map(|r| r.accession.as_str()).counts();
    let (mut kept, dropped): (Vec<&CatalogRecord>, Vec<&CatalogRecord>) = records
        .iter()
        .partition(|r| peptides_per_accession[r.accession.as_str()] >= required);
    if !dropped.is_empty() {
        let dropped_proteins = dropped.iter().map(|r| r.accession.as_str()).unique().count();
        info!(
            proteins = dropped_proteins,
            rows = dropped.len(),
            required,
            "Dropping proteins with insufficient available peptides."
        );
    }
    if kept.is_empty() {
        return Err(InputError::NoProteinsRemaining { required });
    }

    if shuffle {
        debug!("Shuffling row order and protein/peptide identifiers.");
    }
    permute(&mut kept, shuffle, rng);

    let mut catalog = Catalog::new();
    let mut protein_ids: HashMap<&str, ProteinId> = HashMap::new();
    let mut peptide_ids: HashMap<&str, PeptideId> = HashMap::new();
    let mut protein_order = Vec::new();
    let mut peptide_order = Vec::new();
    let mut clamped = 0usize;

    let (mut protein_keys, mut peptide_keys) = if shuffle {
        let proteins = kept.iter().map(|r| r.accession.as_str()).unique().count();
        let peptides = kept.iter().map(|r| r.peptide_sequence.as_str()).unique().count();
        (random_keys(rng, proteins), random_keys(rng, peptides))
    } else {
        (Vec::new(), Vec::new())
    };

    for record in &kept {
        let peptide = match peptide_ids.get(record.peptide_sequence.as_str()) {
            Some(&id) => id,
            None => {
                let (window, was_clamped) =
                    ElutionWindow::around(record.predicted_rt_seconds, config.model.rt_width)
                        .ok_or_else(|| InputError::RetentionTimeOutOfRange {
                            sequence: record.peptide_sequence.clone(),
                            value: record.predicted_rt_seconds,
                        })?;
                clamped += usize::from(was_clamped);
                let key = peptide_keys
                    .pop()
                    .unwrap_or_else(|| record.peptide_sequence.clone());
                let id = catalog.add_peptide(Peptide {
                    key,
                    sequence: record.peptide_sequence.clone(),
                    modified_sequence: record.peptide.clone(),
                    predicted_rt_seconds: record.predicted_rt_seconds,
                    window,
                });
                peptide_order.push(id);
                peptide_ids.insert(record.peptide_sequence.as_str(), id);
                id
            }
        };
        let protein = *protein_ids
            .entry(record.accession.as_str())
            .or_insert_with(|| {
                let key = protein_keys
                    .pop()
                    .unwrap_or_else(|| record.accession.clone());
                let id = catalog.add_protein(Protein {
                    key,
                    accession: record.accession.clone(),
                    isoform: record.isoform.clone(),
                    name: record.name.clone(),
                    gene: record.gene.clone(),
                    peptides: Vec::new(),
                });
                protein_order.push(id);
                id
            });
        catalog.link(protein, peptide);
    }

    if !shuffle {
        protein_order.sort_by_cached_key(|&id| key_of_protein(&catalog, id));
        peptide_order.sort_by_cached_key(|&id| key_of_peptide(&catalog, id));
    }
    if config.ordering.group_by_size {
        debug!("Ordering proteins by ascending peptide count.");
        protein_order.sort_by_key(|&id| catalog.protein(id).map_or(0, Protein::peptide_count));
    }

    let position: HashMap<PeptideId, usize> = peptide_order
        .iter()
        .enumerate()
        .map(|(idx, &id)| (id, idx))
        .collect();
    for &id in &protein_order {
        if let Some(protein) = catalog.protein_mut(id) {
            protein
                .peptides
                .sort_by_key(|pep| position.get(pep).copied().unwrap_or(usize::MAX));
        }
    }

    if clamped > 0 {
        info!(
            peptides = clamped,
            "Adjusting negative peptide window starts to 0."
        );
    }
    catalog.set_clamped_starts(clamped);
    catalog.set_protein_order(protein_order);
    catalog.set_peptide_order(peptide_order);

    debug!(
        proteins = catalog.protein_count(),
        peptides = catalog.peptide_count(),
        rows = catalog.rows().len(),
        "Catalog normalized."
    );
    Ok(catalog)
}

fn key_of_protein(catalog: &Catalog, id: ProteinId) -> String {
    catalog.protein(id).map(|p| p.key.clone()).unwrap_or_default()
}

fn key_of_peptide(catalog: &Catalog, id: PeptideId) -> String {
    catalog.peptide(id).map(|p| p.key.clone()).unwrap_or_default()
}

fn log_summary(stage: &str, records: &[CatalogRecord]) {
    debug!(
        stage,
        unique_proteins = records.iter().map(|r| &r.accession).unique().count(),
        unique_peptides = records.iter().map(|r| &r.peptide_sequence).unique().count(),
        "Candidate table summary."
    );
}
