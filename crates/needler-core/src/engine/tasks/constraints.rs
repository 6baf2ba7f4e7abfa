use crate::core::models::catalog::Catalog;
use crate::core::models::ids::{PeptideId, ProteinId};
use crate::core::solver::constraint::{BoolVar, Constraint};
use crate::core::solver::engine::SatEngine;
use crate::engine::context::OptimizationContext;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use crate::engine::utils::shuffle::permute;
use rand::Rng;
use slotmap::SecondaryMap;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// Handles into the engine needed to read models and tighten the objective.
#[derive(Debug, Clone)]
pub struct TargetingModel {
    pub peptide_vars: SecondaryMap<PeptideId, BoolVar>,
    /// Member variables of every protein, in protein processing order.
    pub protein_members: Vec<(ProteinId, Vec<BoolVar>)>,
    /// One "exactly K selected" indicator per protein; their true count is the objective.
    pub objective: Vec<Constraint>,
    pub max_selectable: usize,
    pub slot_constraints: usize,
}

/// Global upper bound on selected peptides handed to the engine as a hint.
///
/// Bounded both by how many non-overlapping windows fit on the gradient times the per-cycle
/// capacity, and by how many peptides the proteins can absorb. `slack` is added on top.
pub fn max_selectable(
    gradient: (i64, i64),
    rt_width: u32,
    targets_per_cycle: usize,
    proteins: usize,
    peptides_per_protein: usize,
    slack: usize,
) -> usize {
    let (min_start, max_stop) = gradient;
    let pep_width = 1 + 2 * i64::from(rt_width);
    let gradient_seconds = (max_stop - min_start).max(0);
    let blocks = (gradient_seconds / pep_width + 1) as usize;
    let by_time = blocks.saturating_mul(targets_per_cycle);
    let by_proteins = proteins.saturating_mul(peptides_per_protein);
    by_time.min(by_proteins).saturating_add(slack)
}

/// Declares one variable per peptide and adds the full constraint model to `engine`.
///
/// Adds, in this order: the global cardinality hint, the all-or-nothing balance of every
/// protein, the initial objective bound (at least one protein targeted), and one capacity
/// constraint per distinct slot of the gradient.
#[instrument(skip_all, name = "constraint_model_task")]
pub fn run<E: SatEngine>(
    engine: &mut E,
    context: &OptimizationContext,
    rng: &mut impl Rng,
) -> Result<TargetingModel, EngineError> {
    let catalog = context.catalog;
    let model_config = &context.config.model;
    let required = model_config.peptides_per_protein;

    info!(
        peptides = catalog.peptide_order().len(),
        "Declaring peptide variables."
    );
    let mut peptide_vars = SecondaryMap::new();
    for &id in catalog.peptide_order() {
        let peptide = catalog
            .peptide(id)
            .ok_or_else(|| EngineError::Internal(format!("Peptide {id:?} missing from catalog")))?;
        peptide_vars.insert(id, engine.declare_bool(&peptide.key));
    }

    let gradient = catalog
        .gradient_bounds()
        .ok_or_else(|| EngineError::Internal("Catalog has no peptides".to_string()))?;
    let max_selectable = max_selectable(
        gradient,
        model_config.rt_width,
        model_config.targets_per_cycle,
        catalog.protein_order().len(),
        required,
        model_config.cardinality_slack,
    );
    debug!(
        max_selectable,
        "Bounding total selected peptides (including slack)."
    );
    let all_vars: Vec<BoolVar> = catalog
        .peptide_order()
        .iter()
        .filter_map(|&id| peptide_vars.get(id).copied())
        .collect();
    engine.add(Constraint::at_most(all_vars, max_selectable))?;

    info!("Assigning the protein-peptide relationship.");
    let (protein_members, objective) =
        add_protein_balance(engine, context, &peptide_vars, rng)?;

    info!("Setting initial protein target > 0.");
    engine.add(Constraint::at_least(objective.clone(), 1))?;

    info!("Assigning gradient capacity constraints.");
    let slot_constraints = add_slot_capacity(engine, context, &peptide_vars, gradient, rng)?;

    Ok(TargetingModel {
        peptide_vars,
        protein_members,
        objective,
        max_selectable,
        slot_constraints,
    })
}

fn add_protein_balance<E: SatEngine>(
    engine: &mut E,
    context: &OptimizationContext,
    peptide_vars: &SecondaryMap<PeptideId, BoolVar>,
    rng: &mut impl Rng,
) -> Result<(Vec<(ProteinId, Vec<BoolVar>)>, Vec<Constraint>), EngineError> {
    let catalog = context.catalog;
    let required = context.config.model.peptides_per_protein;
    let shuffle = context.config.ordering.shuffle;

    context.reporter.report(Progress::TaskStart {
        total_steps: catalog.protein_order().len() as u64,
    });
    let mut protein_members = Vec::with_capacity(catalog.protein_order().len());
    let mut objective = Vec::with_capacity(catalog.protein_order().len());

    for &id in catalog.protein_order() {
        let protein = catalog
            .protein(id)
            .ok_or_else(|| EngineError::Internal(format!("Protein {id:?} missing from catalog")))?;
        let mut members: Vec<BoolVar> = protein
            .peptides
            .iter()
            .map(|&pep| {
                peptide_vars.get(pep).copied().ok_or_else(|| {
                    EngineError::Internal(format!("Peptide {pep:?} has no variable"))
                })
            })
            .collect::<Result<_, _>>()?;
        permute(&mut members, shuffle, rng);

        let targeted = Constraint::exactly(members.clone(), required);
        engine.add(Constraint::or(vec![
            Constraint::exactly(members.clone(), 0),
            targeted.clone(),
        ]))?;
        objective.push(targeted);
        protein_members.push((id, members));
        context.reporter.report(Progress::TaskIncrement);
    }
    context.reporter.report(Progress::TaskFinish);
    Ok((protein_members, objective))
}

fn add_slot_capacity<E: SatEngine>(
    engine: &mut E,
    context: &OptimizationContext,
    peptide_vars: &SecondaryMap<PeptideId, BoolVar>,
    gradient: (i64, i64),
    rng: &mut impl Rng,
) -> Result<usize, EngineError> {
    let catalog = context.catalog;
    let capacity = context.config.model.targets_per_cycle;
    let shuffle = context.config.ordering.shuffle;

    let mut slots = slot_memberships(catalog, gradient, context.config.model.dedup_slots);
    debug!(slots = slots.len(), "Time slots to model.");
    permute(&mut slots, shuffle, rng);

    context.reporter.report(Progress::TaskStart {
        total_steps: slots.len() as u64,
    });
    for (_, members) in &slots {
        let mut vars: Vec<BoolVar> = members
            .iter()
            .filter_map(|&pos| {
                let id = catalog.peptide_order()[pos];
                peptide_vars.get(id).copied()
            })
            .collect();
        permute(&mut vars, shuffle, rng);
        engine.add(Constraint::at_most(vars, capacity))?;
        context.reporter.report(Progress::TaskIncrement);
    }
    context.reporter.report(Progress::TaskFinish);
    Ok(slots.len())
}

/// Peptides covering each second of the gradient, as positions in the peptide order.
///
/// Sweeps the window starts and stops once. Empty slots are skipped; with `dedup` a slot is
/// only listed when its membership differs from the previously listed one.
pub(crate) fn slot_memberships(
    catalog: &Catalog,
    gradient: (i64, i64),
    dedup: bool,
) -> Vec<(i64, Vec<usize>)> {
    let (min_start, max_stop) = gradient;
    let first = min_start.max(0);
    if max_stop < first {
        return Vec::new();
    }
    let span = (max_stop - first + 1) as usize;
    let mut starting: Vec<Vec<usize>> = vec![Vec::new(); span];
    let mut ending: Vec<Vec<usize>> = vec![Vec::new(); span];
    for (pos, &id) in catalog.peptide_order().iter().enumerate() {
        let Some(window) = catalog.window(id) else {
            continue;
        };
        if window.stop < first {
            continue;
        }
        starting[(window.start.max(first) - first) as usize].push(pos);
        ending[(window.stop - first) as usize].push(pos);
    }

    let mut slots = Vec::new();
    let mut active = BTreeSet::new();
    let mut changed = true;
    for offset in 0..span {
        for &pos in &starting[offset] {
            changed |= active.insert(pos);
        }
        if !active.is_empty() && (changed || !dedup) {
            slots.push((first + offset as i64, active.iter().copied().collect()));
            changed = false;
        }
        for &pos in &ending[offset] {
            changed |= active.remove(&pos);
        }
    }
    slots
}
