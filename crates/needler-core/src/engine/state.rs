use crate::core::models::ids::{PeptideId, ProteinId};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Peptides chosen by one model, with the proteins they fully target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    peptides: HashSet<PeptideId>,
    proteins: HashSet<ProteinId>,
}

impl Selection {
    pub fn new(peptides: HashSet<PeptideId>, proteins: HashSet<ProteinId>) -> Self {
        Self { peptides, proteins }
    }

    /// Number of fully targeted proteins.
    pub fn protein_target(&self) -> usize {
        self.proteins.len()
    }

    pub fn peptide_count(&self) -> usize {
        self.peptides.len()
    }

    pub fn is_peptide_selected(&self, id: PeptideId) -> bool {
        self.peptides.contains(&id)
    }

    pub fn is_protein_targeted(&self, id: ProteinId) -> bool {
        self.proteins.contains(&id)
    }

    pub fn peptides(&self) -> &HashSet<PeptideId> {
        &self.peptides
    }

    pub fn proteins(&self) -> &HashSet<ProteinId> {
        &self.proteins
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergeReason {
    /// Every protein in the catalog is targeted.
    AllProteinsTargeted,
    /// The engine returned a model that did not beat the best one.
    Stalled,
}

/// Terminal state of the search loop. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Converged(ConvergeReason),
    /// No model satisfies the constraints plus the latest objective bound.
    Infeasible,
    /// The time budget ran out before the engine decided.
    TimedOut,
    /// The engine gave up before the time budget ran out.
    Halted,
}

/// Mutable bookkeeping of the search loop: the best selection, the clock and the deadline.
#[derive(Debug)]
pub struct SearchState {
    best: Option<Selection>,
    started: Instant,
    deadline: Option<Instant>,
    iterations: usize,
}

impl SearchState {
    pub fn new(timeout: Option<Duration>) -> Self {
        let started = Instant::now();
        Self {
            best: None,
            started,
            deadline: timeout.map(|t| started + t),
            iterations: 0,
        }
    }

    /// Remaining budget; `None` when the search is unlimited.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub fn best_protein_target(&self) -> usize {
        self.best.as_ref().map_or(0, Selection::protein_target)
    }

    pub fn best(&self) -> Option<&Selection> {
        self.best.as_ref()
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub(crate) fn begin_iteration(&mut self) {
        self.iterations += 1;
    }

    /// Keeps `selection` if it beats the best so far.
    ///
    /// # Return
    ///
    /// Returns `true` if the selection became the new best.
    pub(crate) fn offer(&mut self, selection: Selection) -> bool {
        if selection.protein_target() > self.best_protein_target() {
            self.best = Some(selection);
            true
        } else {
            false
        }
    }

    pub fn finish(self, outcome: SearchOutcome) -> SearchReport {
        SearchReport {
            outcome,
            best_protein_target: self.best_protein_target(),
            iterations: self.iterations,
            elapsed: self.started.elapsed(),
            best: self.best,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub best_protein_target: usize,
    pub best: Option<Selection>,
    pub iterations: usize,
    pub elapsed: Duration,
}
