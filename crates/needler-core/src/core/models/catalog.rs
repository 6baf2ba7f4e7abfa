use super::ids::{PeptideId, ProteinId};
use super::peptide::{ElutionWindow, Peptide};
use super::protein::Protein;
use slotmap::SlotMap;

/// One row of the candidate table as read from disk, before any normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogRecord {
    pub accession: String,
    pub isoform: String,
    pub name: String,
    pub gene: String,
    pub peptide_sequence: String,
    pub peptide: String,
    pub predicted_rt_seconds: f64,
}

/// A (protein, peptide) membership; the unit of the output projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CatalogRow {
    pub protein: ProteinId,
    pub peptide: PeptideId,
}

/// The normalized candidate catalog consumed by the constraint model.
///
/// Peptides and proteins live in slot maps; the processing orders decide in which order
/// variables are declared and constraints are emitted.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    peptides: SlotMap<PeptideId, Peptide>,
    proteins: SlotMap<ProteinId, Protein>,
    rows: Vec<CatalogRow>,
    protein_order: Vec<ProteinId>,
    peptide_order: Vec<PeptideId>,
    clamped_starts: usize,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a peptide and returns its new identifier.
    pub fn add_peptide(&mut self, peptide: Peptide) -> PeptideId {
        self.peptides.insert(peptide)
    }

    /// Adds a protein and returns its new identifier.
    pub fn add_protein(&mut self, protein: Protein) -> ProteinId {
        self.proteins.insert(protein)
    }

    /// Records that `protein` lists `peptide`.
    ///
    /// The peptide is appended to the protein's member list unless already present.
    /// Duplicate memberships are ignored.
    ///
    /// # Return
    ///
    /// Returns `false` if either identifier is unknown or the row already existed.
    pub fn link(&mut self, protein: ProteinId, peptide: PeptideId) -> bool {
        if !self.peptides.contains_key(peptide) {
            return false;
        }
        let Some(entry) = self.proteins.get_mut(protein) else {
            return false;
        };
        if entry.peptides.contains(&peptide) {
            return false;
        }
        entry.peptides.push(peptide);
        self.rows.push(CatalogRow { protein, peptide });
        true
    }

    pub fn set_protein_order(&mut self, order: Vec<ProteinId>) {
        self.protein_order = order;
    }

    pub fn set_peptide_order(&mut self, order: Vec<PeptideId>) {
        self.peptide_order = order;
    }

    pub(crate) fn set_clamped_starts(&mut self, count: usize) {
        self.clamped_starts = count;
    }

    pub(crate) fn protein_mut(&mut self, id: ProteinId) -> Option<&mut Protein> {
        self.proteins.get_mut(id)
    }

    pub fn peptide(&self, id: PeptideId) -> Option<&Peptide> {
        self.peptides.get(id)
    }

    pub fn protein(&self, id: ProteinId) -> Option<&Protein> {
        self.proteins.get(id)
    }

    pub fn peptides_iter(&self) -> impl Iterator<Item = (PeptideId, &Peptide)> {
        self.peptides.iter()
    }

    pub fn proteins_iter(&self) -> impl Iterator<Item = (ProteinId, &Protein)> {
        self.proteins.iter()
    }

    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    /// Proteins in the order their constraints are emitted.
    pub fn protein_order(&self) -> &[ProteinId] {
        &self.protein_order
    }

    /// Peptides in the order their variables are declared.
    pub fn peptide_order(&self) -> &[PeptideId] {
        &self.peptide_order
    }

    pub fn peptide_count(&self) -> usize {
        self.peptides.len()
    }

    pub fn protein_count(&self) -> usize {
        self.proteins.len()
    }

    /// Number of peptides whose window start was raised to zero.
    pub fn clamped_starts(&self) -> usize {
        self.clamped_starts
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }

    /// Returns `(min start, max stop)` over all peptide windows, or `None` if empty.
    pub fn gradient_bounds(&self) -> Option<(i64, i64)> {
        let min_start = self.peptides.values().map(|p| p.window.start).min()?;
        let max_stop = self.peptides.values().map(|p| p.window.stop).max()?;
        Some((min_start, max_stop))
    }

    /// Looks up the window of a peptide.
    pub fn window(&self, id: PeptideId) -> Option<ElutionWindow> {
        self.peptides.get(id).map(|p| p.window)
    }
}
