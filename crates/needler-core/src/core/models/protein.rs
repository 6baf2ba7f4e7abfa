use super::ids::PeptideId;

/// A protein that is counted as targeted only when exactly the required number of its
/// peptides is selected.
#[derive(Debug, Clone, PartialEq)]
pub struct Protein {
    /// Identifier presented to the solver. Equal to the accession unless identifiers were
    /// randomized during normalization.
    pub key: String,
    pub accession: String,
    pub isoform: String,
    pub name: String,
    pub gene: String,
    /// Member peptides in peptide processing order.
    pub peptides: Vec<PeptideId>,
}

impl Protein {
    pub fn peptide_count(&self) -> usize {
        self.peptides.len()
    }
}
