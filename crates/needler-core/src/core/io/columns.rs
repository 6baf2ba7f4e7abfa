use phf::phf_map;

/// A logical column of the candidate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Accession,
    Isoform,
    Name,
    Gene,
    PeptideSequence,
    ModifiedPeptide,
    PredictedRt,
}

impl Column {
    pub const REQUIRED: [Column; 3] = [
        Column::Accession,
        Column::PeptideSequence,
        Column::PredictedRt,
    ];

    /// The header written to output tables and reported in errors.
    pub fn canonical_name(self) -> &'static str {
        match self {
            Column::Accession => "accession",
            Column::Isoform => "isoform",
            Column::Name => "name",
            Column::Gene => "gene",
            Column::PeptideSequence => "peptide_sequence",
            Column::ModifiedPeptide => "peptide",
            Column::PredictedRt => "prosit_predicted_rt_seconds",
        }
    }

    /// Every header (lowercase) accepted for this column.
    pub fn aliases(self) -> Vec<&'static str> {
        let mut aliases: Vec<_> = HEADER_ALIASES
            .entries()
            .filter(|(_, column)| **column == self)
            .map(|(alias, _)| *alias)
            .collect();
        aliases.sort_unstable();
        aliases
    }
}

static HEADER_ALIASES: phf::Map<&'static str, Column> = phf_map! {
    "accession" => Column::Accession,
    "protein_id" => Column::Accession,
    "protein" => Column::Accession,
    "isoform" => Column::Isoform,
    "name" => Column::Name,
    "protein_name" => Column::Name,
    "gene" => Column::Gene,
    "gene_name" => Column::Gene,
    "peptide_sequence" => Column::PeptideSequence,
    "peptide_id" => Column::PeptideSequence,
    "sequence" => Column::PeptideSequence,
    "peptide" => Column::ModifiedPeptide,
    "modified_sequence" => Column::ModifiedPeptide,
    "prosit_predicted_rt_seconds" => Column::PredictedRt,
    "predicted_rt_seconds" => Column::PredictedRt,
    "rt_seconds" => Column::PredictedRt,
    "rt" => Column::PredictedRt,
};

/// Maps a raw header to its logical column, ignoring case and surrounding whitespace.
pub fn lookup(header: &str) -> Option<Column> {
    HEADER_ALIASES
        .get(header.trim().to_ascii_lowercase().as_str())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_and_whitespace_insensitive() {
        assert_eq!(lookup("  Accession "), Some(Column::Accession));
        assert_eq!(lookup("PEPTIDE_SEQUENCE"), Some(Column::PeptideSequence));
        assert_eq!(lookup("unknown"), None);
    }

    #[test]
    fn peptide_header_means_modified_form() {
        assert_eq!(lookup("peptide"), Some(Column::ModifiedPeptide));
        assert_eq!(lookup("peptide_id"), Some(Column::PeptideSequence));
    }

    #[test]
    fn every_column_has_its_canonical_name_as_alias() {
        for column in [
            Column::Accession,
            Column::Isoform,
            Column::Name,
            Column::Gene,
            Column::PeptideSequence,
            Column::ModifiedPeptide,
            Column::PredictedRt,
        ] {
            assert!(column.aliases().contains(&column.canonical_name()));
        }
    }
}
