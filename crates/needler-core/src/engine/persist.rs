use crate::core::io::csv_table::{CsvTable, TableError, TargetRow};
use crate::core::io::traits::TableFormat;
use crate::core::models::catalog::Catalog;
use crate::engine::state::Selection;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error while writing '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize targets: {0}")]
    Table(#[from] TableError),
}

/// Receives every improving selection as soon as it is found.
pub trait SolutionSink {
    fn persist(&mut self, catalog: &Catalog, selection: &Selection) -> Result<(), PersistError>;
}

/// Rows whose peptide is selected and whose protein is fully targeted, in catalog row order.
pub fn project(catalog: &Catalog, selection: &Selection) -> Vec<TargetRow> {
    catalog
        .rows()
        .iter()
        .filter(|row| {
            selection.is_peptide_selected(row.peptide) && selection.is_protein_targeted(row.protein)
        })
        .filter_map(|row| {
            let protein = catalog.protein(row.protein)?;
            let peptide = catalog.peptide(row.peptide)?;
            Some(TargetRow {
                accession: protein.accession.clone(),
                isoform: protein.isoform.clone(),
                name: protein.name.clone(),
                gene: protein.gene.clone(),
                peptide_sequence: peptide.sequence.clone(),
                peptide: peptide.modified_sequence.clone(),
                prosit_predicted_rt_seconds: peptide.predicted_rt_seconds,
                rt_start: peptide.window.start,
                rt_stop: peptide.window.stop,
            })
        })
        .collect()
}

/// Writes the projection to a CSV file, replacing the previous one atomically.
///
/// The table is written to `<destination>.temp` next to the destination, synced, and
/// renamed over the destination, so readers only ever see a complete table.
#[derive(Debug, Clone)]
pub struct CsvResultWriter {
    destination: PathBuf,
}

impl CsvResultWriter {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.destination.as_os_str());
        name.push(".temp");
        PathBuf::from(name)
    }

    fn io_error(path: &Path) -> impl FnOnce(io::Error) -> PersistError + '_ {
        move |source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn write_temp(&self, rows: &[TargetRow], temp: &Path) -> Result<(), PersistError> {
        let file = File::create(temp).map_err(Self::io_error(temp))?;
        let mut writer = BufWriter::new(file);
        CsvTable::write_targets(rows, &mut writer)?;
        let file = writer
            .into_inner()
            .map_err(|e| Self::io_error(temp)(e.into_error()))?;
        file.sync_all().map_err(Self::io_error(temp))
    }
}

impl SolutionSink for CsvResultWriter {
    #[instrument(
        skip_all,
        name = "persist_solution",
        fields(protein_target = selection.protein_target())
    )]
    fn persist(&mut self, catalog: &Catalog, selection: &Selection) -> Result<(), PersistError> {
        if let Some(parent) = self.destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(Self::io_error(parent))?;
            }
        }

        let rows = project(catalog, selection);
        let temp = self.temp_path();
        if let Err(e) = self.write_temp(&rows, &temp) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
        if let Err(source) = fs::rename(&temp, &self.destination) {
            let _ = fs::remove_file(&temp);
            return Err(PersistError::Io {
                path: self.destination.clone(),
                source,
            });
        }

        debug!(
            rows = rows.len(),
            path = %self.destination.display(),
            "Persisted best selection."
        );
        Ok(())
    }
}

impl<S: SolutionSink + ?Sized> SolutionSink for &mut S {
    fn persist(&mut self, catalog: &Catalog, selection: &Selection) -> Result<(), PersistError> {
        (**self).persist(catalog, selection)
    }
}
