use super::csv_table::TargetRow;
use crate::core::models::catalog::CatalogRecord;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

/// Defines the interface for reading candidate tables and writing selected targets.
///
/// Implementors handle format-specific parsing and serialization; callers only deal with
/// [`CatalogRecord`] on the way in and [`TargetRow`] on the way out.
pub trait TableFormat {
    /// The error type for I/O and parsing operations.
    type Error: Error + From<io::Error>;

    /// Reads every candidate row from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if required columns are missing, a field cannot be parsed,
    /// or the underlying reader fails.
    fn read_catalog(reader: &mut impl Read) -> Result<Vec<CatalogRecord>, Self::Error>;

    /// Writes the selected target rows, header included, to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying writer fails.
    fn write_targets(rows: &[TargetRow], writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads every candidate row from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_catalog_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogRecord>, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_catalog(&mut reader)
    }
}
