use super::columns::{self, Column};
use super::traits::TableFormat;
use crate::core::models::catalog::CatalogRecord;
use crate::core::models::peptide::MAX_RT_SECONDS;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::io::{self, Read, Write};
use thiserror::Error;

const RT_DECIMALS: usize = 4;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column '{column}' (accepted headers: {accepted})")]
    MissingColumn {
        column: &'static str,
        accepted: String,
    },
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: u64, kind: TableParseErrorKind },
}

#[derive(Debug, Error, PartialEq)]
pub enum TableParseErrorKind {
    #[error("Invalid number in column '{column}' (value: '{value}')")]
    InvalidFloat { column: &'static str, value: String },
    #[error("Required field '{column}' is empty")]
    MissingRequiredField { column: &'static str },
    #[error("Value {value} in column '{column}' is outside ±{limit} seconds")]
    OutOfRange {
        column: &'static str,
        value: f64,
        limit: f64,
    },
}

/// One selected target as written to the result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRow {
    pub accession: String,
    pub isoform: String,
    pub name: String,
    pub gene: String,
    pub peptide_sequence: String,
    pub peptide: String,
    #[serde(serialize_with = "fixed_precision")]
    pub prosit_predicted_rt_seconds: f64,
    pub rt_start: i64,
    pub rt_stop: i64,
}

impl TargetRow {
    pub const HEADER: [&'static str; 9] = [
        "accession",
        "isoform",
        "name",
        "gene",
        "peptide_sequence",
        "peptide",
        "prosit_predicted_rt_seconds",
        "rt_start",
        "rt_stop",
    ];
}

fn fixed_precision<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.*}", RT_DECIMALS, value))
}

/// Header positions resolved once per table.
struct ColumnLayout {
    positions: HashMap<Column, usize>,
}

impl ColumnLayout {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, TableError> {
        let mut positions = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(column) = columns::lookup(header) {
                positions.entry(column).or_insert(idx);
            }
        }

        for column in Column::REQUIRED {
            if !positions.contains_key(&column) {
                return Err(TableError::MissingColumn {
                    column: column.canonical_name(),
                    accepted: column.aliases().join(", "),
                });
            }
        }
        Ok(Self { positions })
    }

    fn field<'r>(&self, record: &'r csv::StringRecord, column: Column) -> &'r str {
        self.positions
            .get(&column)
            .and_then(|&idx| record.get(idx))
            .unwrap_or("")
    }

    fn required<'r>(
        &self,
        record: &'r csv::StringRecord,
        column: Column,
        line: u64,
    ) -> Result<&'r str, TableError> {
        let value = self.field(record, column);
        if value.is_empty() {
            return Err(TableError::Parse {
                line,
                kind: TableParseErrorKind::MissingRequiredField {
                    column: column.canonical_name(),
                },
            });
        }
        Ok(value)
    }

    fn parse(&self, record: &csv::StringRecord, line: u64) -> Result<CatalogRecord, TableError> {
        let rt_text = self.required(record, Column::PredictedRt, line)?;
        let predicted_rt_seconds = rt_text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| TableError::Parse {
                line,
                kind: TableParseErrorKind::InvalidFloat {
                    column: Column::PredictedRt.canonical_name(),
                    value: rt_text.to_string(),
                },
            })?;
        if predicted_rt_seconds.abs() > MAX_RT_SECONDS {
            return Err(TableError::Parse {
                line,
                kind: TableParseErrorKind::OutOfRange {
                    column: Column::PredictedRt.canonical_name(),
                    value: predicted_rt_seconds,
                    limit: MAX_RT_SECONDS,
                },
            });
        }

        Ok(CatalogRecord {
            accession: self.required(record, Column::Accession, line)?.to_string(),
            isoform: self.field(record, Column::Isoform).to_string(),
            name: self.field(record, Column::Name).to_string(),
            gene: self.field(record, Column::Gene).to_string(),
            peptide_sequence: self
                .required(record, Column::PeptideSequence, line)?
                .to_string(),
            peptide: self.field(record, Column::ModifiedPeptide).to_string(),
            predicted_rt_seconds,
        })
    }
}

/// Comma-separated tables with a header row.
pub struct CsvTable;

impl CsvTable {
    /// Reads a previously written result table back into memory.
    pub fn read_targets(reader: &mut impl Read) -> Result<Vec<TargetRow>, TableError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut rows = Vec::new();
        for result in csv_reader.deserialize::<TargetRow>() {
            rows.push(result?);
        }
        Ok(rows)
    }
}

impl TableFormat for CsvTable {
    type Error = TableError;

    fn read_catalog(reader: &mut impl Read) -> Result<Vec<CatalogRecord>, TableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let layout = ColumnLayout::resolve(&headers)?;

        let mut records = Vec::new();
        for (idx, result) in csv_reader.records().enumerate() {
            let record = result?;
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(idx as u64 + 2);
            records.push(layout.parse(&record, line)?);
        }
        Ok(records)
    }

    fn write_targets(rows: &[TargetRow], writer: &mut impl Write) -> Result<(), TableError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(TargetRow::HEADER)?;
        for row in rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Result<Vec<CatalogRecord>, TableError> {
        CsvTable::read_catalog(&mut text.as_bytes())
    }

    #[test]
    fn reads_required_and_optional_columns() {
        let records = read(
            "accession,isoform,name,gene,peptide_sequence,peptide,prosit_predicted_rt_seconds\n\
             P1,P1-1,Albumin,ALB,PEPTIDEK,PEPTIDEK[+8],123.4\n",
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.accession, "P1");
        assert_eq!(record.isoform, "P1-1");
        assert_eq!(record.gene, "ALB");
        assert_eq!(record.peptide, "PEPTIDEK[+8]");
        assert!((record.predicted_rt_seconds - 123.4).abs() < 1e-9);
    }

    #[test]
    fn missing_optional_columns_become_empty_strings() {
        let records = read("protein_id,sequence,rt\nP1,AAA,10\nP1,CCC,20\n").unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].isoform.is_empty());
        assert!(records[0].peptide.is_empty());
        assert_eq!(records[1].peptide_sequence, "CCC");
    }

    #[test]
    fn missing_required_column_is_reported_with_aliases() {
        let err = read("accession,peptide_sequence\nP1,AAA\n").unwrap_err();
        match err {
            TableError::MissingColumn { column, accepted } => {
                assert_eq!(column, "prosit_predicted_rt_seconds");
                assert!(accepted.contains("rt_seconds"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_retention_time_reports_line() {
        let err = read("accession,peptide_sequence,rt\nP1,AAA,10\nP1,CCC,soon\n").unwrap_err();
        match err {
            TableError::Parse { line, kind } => {
                assert_eq!(line, 3);
                assert_eq!(
                    kind,
                    TableParseErrorKind::InvalidFloat {
                        column: "prosit_predicted_rt_seconds",
                        value: "soon".to_string()
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn retention_time_beyond_one_day_is_rejected() {
        let err = read("accession,peptide_sequence,rt\nP1,AAA,1e19\nP1,CCC,20\n").unwrap_err();
        match err {
            TableError::Parse { line, kind } => {
                assert_eq!(line, 2);
                assert!(matches!(
                    kind,
                    TableParseErrorKind::OutOfRange { value, .. } if value == 1e19
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(read("accession,peptide_sequence,rt\nP1,AAA,-86400\n").is_ok());
    }

    #[test]
    fn empty_required_field_is_rejected() {
        let err = read("accession,peptide_sequence,rt\n,AAA,10\n").unwrap_err();
        assert!(matches!(
            err,
            TableError::Parse {
                kind: TableParseErrorKind::MissingRequiredField { column: "accession" },
                ..
            }
        ));
    }

    #[test]
    fn written_targets_use_fixed_precision_and_header() {
        let rows = vec![TargetRow {
            accession: "P1".into(),
            isoform: String::new(),
            name: "Albumin".into(),
            gene: "ALB".into(),
            peptide_sequence: "AAA".into(),
            peptide: "AAA".into(),
            prosit_predicted_rt_seconds: 12.5,
            rt_start: 2,
            rt_stop: 23,
        }];
        let mut buffer = Vec::new();
        CsvTable::write_targets(&rows, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), TargetRow::HEADER.join(","));
        assert_eq!(lines.next().unwrap(), "P1,,Albumin,ALB,AAA,AAA,12.5000,2,23");

        let parsed = CsvTable::read_targets(&mut text.as_bytes()).unwrap();
        assert_eq!(parsed, rows);
    }

    #[test]
    fn empty_selection_still_writes_header() {
        let mut buffer = Vec::new();
        CsvTable::write_targets(&[], &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap().trim_end(), TargetRow::HEADER.join(","));
    }
}
