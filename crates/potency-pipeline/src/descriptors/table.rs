//! Parsed descriptor engine output

use crate::error::{ExternalToolKind, PipelineError, Result};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;

/// Column holding molecule names in the engine's output
pub const NAME_COLUMN: &str = "Name";

/// Numeric descriptors per molecule, in input order
///
/// Empty cells are read as NaN; whether that is acceptable is decided by the
/// model at inference time.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorTable {
    names: Vec<String>,
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<f64>>,
}

impl DescriptorTable {
    /// Build a table from already parsed parts
    ///
    /// `rows[i]` holds the values for `names[i]`, one per entry of `columns`.
    pub fn new(names: Vec<String>, columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if names.len() != rows.len() {
            return Err(parse_error(format!(
                "{} molecule name(s) for {} row(s)",
                names.len(),
                rows.len()
            )));
        }
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(parse_error(format!(
                "row {} has {} value(s), expected {}",
                i + 1,
                row.len(),
                columns.len()
            )));
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if index.insert(column.clone(), i).is_some() {
                return Err(parse_error(format!("duplicate descriptor column '{}'", column)));
            }
        }

        Ok(Self {
            names,
            columns,
            index,
            rows,
        })
    }

    /// Parse comma-separated engine output with a header row
    ///
    /// The `Name` column (or the first column when there is none) identifies
    /// molecules; every other column must be numeric.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| parse_error(format!("unreadable header: {}", e)))?
            .clone();
        if headers.is_empty() {
            return Err(parse_error("output file is empty"));
        }

        let name_idx = headers.iter().position(|h| h == NAME_COLUMN).unwrap_or(0);
        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != name_idx)
            .map(|(_, h)| h.to_string())
            .collect();

        let mut names = Vec::new();
        let mut rows = Vec::new();
        for (row_no, record) in reader.records().enumerate() {
            let record = record.map_err(|e| parse_error(format!("row {}: {}", row_no + 1, e)))?;

            let mut values = Vec::with_capacity(columns.len());
            for (i, cell) in record.iter().enumerate() {
                if i == name_idx {
                    names.push(cell.to_string());
                } else {
                    values.push(parse_cell(cell).ok_or_else(|| {
                        parse_error(format!(
                            "row {} column '{}' is not numeric: '{}'",
                            row_no + 1,
                            &headers[i],
                            cell
                        ))
                    })?);
                }
            }
            rows.push(values);
        }

        Self::new(names, columns, rows)
    }

    /// Read and parse the engine's output file
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            parse_error(format!("cannot open output file {}: {}", path.display(), e))
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Number of molecules (rows)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (rows, descriptor columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// Molecule names as reported by the engine
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Descriptor column names, excluding the name column
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Write the table back out as CSV with a leading `Name` column
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        let to_internal = |e: csv::Error| PipelineError::internal(format!("descriptor export: {}", e));

        let header = std::iter::once(NAME_COLUMN).chain(self.columns.iter().map(String::as_str));
        writer.write_record(header).map_err(to_internal)?;

        for (name, row) in self.names.iter().zip(&self.rows) {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(name.clone());
            record.extend(row.iter().map(|v| if v.is_nan() { String::new() } else { v.to_string() }));
            writer.write_record(&record).map_err(to_internal)?;
        }

        writer
            .flush()
            .map_err(|e| PipelineError::internal(format!("descriptor export: {}", e)))
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return Some(f64::NAN);
    }
    cell.parse().ok()
}

fn parse_error(msg: impl Into<String>) -> PipelineError {
    PipelineError::external(ExternalToolKind::Parse, msg)
}
