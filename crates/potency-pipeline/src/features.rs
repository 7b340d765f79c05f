//! Feature schema and projection
//!
//! The model was trained on a fixed, ordered subset of descriptors. The schema
//! file lists those descriptors as the column names of a CSV header;
//! [`select`] projects a descriptor table onto exactly that column order.

use crate::descriptors::DescriptorTable;
use crate::error::{PipelineError, Result};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Ordered descriptor names the model consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(PipelineError::model_load("feature schema lists no columns"));
        }

        if let Some(dup) = first_duplicate(&columns) {
            return Err(PipelineError::model_load(format!(
                "feature schema lists '{}' more than once",
                dup
            )));
        }

        Ok(Self { columns })
    }

    /// Read the column names from the header row of a CSV document
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| PipelineError::model_load(format!("unreadable feature schema: {}", e)))?;

        Self::new(headers.iter().map(str::to_string).collect())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            PipelineError::model_load(format!(
                "cannot open feature schema {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

fn first_duplicate(columns: &[String]) -> Option<String> {
    let mut seen = HashSet::with_capacity(columns.len());
    columns.iter().find(|c| !seen.insert(c.as_str())).cloned()
}

/// Descriptor values restricted to, and ordered by, a feature schema
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// (rows, feature columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }
}

/// Project `table` onto `schema`
///
/// Fails with [`PipelineError::SchemaMismatch`] naming the first schema column
/// (in schema order) that the table does not have.
pub fn select(table: &DescriptorTable, schema: &FeatureSchema) -> Result<FeatureMatrix> {
    let indices = schema
        .columns()
        .iter()
        .map(|column| {
            table
                .column_index(column)
                .ok_or_else(|| PipelineError::SchemaMismatch {
                    column: column.clone(),
                })
        })
        .collect::<Result<Vec<usize>>>()?;

    let rows = table
        .rows()
        .iter()
        .map(|row| indices.iter().map(|&i| row[i]).collect())
        .collect();

    Ok(FeatureMatrix {
        columns: schema.columns().to_vec(),
        rows,
    })
}
