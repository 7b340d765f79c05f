//! Input normalization
//!
//! Uploads arrive either as a delimited table with a header row (`.csv`) or as
//! a headerless whitespace-separated list (`.smi`, `.txt`). Both are reduced to
//! an ordered list of [`MoleculeRecord`]s, SMILES first and compound ID second.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fields every input row must carry
const FIELDS_PER_ROW: usize = 2;

/// One submitted compound
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoleculeRecord {
    smiles: String,
    compound_id: String,
}

impl MoleculeRecord {
    pub fn new(smiles: impl Into<String>, compound_id: impl Into<String>) -> Self {
        Self {
            smiles: smiles.into(),
            compound_id: compound_id.into(),
        }
    }

    pub fn smiles(&self) -> &str {
        &self.smiles
    }

    pub fn compound_id(&self) -> &str {
        &self.compound_id
    }
}

/// Layout of an uploaded molecule file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Comma-separated table with a header row
    Delimited,
    /// Whitespace-separated list without a header
    Whitespace,
}

impl InputFormat {
    /// Infer the format from a file name's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(InputFormat::Delimited),
            Some("smi") | Some("txt") => Ok(InputFormat::Whitespace),
            _ => Err(PipelineError::input(format!(
                "unsupported file format for '{}'; upload a CSV, SMI, or TXT file",
                path.display()
            ))),
        }
    }
}

impl std::str::FromStr for InputFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" | "delimited" => Ok(InputFormat::Delimited),
            "smi" | "txt" | "whitespace" => Ok(InputFormat::Whitespace),
            other => Err(PipelineError::input(format!(
                "unknown input format '{}'; expected csv or smi",
                other
            ))),
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Delimited => f.write_str("csv"),
            InputFormat::Whitespace => f.write_str("smi"),
        }
    }
}

/// Parse raw upload bytes into molecule records, preserving row order
///
/// Fails with [`PipelineError::InputFormat`] when any row does not carry
/// exactly two non-empty fields, when the payload is not readable text, or
/// when it contains no molecules at all.
pub fn parse_molecules(bytes: &[u8], format: InputFormat) -> Result<Vec<MoleculeRecord>> {
    let records = match format {
        InputFormat::Delimited => parse_delimited(bytes)?,
        InputFormat::Whitespace => parse_whitespace(bytes)?,
    };

    if records.is_empty() {
        return Err(PipelineError::input("no molecules found in input"));
    }

    Ok(records)
}

fn parse_delimited(bytes: &[u8]) -> Result<Vec<MoleculeRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let header_len = reader
        .headers()
        .map_err(|e| PipelineError::input(format!("unreadable CSV header: {}", e)))?
        .len();
    if header_len != FIELDS_PER_ROW {
        return Err(PipelineError::input(format!(
            "CSV header has {} column(s), expected {} (SMILES, compound ID)",
            header_len, FIELDS_PER_ROW
        )));
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| PipelineError::input(format!("unreadable CSV row: {}", e)))?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let fields: Vec<&str> = row.iter().collect();
        records.push(record_from_fields(&fields, line)?);
    }

    Ok(records)
}

fn parse_whitespace(bytes: &[u8]) -> Result<Vec<MoleculeRecord>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| PipelineError::input(format!("input is not valid UTF-8: {}", e)))?;

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            record_from_fields(&fields, idx as u64 + 1)
        })
        .collect()
}

fn record_from_fields(fields: &[&str], line: u64) -> Result<MoleculeRecord> {
    match fields {
        [smiles, compound_id] if !smiles.is_empty() && !compound_id.is_empty() => {
            Ok(MoleculeRecord::new(*smiles, *compound_id))
        },
        [_, _] => Err(PipelineError::input(format!(
            "line {} has an empty SMILES or compound ID",
            line
        ))),
        _ => Err(PipelineError::input(format!(
            "line {} has {} field(s), expected {} (SMILES, compound ID)",
            line,
            fields.len(),
            FIELDS_PER_ROW
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn ids(records: &[MoleculeRecord]) -> Vec<&str> {
        records.iter().map(|r| r.compound_id()).collect()
    }

    #[test]
    fn test_parse_csv_keeps_order() {
        let input = b"canonical_smiles,molecule_chembl_id\nCCO,mol1\nCCN,mol2\n";
        let records = parse_molecules(input, InputFormat::Delimited).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], MoleculeRecord::new("CCO", "mol1"));
        assert_eq!(ids(&records), vec!["mol1", "mol2"]);
    }

    #[test]
    fn test_parse_smi_without_header() {
        let input = b"CCO mol1\n\nc1ccccc1\tmol2\n";
        let records = parse_molecules(input, InputFormat::Whitespace).unwrap();

        assert_eq!(ids(&records), vec!["mol1", "mol2"]);
        assert_eq!(records[1].smiles(), "c1ccccc1");
    }

    #[test]
    fn test_row_with_one_field_rejected() {
        let err = parse_molecules(b"CCO mol1\nCCN\n", InputFormat::Whitespace).unwrap_err();
        assert!(matches!(err, PipelineError::InputFormat(_)));
        assert!(err.to_string().contains("line 2 has 1 field"));
    }

    #[test]
    fn test_row_with_three_fields_rejected() {
        let input = b"smiles,id\nCCO,mol1\nCCN,mol2,extra\n";
        let err = parse_molecules(input, InputFormat::Delimited).unwrap_err();
        assert!(matches!(err, PipelineError::InputFormat(_)));
        assert!(err.to_string().contains("3 field"));
    }

    #[test]
    fn test_csv_header_must_have_two_columns() {
        let err = parse_molecules(b"smiles\nCCO\n", InputFormat::Delimited).unwrap_err();
        assert!(matches!(err, PipelineError::InputFormat(_)));
    }

    #[test]
    fn test_empty_payload_rejected() {
        assert!(parse_molecules(b"", InputFormat::Whitespace).is_err());
        assert!(parse_molecules(b"smiles,id\n", InputFormat::Delimited).is_err());
    }

    #[test]
    fn test_binary_payload_rejected() {
        let err = parse_molecules(&[0xff, 0xfe, 0x00, 0x41], InputFormat::Whitespace).unwrap_err();
        assert!(matches!(err, PipelineError::InputFormat(_)));
    }

    #[test]
    fn test_empty_field_rejected() {
        let err = parse_molecules(b"smiles,id\nCCO,\n", InputFormat::Delimited).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_format_inference() {
        assert_eq!(
            InputFormat::from_path(Path::new("upload.CSV")).unwrap(),
            InputFormat::Delimited
        );
        assert_eq!(
            InputFormat::from_path(Path::new("molecules.smi")).unwrap(),
            InputFormat::Whitespace
        );
        assert_eq!(
            InputFormat::from_path(Path::new("list.txt")).unwrap(),
            InputFormat::Whitespace
        );
        assert!(InputFormat::from_path(Path::new("molecules.sdf")).is_err());
        assert!(InputFormat::from_path(Path::new("noextension")).is_err());
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("CSV".parse::<InputFormat>().unwrap(), InputFormat::Delimited);
        assert_eq!("smi".parse::<InputFormat>().unwrap(), InputFormat::Whitespace);
        assert!("xlsx".parse::<InputFormat>().is_err());
    }
}
