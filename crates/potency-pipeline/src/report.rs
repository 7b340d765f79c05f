//! Ranked prediction report
//!
//! Scores are paired with compound IDs in input order, then sorted by pIC50,
//! highest first. The sort is stable, so compounds with equal scores keep
//! their input order. The report exports as CSV (`Compound_ID,pIC50`), as
//! base64, or as a ready-to-embed HTML download link.

use crate::error::{PipelineError, Result};
use crate::input::MoleculeRecord;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

/// File name offered by the download link
pub const REPORT_FILE_NAME: &str = "prediction.csv";

/// Predicted potency for one compound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(rename = "Compound_ID")]
    pub compound_id: String,
    #[serde(rename = "pIC50")]
    pub score: f64,
}

/// All predictions of one run, sorted by descending pIC50
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionReport {
    results: Vec<PredictionResult>,
}

impl PredictionReport {
    /// Pair `records` with `scores` by position and rank them
    pub fn assemble(records: &[MoleculeRecord], scores: &[f64]) -> Result<Self> {
        if records.len() != scores.len() {
            return Err(PipelineError::inference(format!(
                "model returned {} score(s) for {} molecule(s)",
                scores.len(),
                records.len()
            )));
        }

        let mut results: Vec<PredictionResult> = records
            .iter()
            .zip(scores)
            .map(|(record, &score)| PredictionResult {
                compound_id: record.compound_id().to_string(),
                score,
            })
            .collect();

        // `sort_by` is stable: ties keep input order.
        results.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(Self { results })
    }

    pub fn results(&self) -> &[PredictionResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Highest-scoring compound
    pub fn top(&self) -> Option<&PredictionResult> {
        self.results.first()
    }

    /// CSV bytes with a `Compound_ID,pIC50` header
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for result in &self.results {
            writer
                .serialize(result)
                .map_err(|e| PipelineError::internal(format!("report export: {}", e)))?;
        }
        if self.results.is_empty() {
            writer
                .write_record(["Compound_ID", "pIC50"])
                .map_err(|e| PipelineError::internal(format!("report export: {}", e)))?;
        }
        writer
            .into_inner()
            .map_err(|e| PipelineError::internal(format!("report export: {}", e)))
    }

    /// Base64 of [`PredictionReport::to_csv`]
    pub fn to_base64(&self) -> Result<String> {
        Ok(STANDARD.encode(self.to_csv()?))
    }

    /// HTML anchor that downloads the report as [`REPORT_FILE_NAME`]
    pub fn download_link(&self) -> Result<String> {
        Ok(format!(
            r#"<a href="data:file/csv;base64,{}" download="{}">Download Predictions</a>"#,
            self.to_base64()?,
            REPORT_FILE_NAME
        ))
    }
}
