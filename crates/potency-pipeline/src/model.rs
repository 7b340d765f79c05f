//! Trained pIC50 regressor
//!
//! The artifact is a JSON document holding the number of input features and
//! an estimator. Two estimators are understood: a linear model, and a random
//! forest whose trees use the flattened node arrays common to tree-ensemble
//! exporters (`-1` marks a leaf; go left when `x[feature] <= threshold`).

use crate::error::{PipelineError, Result};
use crate::features::FeatureMatrix;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Child index marking a leaf node
const LEAF: i64 = -1;

/// A deserialized, validated model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    n_features: usize,
    estimator: Estimator,
    #[serde(skip)]
    sha256: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    RandomForest {
        trees: Vec<RegressionTree>,
    },
}

/// One regression tree in flattened node-array form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl ModelArtifact {
    pub fn new(n_features: usize, estimator: Estimator) -> Result<Self> {
        let artifact = Self {
            n_features,
            estimator,
            sha256: None,
        };
        artifact.validate().map_err(PipelineError::model_load)?;
        Ok(artifact)
    }

    /// Deserialize and validate an artifact from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes)
            .map_err(|e| PipelineError::model_load(format!("malformed model artifact: {}", e)))?;
        artifact.validate().map_err(PipelineError::model_load)?;
        Ok(artifact)
    }

    /// Read, checksum, and validate the artifact at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            PipelineError::model_load(format!(
                "cannot read model artifact {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut artifact = Self::from_json(&bytes)?;
        artifact.sha256 = Some(potency_common::checksum::sha256_bytes(&bytes));
        Ok(artifact)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    /// SHA-256 of the file the artifact was loaded from
    pub fn sha256(&self) -> Option<&str> {
        self.sha256.as_deref()
    }

    /// Predict one score per row of `matrix`, in row order
    pub fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>> {
        let (_, width) = matrix.shape();
        if width != self.n_features {
            return Err(PipelineError::inference(format!(
                "model expects {} feature(s), got {}",
                self.n_features, width
            )));
        }

        matrix
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if let Some(col) = row.iter().position(|v| !v.is_finite()) {
                    return Err(PipelineError::inference(format!(
                        "row {} feature '{}' is not a finite number",
                        i + 1,
                        matrix.columns()[col]
                    )));
                }
                Ok(self.estimator.predict_row(row))
            })
            .collect()
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.n_features == 0 {
            return Err("model declares zero input features".to_string());
        }

        match &self.estimator {
            Estimator::Linear { coefficients, .. } => {
                if coefficients.len() != self.n_features {
                    return Err(format!(
                        "linear model has {} coefficient(s) for {} feature(s)",
                        coefficients.len(),
                        self.n_features
                    ));
                }
            },
            Estimator::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err("random forest has no trees".to_string());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(self.n_features)
                        .map_err(|e| format!("tree {}: {}", i, e))?;
                }
            },
        }

        Ok(())
    }
}

impl Estimator {
    fn predict_row(&self, row: &[f64]) -> f64 {
        match self {
            Estimator::Linear {
                intercept,
                coefficients,
            } => intercept + coefficients.iter().zip(row).map(|(c, x)| c * x).sum::<f64>(),
            Estimator::RandomForest { trees } => {
                trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / trees.len() as f64
            },
        }
    }
}

impl RegressionTree {
    /// Walk from the root to a leaf; assumes [`RegressionTree::validate`] passed
    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        self.value[node]
    }

    fn validate(&self, n_features: usize) -> std::result::Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err("node arrays differ in length".to_string());
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF && right == LEAF {
                continue;
            }
            // Children always follow their parent, which also rules out cycles.
            let in_range = |child: i64| child > node as i64 && (child as usize) < n;
            if !in_range(left) || !in_range(right) {
                return Err(format!("node {} has invalid children ({}, {})", node, left, right));
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!("node {} splits on unknown feature {}", node, feature));
            }
        }

        Ok(())
    }
}
