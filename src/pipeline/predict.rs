//! Artifact loading and end-to-end prediction.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use super::features::StudentRecord;
use super::model::LinearModel;
use super::preprocess::Preprocessor;

pub const PREPROCESSOR_FILE: &str = "preprocessor.json";
pub const MODEL_FILE: &str = "model.json";

/// The serving pipeline: fitted preprocessor plus linear model.
#[derive(Debug, Clone)]
pub struct PredictPipeline {
    pub preprocessor: Preprocessor,
    pub model: LinearModel,
}

/// Metadata served by `GET /api/model`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub columns: Vec<String>,
    pub encoded_width: usize,
    pub version: String,
}

impl PredictPipeline {
    pub fn new(preprocessor: Preprocessor, model: LinearModel) -> Result<Self> {
        anyhow::ensure!(
            preprocessor.width() == model.num_features(),
            "model expects {} features but preprocessor encodes {}",
            model.num_features(),
            preprocessor.width()
        );
        Ok(Self {
            preprocessor,
            model,
        })
    }

    /// Load `preprocessor.json` and `model.json` from a model directory.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let pre_path = dir.join(PREPROCESSOR_FILE);
        let raw = std::fs::read_to_string(&pre_path)
            .with_context(|| format!("failed to read {}", pre_path.display()))?;
        let preprocessor: Preprocessor = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", pre_path.display()))?;

        let model_path = dir.join(MODEL_FILE);
        let raw = std::fs::read_to_string(&model_path)
            .with_context(|| format!("failed to read {}", model_path.display()))?;
        let model: LinearModel = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", model_path.display()))?;

        Self::new(preprocessor, model)
    }

    /// Write both artifacts into a model directory, creating it if needed.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create model dir {}", dir.display()))?;
        let pre = serde_json::to_string_pretty(&self.preprocessor)?;
        std::fs::write(dir.join(PREPROCESSOR_FILE), pre)?;
        let model = serde_json::to_string_pretty(&self.model)?;
        std::fs::write(dir.join(MODEL_FILE), model)?;
        Ok(())
    }

    /// Predict the maths score for one record.
    pub fn predict(&self, record: &StudentRecord) -> Result<f64> {
        let row = self.preprocessor.transform(record)?;
        Ok(self.model.predict_row(&row))
    }

    /// Predict rounded to two decimals, the precision served by the API.
    pub fn predict_rounded(&self, record: &StudentRecord) -> Result<f64> {
        Ok((self.predict(record)? * 100.0).round() / 100.0)
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            columns: self.preprocessor.column_names(),
            encoded_width: self.preprocessor.width(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
