//! Linear model training.
//!
//! Coordinate descent on the squared loss with L2 regularization. Each
//! round sweeps every feature once, updating the weight from the current
//! residuals and folding the change back into them, then refits the bias.
//! Residual bookkeeping keeps a sweep at O(rows × features).

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::{debug, info};

use super::dataset::TrainingData;
use super::features::{CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};
use super::model::LinearModel;
use super::predict::PredictPipeline;
use super::preprocess::{CategoryEncoder, Preprocessor, StandardScaler};

/// Parameters for linear training.
#[derive(Debug, Clone)]
pub struct TrainParams {
    /// Number of coordinate descent rounds.
    pub rounds: u32,
    /// Learning rate (eta). Controls step size for weight updates.
    pub learning_rate: f64,
    /// L2 regularization (lambda). Prevents large weights.
    pub lambda: f64,
    /// Fraction of rows held out for validation. Set to 0 to disable.
    pub valid_fraction: f64,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            rounds: 100,
            learning_rate: 0.5,
            lambda: 1.0,
            valid_fraction: 0.2,
        }
    }
}

/// Summary of a completed training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub rows_train: usize,
    pub rows_valid: usize,
    pub rounds: u32,
    pub rmse_train: f64,
    pub rmse_valid: Option<f64>,
    pub r2_valid: Option<f64>,
}

/// Root mean squared error.
pub fn rmse(predictions: &[f64], targets: &[f64]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t) * (p - t))
        .sum();
    (sum_sq / targets.len() as f64).sqrt()
}

/// Coefficient of determination. 1.0 is a perfect fit; a constant-target
/// set scores 1.0 only when matched exactly.
pub fn r2(predictions: &[f64], targets: &[f64]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    let mean = targets.iter().sum::<f64>() / targets.len() as f64;
    let ss_tot: f64 = targets.iter().map(|t| (t - mean) * (t - mean)).sum();
    let ss_res: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t) * (p - t))
        .sum();
    if ss_tot <= f64::EPSILON {
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Fit the preprocessor over a full dataset.
///
/// Category lists cover every row (not just the training split) so the
/// held-out rows are guaranteed to encode.
pub fn fit_preprocessor(data: &TrainingData) -> Preprocessor {
    let cat_values: Vec<(&str, Vec<&str>)> = CATEGORICAL_COLUMNS
        .iter()
        .enumerate()
        .map(|(slot, name)| {
            let values = data
                .records
                .iter()
                .map(|r| r.categorical()[slot].1)
                .collect();
            (*name, values)
        })
        .collect();

    let num_values: Vec<(&str, Vec<f64>)> = NUMERIC_COLUMNS
        .iter()
        .enumerate()
        .map(|(slot, name)| {
            let values = data.records.iter().map(|r| r.numeric()[slot].1).collect();
            (*name, values)
        })
        .collect();

    Preprocessor {
        categorical: CategoryEncoder::fit(&cat_values),
        numeric: StandardScaler::fit(&num_values),
    }
}

/// Train a pipeline on the dataset and report held-out quality.
pub fn train_model(data: &TrainingData, params: &TrainParams) -> Result<(PredictPipeline, TrainReport)> {
    if data.is_empty() {
        bail!("cannot train on an empty dataset");
    }

    let preprocessor = fit_preprocessor(data);
    let width = preprocessor.width();

    // Deterministic interleaved split: every `stride`-th row is held out.
    let stride = if params.valid_fraction > 0.0 {
        ((1.0 / params.valid_fraction).round() as usize).max(2)
    } else {
        usize::MAX
    };

    let mut train_rows: Vec<Vec<f64>> = Vec::new();
    let mut train_targets: Vec<f64> = Vec::new();
    let mut valid_rows: Vec<Vec<f64>> = Vec::new();
    let mut valid_targets: Vec<f64> = Vec::new();

    for (i, (record, target)) in data.records.iter().zip(&data.targets).enumerate() {
        let row = preprocessor.transform(record)?;
        if stride != usize::MAX && (i + 1) % stride == 0 {
            valid_rows.push(row);
            valid_targets.push(*target);
        } else {
            train_rows.push(row);
            train_targets.push(*target);
        }
    }
    if train_rows.is_empty() {
        bail!("validation split left no training rows");
    }

    info!(
        rows_train = train_rows.len(),
        rows_valid = valid_rows.len(),
        features = width,
        rounds = params.rounds,
        "training linear model"
    );

    let mut model = LinearModel::zeros(width);

    // Start from the target mean so early rounds move weights, not bias.
    let n = train_targets.len() as f64;
    model.set_bias(train_targets.iter().sum::<f64>() / n);
    let mut residuals: Vec<f64> = train_targets
        .iter()
        .map(|t| t - model.bias())
        .collect();

    // Column sums of squares are invariant across rounds.
    let mut col_sq = vec![0.0f64; width];
    for row in &train_rows {
        for (j, x) in row.iter().enumerate() {
            col_sq[j] += x * x;
        }
    }

    for round in 0..params.rounds {
        for j in 0..width {
            let denom = col_sq[j] + params.lambda;
            if denom <= f64::EPSILON {
                continue; // category never observed in the training split
            }
            let grad: f64 = train_rows
                .iter()
                .zip(&residuals)
                .map(|(row, r)| row[j] * r)
                .sum();
            let delta = params.learning_rate * (grad - params.lambda * model.weight(j)) / denom;
            if delta == 0.0 {
                continue;
            }
            model.set_weight(j, model.weight(j) + delta);
            for (row, r) in train_rows.iter().zip(residuals.iter_mut()) {
                *r -= delta * row[j];
            }
        }

        // Bias absorbs whatever mean residual the sweep left behind.
        let delta_b = params.learning_rate * residuals.iter().sum::<f64>() / n;
        if delta_b != 0.0 {
            model.set_bias(model.bias() + delta_b);
            for r in residuals.iter_mut() {
                *r -= delta_b;
            }
        }

        if round % 10 == 0 || round + 1 == params.rounds {
            let train_rmse = (residuals.iter().map(|r| r * r).sum::<f64>() / n).sqrt();
            debug!(round, rmse = train_rmse, "coordinate descent round");
        }
    }

    let rmse_train = (residuals.iter().map(|r| r * r).sum::<f64>() / n).sqrt();

    let (rmse_valid, r2_valid) = if valid_rows.is_empty() {
        (None, None)
    } else {
        let preds: Vec<f64> = valid_rows.iter().map(|row| model.predict_row(row)).collect();
        (
            Some(rmse(&preds, &valid_targets)),
            Some(r2(&preds, &valid_targets)),
        )
    };

    let report = TrainReport {
        rows_train: train_rows.len(),
        rows_valid: valid_rows.len(),
        rounds: params.rounds,
        rmse_train,
        rmse_valid,
        r2_valid,
    };

    info!(
        rmse_train = report.rmse_train,
        rmse_valid = ?report.rmse_valid,
        r2_valid = ?report.r2_valid,
        "training complete"
    );

    let pipeline = PredictPipeline::new(preprocessor, model)?;
    Ok((pipeline, report))
}
