//! Linear model data structure and prediction.

use serde::{Deserialize, Serialize};

/// Linear regression model (weights + bias).
///
/// Weights are laid out one per encoded feature; the bias is stored
/// separately rather than as a trailing weight so artifacts stay readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    weights: Vec<f64>,
    bias: f64,
}

impl LinearModel {
    /// Create a model from fitted weights.
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }

    /// Create a zero-initialized model for training.
    pub fn zeros(num_features: usize) -> Self {
        Self {
            weights: vec![0.0; num_features],
            bias: 0.0,
        }
    }

    /// Number of input features.
    #[inline]
    pub fn num_features(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn weight(&self, feature: usize) -> f64 {
        self.weights[feature]
    }

    #[inline]
    pub fn set_weight(&mut self, feature: usize, value: f64) {
        self.weights[feature] = value;
    }

    #[inline]
    pub fn bias(&self) -> f64 {
        self.bias
    }

    #[inline]
    pub fn set_bias(&mut self, value: f64) {
        self.bias = value;
    }

    /// Raw access to weights (for artifact inspection).
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Predict a single encoded row: `w · x + b`.
    ///
    /// # Panics
    ///
    /// Debug-asserts that the row width matches the model.
    #[inline]
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        debug_assert_eq!(row.len(), self.weights.len(), "row width mismatch");
        self.weights
            .iter()
            .zip(row)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias
    }
}
