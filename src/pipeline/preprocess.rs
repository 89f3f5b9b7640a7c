//! Fitted feature preprocessing: one-hot category encoding and numeric
//! standardization.
//!
//! The fitted state is plain serde data so the whole preprocessor
//! round-trips through `preprocessor.json`.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::features::StudentRecord;

/// One fitted categorical column: its name and the category list observed
/// at fit time. Encoding position is the index in `categories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

/// One-hot encoder over a fixed set of categorical columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEncoder {
    pub columns: Vec<CategoricalColumn>,
}

impl CategoryEncoder {
    /// Fit category lists from raw column values. Categories keep first-seen
    /// order so encodings are stable across refits on the same data.
    pub fn fit(columns: &[(&str, Vec<&str>)]) -> Self {
        let columns = columns
            .iter()
            .map(|(name, values)| {
                let mut categories: Vec<String> = Vec::new();
                for v in values {
                    if !categories.iter().any(|c| c == v) {
                        categories.push((*v).to_string());
                    }
                }
                CategoricalColumn {
                    name: (*name).to_string(),
                    categories,
                }
            })
            .collect();
        Self { columns }
    }

    /// Total width of the one-hot block.
    pub fn width(&self) -> usize {
        self.columns.iter().map(|c| c.categories.len()).sum()
    }

    /// Append the one-hot encoding of `values` to `out`.
    ///
    /// `values` must carry one entry per fitted column, in fit order. A
    /// value outside the fitted category list is an error naming the column.
    pub fn encode_into(&self, values: &[(&str, &str)], out: &mut Vec<f64>) -> Result<()> {
        if values.len() != self.columns.len() {
            bail!(
                "expected {} categorical values, got {}",
                self.columns.len(),
                values.len()
            );
        }
        for (column, (name, value)) in self.columns.iter().zip(values) {
            if column.name != *name {
                bail!("categorical column order mismatch: expected '{}', got '{name}'", column.name);
            }
            let hit = column.categories.iter().position(|c| c == value);
            let Some(idx) = hit else {
                bail!("unknown category '{value}' for field '{name}'");
            };
            for i in 0..column.categories.len() {
                out.push(if i == idx { 1.0 } else { 0.0 });
            }
        }
        Ok(())
    }
}

/// One fitted numeric column: mean and standard deviation from fit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub mean: f64,
    pub std: f64,
}

/// Standard scaler: `(x - mean) / std` per numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub columns: Vec<NumericColumn>,
}

impl StandardScaler {
    /// Fit mean/std per column. A constant column gets `std = 1` so the
    /// transform stays finite.
    pub fn fit(columns: &[(&str, Vec<f64>)]) -> Self {
        let columns = columns
            .iter()
            .map(|(name, values)| {
                let n = values.len().max(1) as f64;
                let mean = values.iter().sum::<f64>() / n;
                let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
                let std = if var.sqrt() > f64::EPSILON { var.sqrt() } else { 1.0 };
                NumericColumn {
                    name: (*name).to_string(),
                    mean,
                    std,
                }
            })
            .collect();
        Self { columns }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Append the standardized values to `out`.
    pub fn transform_into(&self, values: &[(&str, f64)], out: &mut Vec<f64>) -> Result<()> {
        if values.len() != self.columns.len() {
            bail!(
                "expected {} numeric values, got {}",
                self.columns.len(),
                values.len()
            );
        }
        for (column, (name, value)) in self.columns.iter().zip(values) {
            if column.name != *name {
                bail!("numeric column order mismatch: expected '{}', got '{name}'", column.name);
            }
            out.push((value - column.mean) / column.std);
        }
        Ok(())
    }
}

/// The full fitted preprocessor: one-hot categories followed by
/// standardized numerics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    pub categorical: CategoryEncoder,
    pub numeric: StandardScaler,
}

impl Preprocessor {
    /// Width of the encoded feature row.
    pub fn width(&self) -> usize {
        self.categorical.width() + self.numeric.width()
    }

    /// Names of the raw input columns, categorical then numeric.
    pub fn column_names(&self) -> Vec<String> {
        self.categorical
            .columns
            .iter()
            .map(|c| c.name.clone())
            .chain(self.numeric.columns.iter().map(|c| c.name.clone()))
            .collect()
    }

    /// Encode one record into a dense feature row.
    pub fn transform(&self, record: &StudentRecord) -> Result<Vec<f64>> {
        let mut row = Vec::with_capacity(self.width());
        self.categorical.encode_into(&record.categorical(), &mut row)?;
        self.numeric.transform_into(&record.numeric(), &mut row)?;
        Ok(row)
    }
}
