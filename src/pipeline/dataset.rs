//! CSV ingestion for training and batch prediction.
//!
//! The datasets involved are small enough that lines are parsed by hand;
//! none of the fitted columns contain embedded commas.

use anyhow::{bail, Context, Result};
use std::path::Path;

use super::features::{StudentRecord, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};

/// Training dataset: one record per row plus the `math_score` target.
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub records: Vec<StudentRecord>,
    pub targets: Vec<f64>,
}

impl TrainingData {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parsed batch input: the original header and data lines alongside the
/// decoded records, so report writing can echo the input columns.
#[derive(Debug, Clone)]
pub struct BatchRows {
    pub header: String,
    pub lines: Vec<String>,
    pub records: Vec<StudentRecord>,
}

impl BatchRows {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn required_column(header: &[&str], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|h| h.trim() == name)
        .with_context(|| format!("dataset is missing required column '{name}'"))
}

fn record_from_row(row: &[&str], columns: &[usize], line_no: usize) -> Result<StudentRecord> {
    let value = |slot: usize| -> Result<&str> {
        row.get(columns[slot])
            .map(|v| v.trim())
            .with_context(|| format!("line {line_no}: too few columns"))
    };
    let numeric = |slot: usize| -> Result<f64> {
        let raw = value(slot)?;
        raw.parse::<f64>()
            .with_context(|| format!("line {line_no}: could not parse '{raw}' as a score"))
    };

    Ok(StudentRecord {
        gender: value(0)?.to_string(),
        race_ethnicity: value(1)?.to_string(),
        parental_level_of_education: value(2)?.to_string(),
        lunch: value(3)?.to_string(),
        test_preparation_course: value(4)?.to_string(),
        reading_score: numeric(5)?,
        writing_score: numeric(6)?,
    })
}

/// Column indices of the seven feature columns, categorical then numeric.
fn feature_columns(header: &[&str]) -> Result<Vec<usize>> {
    CATEGORICAL_COLUMNS
        .iter()
        .chain(NUMERIC_COLUMNS.iter())
        .map(|name| required_column(header, name))
        .collect()
}

/// Load a training CSV with the feature columns and a `math_score` target.
pub fn load_training_csv<P: AsRef<Path>>(path: P) -> Result<TrainingData> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header_line = lines.next().context("dataset is empty")?;
    let header: Vec<&str> = header_line.split(',').collect();

    let columns = feature_columns(&header)?;
    let target_col = required_column(&header, "math_score")?;

    let mut records = Vec::new();
    let mut targets = Vec::new();
    for (i, line) in lines.enumerate() {
        let line_no = i + 2;
        let row: Vec<&str> = line.split(',').collect();
        records.push(record_from_row(&row, &columns, line_no)?);
        let raw = row
            .get(target_col)
            .map(|v| v.trim())
            .with_context(|| format!("line {line_no}: too few columns"))?;
        targets.push(
            raw.parse::<f64>()
                .with_context(|| format!("line {line_no}: could not parse target '{raw}'"))?,
        );
    }

    if records.is_empty() {
        bail!("dataset {} has a header but no rows", path.display());
    }
    Ok(TrainingData { records, targets })
}

/// Parse a batch prediction CSV body (feature columns only; extra columns
/// are carried through untouched).
pub fn parse_batch_csv(body: &str) -> Result<BatchRows> {
    let mut lines = body.lines().filter(|l| !l.trim().is_empty());
    let header_line = lines.next().context("batch body is empty")?;
    let header: Vec<&str> = header_line.split(',').collect();
    let columns = feature_columns(&header)?;

    let mut raw_lines = Vec::new();
    let mut records = Vec::new();
    for (i, line) in lines.enumerate() {
        let line_no = i + 2;
        let row: Vec<&str> = line.split(',').collect();
        records.push(record_from_row(&row, &columns, line_no)?);
        raw_lines.push(line.to_string());
    }

    if records.is_empty() {
        bail!("batch body has a header but no rows");
    }
    Ok(BatchRows {
        header: header_line.to_string(),
        lines: raw_lines,
        records,
    })
}
