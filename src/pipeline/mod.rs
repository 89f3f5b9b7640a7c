//! # Prediction Pipeline
//!
//! The maths-score regression pipeline: wire-facing feature records, the
//! fitted preprocessor (one-hot categories + standardized numerics), the
//! linear model, training, and artifact persistence.
//!
//! Artifacts are two JSON files in the model directory:
//!
//! - `preprocessor.json` — fitted category lists and numeric mean/std
//! - `model.json` — linear model weights and bias
//!
//! [`PredictPipeline`] loads both and serves predictions; the trainer in
//! [`train`] produces them from a CSV dataset.

mod dataset;
mod features;
mod model;
mod predict;
mod preprocess;
pub mod train;

pub use dataset::{load_training_csv, parse_batch_csv, BatchRows, TrainingData};
pub use features::StudentRecord;
pub use model::LinearModel;
pub use predict::PredictPipeline;
pub use preprocess::{CategoryEncoder, Preprocessor, StandardScaler};
pub use train::{train_model, TrainParams, TrainReport};
