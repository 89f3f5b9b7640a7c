//! # Scorecast
//!
//! **Scorecast** is a student exam-score prediction service built on the
//! `may` coroutine runtime. It serves a prediction form, answers
//! `POST /api/predict` with a JSON body of form fields, and backs the
//! endpoint with a linear regression pipeline (one-hot categories +
//! standardized numerics) trained from a CSV dataset.
//!
//! ## Architecture
//!
//! - **[`server`]** — HTTP service on `may_minihttp`: request parsing,
//!   `/health` and `/metrics`, static file fallthrough, security
//!   enforcement, and response writing
//! - **[`router`]** — fixed route table with `{param}` patterns compiled
//!   to regexes
//! - **[`dispatcher`]** — coroutine-per-handler dispatch over channels
//!   with panic recovery and middleware hooks
//! - **[`handlers`]** — the API: predict, CSV batch + report download,
//!   model info, login/logout, admin stats
//! - **[`pipeline`]** — feature records, preprocessor, linear model,
//!   coordinate-descent training, JSON artifacts
//! - **[`client`]** — the form submission client: insertion-ordered field
//!   set, one JSON POST, loading/result panel
//! - **[`security`]** — API-key and session providers enforced per route
//! - **[`middleware`]** — metrics and tracing around dispatch
//! - **[`hot_reload`]** — artifact watcher swapping the serving pipeline
//! - **[`static_files`]** — form page and asset serving
//!
//! ## Quick start
//!
//! ```bash
//! # Train artifacts from a dataset
//! scorecast train --data stud.csv --out models
//!
//! # Serve the form and the API
//! scorecast serve --config config/config.yaml
//!
//! # Submit the form from the command line
//! scorecast predict \
//!   --field gender=female --field "ethnicity=group B" \
//!   --field "parental_level_of_education=bachelor's degree" \
//!   --field lunch=standard --field test_preparation_course=none \
//!   --field reading_score=72 --field writing_score=74
//! ```
//!
//! ## Runtime considerations
//!
//! Scorecast uses the `may` coroutine runtime, not tokio. Handlers run in
//! coroutines whose stack size is configured via `SCORECAST_STACK_SIZE`;
//! blocking filesystem work inside handlers is deliberate and small.

pub mod cli;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod hot_reload;
pub mod ids;
pub mod middleware;
pub mod pipeline;
pub mod router;
pub mod security;
pub mod server;
pub mod static_files;

pub use client::{FormFields, PredictFormClient, PredictionOutcome, SubmitPanel};
pub use pipeline::{PredictPipeline, StudentRecord};
pub use router::{service_routes, RouteMeta, Router};
pub use security::{SecurityProvider, SecurityRequest};
