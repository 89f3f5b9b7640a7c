//! # Form Submission Client
//!
//! The client side of the prediction form: collect field values in
//! insertion order, post them as one JSON object to `/api/predict`, and
//! drive a two-state loading/result panel from the outcome.
//!
//! The flow mirrors the served form page exactly: mark the panel loading
//! and clear the previous result, send the request, parse the JSON body,
//! settle the panel, then render either the prediction or the reported
//! error (falling back to a generic message when the server gives none).
//! There is no retry and no cancellation; concurrent submissions race and
//! the last one to settle owns the panel.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Path of the prediction endpoint, relative to the service base URL.
pub const PREDICT_PATH: &str = "/api/predict";

/// Fallback error text when a failure response carries no message.
pub const FALLBACK_ERROR: &str = "Something went wrong";

/// Field values captured from the prediction form, in insertion order.
///
/// Duplicate names keep their first position and take the last value,
/// matching form-data collection into a plain key/value object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    entries: Vec<(String, String)>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = Self::new();
        for (k, v) in pairs {
            fields.set(k, v);
        }
        fields
    }

    /// Set a field. Last value wins; first insertion position is kept.
    pub fn set<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The JSON request body: one object, field order preserved.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (k, v) in &self.entries {
            map.insert(k.clone(), Value::String(v.clone()));
        }
        Value::Object(map)
    }
}

/// The prediction endpoint's response payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub prediction: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// The result surface the form submission drives: a loading flag and the
/// rendered result fragment. Mirrors the form page's loader element and
/// result container.
#[derive(Debug, Clone, Default)]
pub struct SubmitPanel {
    loading: bool,
    result_html: String,
}

impl SubmitPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the loader and clear any previously displayed result.
    pub fn begin_submission(&mut self) {
        self.loading = true;
        self.result_html.clear();
    }

    /// Hide the loader. Called once per submission, on every path.
    pub fn settle(&mut self) {
        self.loading = false;
    }

    pub fn render(&mut self, html: &str) {
        self.result_html = html.to_string();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn result_html(&self) -> &str {
        &self.result_html
    }
}

/// Render the result fragment for a parsed outcome.
pub fn render_outcome(outcome: &PredictionOutcome) -> String {
    if outcome.success {
        let shown = match &outcome.prediction {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        format!("🎯 Predicted Maths Score: <b>{shown}</b>")
    } else {
        let message = outcome
            .error
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(FALLBACK_ERROR);
        format!("❌ Error: {message}")
    }
}

/// Blocking client for the prediction form endpoint.
pub struct PredictFormClient {
    http: Client,
    endpoint: Url,
}

impl PredictFormClient {
    /// Build a client for a service base URL (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: &str) -> Result<Self> {
        let base: Url = base_url
            .parse()
            .with_context(|| format!("invalid base url '{base_url}'"))?;
        let endpoint = base
            .join(PREDICT_PATH)
            .context("failed to build predict endpoint url")?;
        Ok(Self {
            http: Client::new(),
            endpoint,
        })
    }

    /// Submit the form fields and drive the panel through
    /// loading → settled, rendering the outcome.
    ///
    /// Transport and parse failures also settle the panel and render the
    /// fallback error before propagating the underlying cause.
    pub fn submit(&self, fields: &FormFields, panel: &mut SubmitPanel) -> Result<PredictionOutcome> {
        panel.begin_submission();
        debug!(endpoint = %self.endpoint, fields = fields.len(), "submitting prediction form");

        match self.post_fields(fields) {
            Ok(outcome) => {
                panel.settle();
                panel.render(&render_outcome(&outcome));
                Ok(outcome)
            }
            Err(err) => {
                panel.settle();
                panel.render(&format!("❌ Error: {FALLBACK_ERROR}"));
                Err(err)
            }
        }
    }

    /// One POST, two suspension points: the request send and the body parse.
    fn post_fields(&self, fields: &FormFields) -> Result<PredictionOutcome> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&fields.to_json())
            .send()
            .context("prediction request failed")?;
        let outcome = response
            .json::<PredictionOutcome>()
            .context("prediction response was not valid JSON")?;
        Ok(outcome)
    }
}
