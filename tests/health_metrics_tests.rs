//! `/health` and `/metrics` infrastructure endpoints.

mod common;

use common::{start_service, valid_predict_body, ServiceOptions};

#[test]
fn test_health_endpoint() {
    let service = start_service(ServiceOptions::default());
    let resp = reqwest::blocking::get(service.url("/health")).unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["status"], "ok");
}

#[test]
fn test_metrics_counts_predictions() {
    let service = start_service(ServiceOptions::default());
    let client = reqwest::blocking::Client::new();

    let resp = client
        .post(service.url("/api/predict"))
        .json(&valid_predict_body())
        .send()
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let metrics = client.get(service.url("/metrics")).send().unwrap();
    assert_eq!(metrics.status().as_u16(), 200);
    let text = metrics.text().unwrap();
    assert!(text.contains("scorecast_requests_total 1"), "{text}");
    assert!(text.contains("scorecast_predictions_total 1"), "{text}");
    assert!(text.contains("scorecast_prediction_failures_total 0"), "{text}");
    assert!(text.contains("scorecast_request_latency_seconds"), "{text}");
}

#[test]
fn test_metrics_tracks_failed_predictions() {
    let service = start_service(ServiceOptions::default());
    let client = reqwest::blocking::Client::new();

    let mut payload = valid_predict_body();
    payload["lunch"] = serde_json::json!("gourmet");
    client
        .post(service.url("/api/predict"))
        .json(&payload)
        .send()
        .unwrap();

    let text = client
        .get(service.url("/metrics"))
        .send()
        .unwrap()
        .text()
        .unwrap();
    assert!(text.contains("scorecast_prediction_failures_total 1"), "{text}");
}
