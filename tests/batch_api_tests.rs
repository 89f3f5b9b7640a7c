//! CSV batch prediction and report download.

mod common;

use common::{start_service, ServiceOptions};

const BATCH_CSV: &str = "\
gender,race_ethnicity,parental_level_of_education,lunch,test_preparation_course,reading_score,writing_score
female,group B,some college,standard,none,72,74
male,group A,some college,free/reduced,completed,60,58
female,group C,bachelor's degree,standard,none,88,91
";

#[test]
fn test_batch_then_download_report() {
    let service = start_service(ServiceOptions::default());
    let client = reqwest::blocking::Client::new();

    let resp = client
        .post(service.url("/api/batch"))
        .header("Content-Type", "text/csv")
        .body(BATCH_CSV)
        .send()
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["rows"], 3);

    let download = body["download"].as_str().unwrap();
    assert!(download.starts_with("/reports/"));

    let report = client.get(service.url(download)).send().unwrap();
    assert_eq!(report.status().as_u16(), 200);
    assert_eq!(
        report.headers()["content-type"].to_str().unwrap(),
        "text/csv"
    );
    let csv = report.text().unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().ends_with(",math_prediction"));
    assert_eq!(lines.count(), 3);
    // Zero-weight test model: every row predicts the bias.
    for line in csv.lines().skip(1) {
        assert!(line.ends_with(",66"), "{line}");
    }
}

#[test]
fn test_batch_without_body_is_400() {
    let service = start_service(ServiceOptions::default());
    let client = reqwest::blocking::Client::new();

    let resp = client.post(service.url("/api/batch")).send().unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[test]
fn test_batch_with_missing_column_is_400() {
    let service = start_service(ServiceOptions::default());
    let client = reqwest::blocking::Client::new();

    let resp = client
        .post(service.url("/api/batch"))
        .body("gender,lunch\nfemale,standard\n")
        .send()
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("missing required column"));
}

#[test]
fn test_unknown_report_is_404() {
    let service = start_service(ServiceOptions::default());
    let client = reqwest::blocking::Client::new();

    // A well-formed ULID that no report was written under.
    let resp = client
        .get(service.url("/reports/01ARZ3NDEKTSV4RRFFQ69G5FAV"))
        .send()
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[test]
fn test_traversal_report_id_is_404() {
    let service = start_service(ServiceOptions::default());
    let client = reqwest::blocking::Client::new();

    let resp = client
        .get(service.url("/reports/..%2F..%2Fetc%2Fpasswd"))
        .send()
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
