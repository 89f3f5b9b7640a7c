//! Train from CSV, persist artifacts, serve them, submit the form.

mod common;

use common::{start_service, ServiceOptions};
use scorecast::client::{FormFields, PredictFormClient, SubmitPanel};
use scorecast::pipeline::{load_training_csv, train_model, PredictPipeline, TrainParams};

/// math = 20 + 0.4 * reading + 0.3 * writing (+3 with prep completed)
fn write_dataset(path: &std::path::Path, rows: usize) {
    let mut csv = String::from(
        "gender,race_ethnicity,parental_level_of_education,lunch,test_preparation_course,math_score,reading_score,writing_score\n",
    );
    for i in 0..rows {
        let reading = 40 + (i * 3) % 55;
        let writing = 45 + (i * 7) % 50;
        let prep = if i % 4 == 0 { "completed" } else { "none" };
        let bonus = if prep == "completed" { 3.0 } else { 0.0 };
        let math = 20.0 + 0.4 * reading as f64 + 0.3 * writing as f64 + bonus;
        let gender = if i % 2 == 0 { "female" } else { "male" };
        let group = ["group A", "group B", "group C"][i % 3];
        csv.push_str(&format!(
            "{gender},{group},some college,standard,{prep},{math},{reading},{writing}\n"
        ));
    }
    std::fs::write(path, csv).unwrap();
}

#[test]
fn test_train_save_load_predict_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("stud.csv");
    write_dataset(&data_path, 240);

    let dataset = load_training_csv(&data_path).unwrap();
    let params = TrainParams {
        rounds: 300,
        learning_rate: 0.5,
        lambda: 0.001,
        valid_fraction: 0.2,
    };
    let (pipeline, report) = train_model(&dataset, &params).unwrap();
    assert!(report.r2_valid.unwrap() > 0.99, "{report:?}");

    let model_dir = dir.path().join("models");
    pipeline.save(&model_dir).unwrap();
    let loaded = PredictPipeline::load(&model_dir).unwrap();

    // Served prediction tracks the generating function.
    let record = &dataset.records[0];
    let expected = dataset.targets[0];
    let prediction = loaded.predict_rounded(record).unwrap();
    assert!(
        (prediction - expected).abs() < 1.5,
        "prediction {prediction} vs {expected}"
    );
}

#[test]
fn test_trained_model_served_through_form_client() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("stud.csv");
    write_dataset(&data_path, 240);

    let dataset = load_training_csv(&data_path).unwrap();
    let params = TrainParams {
        rounds: 300,
        learning_rate: 0.5,
        lambda: 0.001,
        valid_fraction: 0.2,
    };
    let (pipeline, _report) = train_model(&dataset, &params).unwrap();

    let service = start_service(ServiceOptions {
        pipeline: Some(pipeline),
        ..ServiceOptions::default()
    });
    let client = PredictFormClient::new(&service.base_url).unwrap();
    let mut panel = SubmitPanel::new();

    // reading 80, writing 60, no prep → 20 + 32 + 18 = 70
    let fields = FormFields::from_pairs([
        ("gender", "female"),
        ("ethnicity", "group B"),
        ("parental_level_of_education", "some college"),
        ("lunch", "standard"),
        ("test_preparation_course", "none"),
        ("reading_score", "80"),
        ("writing_score", "60"),
    ]);

    let outcome = client.submit(&fields, &mut panel).unwrap();
    assert!(outcome.success, "{outcome:?}");
    let prediction = outcome.prediction.unwrap().as_f64().unwrap();
    assert!(
        (prediction - 70.0).abs() < 2.0,
        "prediction {prediction} should be near 70"
    );
    assert!(panel.result_html().contains("Predicted"));
}

#[test]
fn test_model_info_reflects_trained_columns() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("stud.csv");
    write_dataset(&data_path, 60);

    let dataset = load_training_csv(&data_path).unwrap();
    let (pipeline, _) = train_model(&dataset, &TrainParams::default()).unwrap();

    let service = start_service(ServiceOptions {
        pipeline: Some(pipeline),
        ..ServiceOptions::default()
    });
    let resp = reqwest::blocking::get(service.url("/api/model")).unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().unwrap();
    let columns: Vec<&str> = body["model"]["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(columns[0], "gender");
    assert!(columns.contains(&"reading_score"));
}
