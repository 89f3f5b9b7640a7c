//! `POST /api/batch` — CSV batch prediction.
//!
//! The request body is the CSV itself (header row plus data rows). The
//! handler predicts every row, writes a report with the input columns plus
//! a `math_prediction` column, and replies with the row count and the
//! report's download path. A row that fails to predict fails the batch.

use serde_json::json;
use tracing::{error, info};

use super::AppContext;
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::ids::ReportId;
use crate::pipeline::parse_batch_csv;

pub fn handle(ctx: &AppContext, req: &HandlerRequest) -> HandlerResponse {
    let Some(raw) = req.raw_body.as_deref() else {
        return HandlerResponse::json(
            400,
            json!({ "success": false, "error": "Request body must be CSV" }),
        );
    };

    let rows = match parse_batch_csv(raw) {
        Ok(rows) => rows,
        Err(e) => {
            return HandlerResponse::json(
                400,
                json!({ "success": false, "error": e.to_string() }),
            );
        }
    };

    let pipeline = ctx.pipeline.load();
    let mut report = String::with_capacity(raw.len() + rows.len() * 8);
    report.push_str(&rows.header);
    report.push_str(",math_prediction\n");
    for (line, record) in rows.lines.iter().zip(&rows.records) {
        match pipeline.predict_rounded(record) {
            Ok(prediction) => {
                report.push_str(line);
                report.push(',');
                report.push_str(&prediction.to_string());
                report.push('\n');
            }
            Err(e) => {
                return HandlerResponse::ok_json(
                    json!({ "success": false, "error": e.to_string() }),
                );
            }
        }
    }

    let id = ReportId::new();
    let path = ctx.reports_dir.join(id.file_name());
    let write_result = std::fs::create_dir_all(&ctx.reports_dir)
        .and_then(|_| std::fs::write(&path, report.as_bytes()));
    if let Err(e) = write_result {
        error!(request_id = %req.request_id, path = %path.display(), error = %e, "failed to write report");
        return HandlerResponse::error(500, "Failed to write report");
    }

    info!(
        request_id = %req.request_id,
        rows = rows.len(),
        report = %id,
        "batch prediction complete"
    );
    HandlerResponse::ok_json(json!({
        "success": true,
        "rows": rows.len(),
        "download": format!("/reports/{id}")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{request_with_body, tiny_context};

    const CSV: &str = "\
gender,race_ethnicity,parental_level_of_education,lunch,test_preparation_course,reading_score,writing_score
female,group B,some college,standard,none,72,74
male,group A,some college,standard,none,60,58
";

    #[test]
    fn test_batch_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = tiny_context(dir.path().to_path_buf());
        let req = request_with_body("batch", None, Some(CSV.to_string()));
        let resp = handle(&ctx, &req);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body["success"], true);
        assert_eq!(resp.body["rows"], 2);

        let download = resp.body["download"].as_str().unwrap();
        let id = download.rsplit('/').next().unwrap();
        let written =
            std::fs::read_to_string(dir.path().join(format!("{id}.csv"))).unwrap();
        assert!(written.starts_with("gender,"));
        assert!(written.lines().next().unwrap().ends_with(",math_prediction"));
        assert_eq!(written.lines().count(), 3);
        assert!(written.lines().nth(1).unwrap().ends_with(",66"));
    }

    #[test]
    fn test_missing_column_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = tiny_context(dir.path().to_path_buf());
        let req = request_with_body("batch", None, Some("gender\nfemale\n".to_string()));
        let resp = handle(&ctx, &req);
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body["success"], false);
    }

    #[test]
    fn test_unknown_category_fails_batch() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = tiny_context(dir.path().to_path_buf());
        let bad = CSV.replace("group B", "group Z");
        let req = request_with_body("batch", None, Some(bad));
        let resp = handle(&ctx, &req);
        assert_eq!(resp.body["success"], false);
        assert!(resp.body["error"].as_str().unwrap().contains("group Z"));
    }
}
