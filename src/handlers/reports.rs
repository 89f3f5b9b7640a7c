//! `GET /reports/{id}` — download a batch prediction report.

use serde_json::Value;

use super::AppContext;
use crate::dispatcher::{HandlerRequest, HandlerResponse, HeaderVec};
use crate::ids::ReportId;

pub fn handle(ctx: &AppContext, req: &HandlerRequest) -> HandlerResponse {
    let Some(raw_id) = req.get_path_param("id") else {
        return HandlerResponse::error(404, "Report not found");
    };
    // Non-ULID ids never touch the filesystem.
    let Ok(id) = raw_id.parse::<ReportId>() else {
        return HandlerResponse::error(404, "Report not found");
    };

    let path = ctx.reports_dir.join(id.file_name());
    match std::fs::read_to_string(&path) {
        Ok(csv) => {
            let mut resp = HandlerResponse::new(200, HeaderVec::new(), Value::String(csv));
            resp.set_header("Content-Type", "text/csv".to_string());
            resp.set_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", id.file_name()),
            );
            resp
        }
        Err(_) => HandlerResponse::error(404, "Report not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{request_with_body, tiny_context};
    use std::sync::Arc;

    fn request_for(id: &str) -> HandlerRequest {
        let mut req = request_with_body("reports", None, None);
        req.path_params.push((Arc::from("id"), id.to_string()));
        req
    }

    #[test]
    fn test_download_existing_report() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = tiny_context(dir.path().to_path_buf());
        let id = ReportId::new();
        std::fs::write(dir.path().join(id.file_name()), "a,b\n1,2\n").unwrap();

        let resp = handle(&ctx, &request_for(&id.to_string()));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.get_header("content-type"), Some("text/csv"));
        assert_eq!(resp.body, Value::String("a,b\n1,2\n".to_string()));
    }

    #[test]
    fn test_unknown_report_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = tiny_context(dir.path().to_path_buf());
        let resp = handle(&ctx, &request_for(&ReportId::new().to_string()));
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn test_traversal_id_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = tiny_context(dir.path().to_path_buf());
        let resp = handle(&ctx, &request_for("../secret"));
        assert_eq!(resp.status, 404);
    }
}
