//! `GET /api/admin/stats` — operational counters for the admin dashboard.

use serde_json::json;

use super::AppContext;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

pub fn stats(ctx: &AppContext, _req: &HandlerRequest) -> HandlerResponse {
    let (predictions, failures) = ctx.metrics.prediction_counts();
    HandlerResponse::ok_json(json!({
        "success": true,
        "stats": {
            "requests_total": ctx.metrics.request_count(),
            "average_latency_ms": ctx.metrics.average_latency().as_millis() as u64,
            "predictions_total": predictions,
            "prediction_failures_total": failures,
            "auth_failures_total": ctx.metrics.auth_failures(),
            "sessions_active": ctx.sessions.len(),
            "memory_bytes": ctx.metrics.memory_bytes(),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{request_with_body, tiny_context};

    #[test]
    fn test_stats_shape() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = tiny_context(dir.path().to_path_buf());
        let resp = stats(&ctx, &request_with_body("admin", None, None));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body["stats"]["requests_total"], 0);
        assert_eq!(resp.body["stats"]["sessions_active"], 0);
    }
}
