//! `POST /api/predict` — predict one student's maths score.
//!
//! Failures the form can show inline (undecodable fields, unknown
//! categories, pipeline errors) reply 200 with `success: false`; the form
//! client reads the payload, not the status code. Only a missing or
//! non-JSON body is a 400.

use serde_json::json;
use tracing::debug;

use super::AppContext;
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::pipeline::StudentRecord;

pub fn handle(ctx: &AppContext, req: &HandlerRequest) -> HandlerResponse {
    let Some(body) = req.body.as_ref() else {
        return HandlerResponse::json(
            400,
            json!({ "success": false, "error": "Request body must be a JSON object" }),
        );
    };

    let record: StudentRecord = match serde_json::from_value(body.clone()) {
        Ok(record) => record,
        Err(e) => {
            return HandlerResponse::ok_json(json!({ "success": false, "error": e.to_string() }));
        }
    };

    let pipeline = ctx.pipeline.load();
    match pipeline.predict_rounded(&record) {
        Ok(prediction) => {
            debug!(request_id = %req.request_id, prediction, "prediction served");
            HandlerResponse::ok_json(json!({ "success": true, "prediction": prediction }))
        }
        Err(e) => HandlerResponse::ok_json(json!({ "success": false, "error": e.to_string() })),
    }
}
