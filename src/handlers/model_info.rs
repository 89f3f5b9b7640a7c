//! `GET /api/model` — metadata of the serving model.

use serde_json::json;

use super::AppContext;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

pub fn handle(ctx: &AppContext, _req: &HandlerRequest) -> HandlerResponse {
    let pipeline = ctx.pipeline.load();
    let info = pipeline.info();
    match serde_json::to_value(&info) {
        Ok(model) => HandlerResponse::ok_json(json!({ "success": true, "model": model })),
        Err(e) => HandlerResponse::error(500, &e.to_string()),
    }
}
