use std::time::Duration;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

pub trait Middleware: Send + Sync {
    /// Runs before dispatch. Returning a response short-circuits the handler.
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }

    /// Runs after the handler (or the early response) with the dispatch latency.
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}
