use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Middleware collecting the counters behind the `/metrics` endpoint.
///
/// All counters use atomic operations; the middleware is passive and never
/// blocks a request.
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    prediction_count: AtomicUsize,
    prediction_failures: AtomicUsize,
    top_level_requests: AtomicUsize,
    auth_failures: AtomicUsize,
}

impl Default for MetricsMiddleware {
    fn default() -> Self {
        Self {
            request_count: AtomicUsize::new(0),
            total_latency_ns: AtomicU64::new(0),
            prediction_count: AtomicUsize::new(0),
            prediction_failures: AtomicUsize::new(0),
            top_level_requests: AtomicUsize::new(0),
            auth_failures: AtomicUsize::new(0),
        }
    }
}

impl MetricsMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requests that went through handler dispatch.
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean dispatch latency; zero before the first request.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Count of `/api/predict` dispatches and how many reported failure.
    pub fn prediction_counts(&self) -> (usize, usize) {
        (
            self.prediction_count.load(Ordering::Relaxed),
            self.prediction_failures.load(Ordering::Relaxed),
        )
    }

    /// Infrastructure endpoints (`/health`, `/metrics`, static files) that
    /// bypass handler dispatch.
    pub fn inc_top_level_request(&self) {
        self.top_level_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn top_level_request_count(&self) -> usize {
        self.top_level_requests.load(Ordering::Relaxed)
    }

    pub fn inc_auth_failure(&self) {
        self.auth_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn auth_failures(&self) -> usize {
        self.auth_failures.load(Ordering::Relaxed)
    }

    /// Resident memory of the process, when the platform exposes it.
    pub fn memory_bytes(&self) -> Option<usize> {
        memory_stats::memory_stats().map(|m| m.physical_mem)
    }
}

impl Middleware for MetricsMiddleware {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        if req.handler_name == "predict" {
            self.prediction_count.fetch_add(1, Ordering::Relaxed);
            let failed = res
                .body
                .get("success")
                .and_then(|v| v.as_bool())
                .map(|ok| !ok)
                .unwrap_or(true);
            if failed {
                self.prediction_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::HeaderVec;
    use crate::ids::RequestId;
    use crate::router::ParamVec;
    use may::sync::mpsc;

    fn request(handler: &str) -> HandlerRequest {
        let (reply_tx, _reply_rx) = mpsc::channel();
        HandlerRequest {
            request_id: RequestId::new(),
            method: http::Method::POST,
            path: "/api/predict".into(),
            handler_name: handler.into(),
            path_params: ParamVec::new(),
            query_params: ParamVec::new(),
            headers: HeaderVec::new(),
            cookies: HeaderVec::new(),
            body: None,
            raw_body: None,
            reply_tx,
        }
    }

    #[test]
    fn test_counts_and_latency() {
        let metrics = MetricsMiddleware::new();
        let req = request("predict");
        assert!(metrics.before(&req).is_none());
        let mut ok = HandlerResponse::ok_json(serde_json::json!({"success": true}));
        metrics.after(&req, &mut ok, Duration::from_millis(4));

        assert_eq!(metrics.request_count(), 1);
        assert!(metrics.average_latency() >= Duration::from_millis(4));
        assert_eq!(metrics.prediction_counts(), (1, 0));
    }

    #[test]
    fn test_prediction_failures_tracked() {
        let metrics = MetricsMiddleware::new();
        let req = request("predict");
        let mut failed = HandlerResponse::ok_json(serde_json::json!({"success": false}));
        metrics.after(&req, &mut failed, Duration::from_millis(1));
        assert_eq!(metrics.prediction_counts(), (1, 1));
    }
}
