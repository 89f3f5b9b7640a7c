use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tracing::warn;

use super::request::{parse_request, ParsedRequest};
use super::response::{write_bytes, write_handler_response, write_json_error};
use crate::dispatcher::Dispatcher;
use crate::ids::RequestId;
use crate::middleware::MetricsMiddleware;
use crate::router::Router;
use crate::security::{SecurityProvider, SecurityRequest};
use crate::static_files::StaticFiles;

/// The HTTP service: routes requests, enforces per-route security, and
/// falls through to static files on unrouted GETs.
#[derive(Clone)]
pub struct AppService {
    pub router: Arc<Router>,
    pub dispatcher: Arc<Dispatcher>,
    pub security_providers: HashMap<String, Arc<dyn SecurityProvider>>,
    pub metrics: Arc<MetricsMiddleware>,
    pub static_files: Option<StaticFiles>,
}

impl AppService {
    pub fn new(router: Arc<Router>, dispatcher: Arc<Dispatcher>, metrics: Arc<MetricsMiddleware>) -> Self {
        Self {
            router,
            dispatcher,
            security_providers: HashMap::new(),
            metrics,
            static_files: None,
        }
    }

    pub fn register_security_provider(&mut self, name: &str, provider: Arc<dyn SecurityProvider>) {
        self.security_providers.insert(name.to_string(), provider);
    }

    pub fn set_static_files(&mut self, files: StaticFiles) {
        self.static_files = Some(files);
    }

    fn authorize(&self, schemes: &[String], parsed: &ParsedRequest) -> bool {
        if schemes.is_empty() {
            return true;
        }
        let sec_req = SecurityRequest {
            headers: &parsed.headers,
            query: &parsed.query_params,
            cookies: &parsed.cookies,
        };
        schemes.iter().any(|name| {
            match self.security_providers.get(name) {
                Some(provider) => provider.validate(&sec_req),
                None => {
                    warn!(scheme = %name, "security scheme has no registered provider");
                    false
                }
            }
        })
    }
}

/// Basic health check endpoint returning `{ "status": "ok" }`.
pub fn health_endpoint(res: &mut Response) -> io::Result<()> {
    write_handler_response(res, 200, json!({ "status": "ok" }), &Default::default());
    Ok(())
}

/// Metrics endpoint returning Prometheus text format statistics.
pub fn metrics_endpoint(res: &mut Response, metrics: &MetricsMiddleware) -> io::Result<()> {
    let (predictions, failures) = metrics.prediction_counts();
    let mut body = format!(
        "# HELP scorecast_requests_total Total number of dispatched requests\n\
         # TYPE scorecast_requests_total counter\n\
         scorecast_requests_total {}\n\
         # HELP scorecast_request_latency_seconds Average request latency in seconds\n\
         # TYPE scorecast_request_latency_seconds gauge\n\
         scorecast_request_latency_seconds {}\n\
         # HELP scorecast_predictions_total Prediction requests handled\n\
         # TYPE scorecast_predictions_total counter\n\
         scorecast_predictions_total {}\n\
         # HELP scorecast_prediction_failures_total Prediction requests that reported failure\n\
         # TYPE scorecast_prediction_failures_total counter\n\
         scorecast_prediction_failures_total {}\n\
         # HELP scorecast_top_level_requests_total Requests answered without handler dispatch\n\
         # TYPE scorecast_top_level_requests_total counter\n\
         scorecast_top_level_requests_total {}\n\
         # HELP scorecast_auth_failures_total Rejected requests on protected routes\n\
         # TYPE scorecast_auth_failures_total counter\n\
         scorecast_auth_failures_total {}\n",
        metrics.request_count(),
        metrics.average_latency().as_secs_f64(),
        predictions,
        failures,
        metrics.top_level_request_count(),
        metrics.auth_failures(),
    );
    if let Some(bytes) = metrics.memory_bytes() {
        body.push_str(&format!(
            "# HELP scorecast_memory_bytes Resident memory of the process\n\
             # TYPE scorecast_memory_bytes gauge\n\
             scorecast_memory_bytes {bytes}\n"
        ));
    }
    write_bytes(res, 200, "text/plain; version=0.0.4", body.into_bytes());
    Ok(())
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req);
        let method = parsed.method.clone();
        let path = parsed.path.clone();

        if method == "GET" && path == "/health" {
            self.metrics.inc_top_level_request();
            return health_endpoint(res);
        }
        if method == "GET" && path == "/metrics" {
            self.metrics.inc_top_level_request();
            return metrics_endpoint(res, &self.metrics);
        }

        let method_typed = match method.parse::<http::Method>() {
            Ok(m) => m,
            Err(_) => {
                write_json_error(res, 400, json!({ "error": "Unsupported method" }));
                return Ok(());
            }
        };

        let route_opt = self.router.route(method_typed, &path);

        let Some(mut route_match) = route_opt else {
            // Unrouted GETs fall through to the form page and its assets.
            if method == "GET" {
                if let Some(sf) = &self.static_files {
                    let trimmed = path.trim_start_matches('/');
                    let (file, ctx) = if trimmed.is_empty() {
                        ("index.html", Some(json!({ "predict_path": "/api/predict" })))
                    } else {
                        (trimmed, None)
                    };
                    if let Ok((bytes, ct)) = sf.load(file, ctx.as_ref()) {
                        self.metrics.inc_top_level_request();
                        write_bytes(res, 200, ct, bytes);
                        return Ok(());
                    }
                }
            }
            write_json_error(
                res,
                404,
                json!({ "error": "Not Found", "method": method, "path": path }),
            );
            return Ok(());
        };

        route_match.query_params = parsed.query_params.clone();

        if route_match.route.request_body_required && parsed.raw_body.is_none() {
            write_json_error(
                res,
                400,
                json!({ "success": false, "error": "Request body required" }),
            );
            return Ok(());
        }

        if !self.authorize(&route_match.route.security, &parsed) {
            self.metrics.inc_auth_failure();
            write_json_error(res, 401, json!({ "error": "Unauthorized" }));
            return Ok(());
        }

        let request_id = RequestId::from_header_or_new(parsed.get_header("x-request-id"));
        let handler_response = self.dispatcher.dispatch(
            route_match,
            parsed.body,
            parsed.raw_body,
            parsed.headers,
            parsed.cookies,
            request_id,
        );

        match handler_response {
            Some(hr) => write_handler_response(res, hr.status, hr.body, &hr.headers),
            None => write_json_error(
                res,
                500,
                json!({
                    "error": "Handler failed or not registered",
                    "method": method,
                    "path": path
                }),
            ),
        }
        Ok(())
    }
}
