//! # Router Module
//!
//! Path matching and route resolution. The route table is fixed and built
//! in code: each entry maps a method and path pattern to a handler name
//! plus its security requirements. Patterns may contain `{param}` segments,
//! compiled to regexes at startup; matching extracts path parameters into
//! stack-allocated storage.

use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the dispatch hot path.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Metadata for one route in the table.
#[derive(Debug, Clone)]
pub struct RouteMeta {
    pub method: Method,
    pub path_pattern: String,
    pub handler_name: String,
    /// Reject the request with 400 before dispatch when no body is present.
    pub request_body_required: bool,
    /// Names of security schemes that may authorize this route; any one
    /// satisfied scheme grants access. Empty means the route is open.
    pub security: Vec<String>,
}

impl RouteMeta {
    pub fn new(method: Method, path_pattern: &str, handler_name: &str) -> Self {
        Self {
            method,
            path_pattern: path_pattern.to_string(),
            handler_name: handler_name.to_string(),
            request_body_required: false,
            security: Vec::new(),
        }
    }

    pub fn with_body_required(mut self) -> Self {
        self.request_body_required = true;
        self
    }

    pub fn with_security(mut self, schemes: Vec<String>) -> Self {
        self.security = schemes;
        self
    }
}

/// Result of successfully matching a request path to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteMeta>,
    pub handler_name: String,
    /// Path parameters extracted from the URL (e.g. `{id}` → `("id", "…")`).
    pub path_params: ParamVec,
    /// Query string parameters (populated by the server).
    pub query_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name. Last write wins for duplicate names.
    #[inline]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Router matching requests against the compiled route table.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<(Method, Regex, Arc<RouteMeta>, Vec<Arc<str>>)>,
}

impl Router {
    /// Compile a route table. Patterns are anchored; `{param}` segments
    /// match one path segment.
    pub fn new(routes: Vec<RouteMeta>) -> Self {
        let routes = routes
            .into_iter()
            .filter_map(|meta| {
                let (regex, params) = compile_pattern(&meta.path_pattern)?;
                debug!(
                    method = %meta.method,
                    pattern = %meta.path_pattern,
                    handler = %meta.handler_name,
                    "route registered"
                );
                Some((meta.method.clone(), regex, Arc::new(meta), params))
            })
            .collect();
        Self { routes }
    }

    /// Match an incoming request to a route, extracting path parameters.
    pub fn route(&self, method: Method, path: &str) -> Option<RouteMatch> {
        for (m, regex, meta, param_names) in &self.routes {
            if *m != method {
                continue;
            }
            if let Some(caps) = regex.captures(path) {
                let mut path_params = ParamVec::new();
                for (i, name) in param_names.iter().enumerate() {
                    if let Some(cap) = caps.get(i + 1) {
                        path_params.push((Arc::clone(name), cap.as_str().to_string()));
                    }
                }
                return Some(RouteMatch {
                    route: Arc::clone(meta),
                    handler_name: meta.handler_name.clone(),
                    path_params,
                    query_params: ParamVec::new(),
                });
            }
        }
        None
    }
}

fn compile_pattern(pattern: &str) -> Option<(Regex, Vec<Arc<str>>)> {
    let mut regex = String::from("^");
    let mut params = Vec::new();
    for segment in pattern.split('/') {
        if segment.is_empty() {
            continue;
        }
        regex.push('/');
        if let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            params.push(Arc::from(name));
            regex.push_str("([^/]+)");
        } else {
            regex.push_str(&regex::escape(segment));
        }
    }
    if pattern == "/" {
        regex.push('/');
    }
    regex.push('$');
    Regex::new(&regex).ok().map(|r| (r, params))
}

/// The service route table. `protect` maps handler names to the security
/// schemes that guard them (from config); unlisted handlers are open.
pub fn service_routes(protect: &HashMap<String, Vec<String>>) -> Vec<RouteMeta> {
    let guard = |name: &str| protect.get(name).cloned().unwrap_or_default();
    vec![
        RouteMeta::new(Method::POST, "/api/predict", "predict")
            .with_body_required()
            .with_security(guard("predict")),
        RouteMeta::new(Method::POST, "/api/batch", "batch_predict")
            .with_body_required()
            .with_security(guard("batch_predict")),
        RouteMeta::new(Method::GET, "/reports/{id}", "download_report")
            .with_security(guard("download_report")),
        RouteMeta::new(Method::GET, "/api/model", "model_info")
            .with_security(guard("model_info")),
        RouteMeta::new(Method::POST, "/api/login", "login").with_body_required(),
        RouteMeta::new(Method::POST, "/api/logout", "logout"),
        RouteMeta::new(Method::GET, "/api/admin/stats", "admin_stats")
            .with_security(guard("admin_stats")),
    ]
}
