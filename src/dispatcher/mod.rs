//! # Dispatcher Module
//!
//! Coroutine-based request handler dispatch. Each handler runs in its own
//! `may` coroutine, consuming requests from an MPSC channel and replying on
//! a per-request channel. Handler panics are caught and converted to 500
//! responses; a closed reply channel yields 503 instead of dropping the
//! connection. Middleware hooks run before and after dispatch.

use http::Method;
use may::coroutine;
use may::sync::mpsc;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::router::{ParamVec, RouteMatch};

/// Maximum inline headers/cookies before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header/cookie storage for the dispatch hot path.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request data passed to a handler coroutine.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation.
    pub request_id: RequestId,
    pub method: Method,
    pub path: String,
    pub handler_name: String,
    pub path_params: ParamVec,
    pub query_params: ParamVec,
    /// HTTP headers (lowercase names).
    pub headers: HeaderVec,
    /// Cookies parsed from the Cookie header.
    pub cookies: HeaderVec,
    /// Request body parsed as JSON, when the content type allows it.
    pub body: Option<Value>,
    /// Raw request body; CSV uploads arrive here.
    pub raw_body: Option<String>,
    /// Channel for sending the response back to the dispatcher.
    pub reply_tx: mpsc::Sender<HandlerResponse>,
}

impl HandlerRequest {
    /// Get a path parameter by name. Last write wins for duplicates.
    #[inline]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Response data sent back from a handler coroutine.
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: Value,
}

impl HandlerResponse {
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A JSON response with the default content type.
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body,
        }
    }

    /// 200 OK with a JSON body.
    pub fn ok_json(body: Value) -> Self {
        Self::json(200, body)
    }

    /// An infrastructure error response (`{"error": …}`).
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header (case-insensitive on the name).
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Channel sender that dispatches requests to a handler coroutine.
pub type HandlerSender = mpsc::Sender<HandlerRequest>;

/// Dispatcher that routes requests to registered handler coroutines.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: HashMap<String, HandlerSender>,
    middlewares: Vec<Arc<dyn Middleware>>,
    stack_size: usize,
}

impl Dispatcher {
    /// Create an empty dispatcher; handler coroutines get `stack_size`
    /// bytes of stack (see `RuntimeConfig`).
    pub fn new(stack_size: usize) -> Self {
        Dispatcher {
            handlers: HashMap::new(),
            middlewares: Vec::new(),
            stack_size,
        }
    }

    /// Middleware runs in registration order around every dispatch.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.keys().map(|s| s.as_str()).collect()
    }

    /// Register a handler function under a name, spawning its coroutine.
    ///
    /// The coroutine processes requests until its channel closes. Panics
    /// inside the handler are caught and reported as 500 responses.
    ///
    /// # Safety
    ///
    /// `may::coroutine::Builder::spawn` is unsafe in the `may` runtime.
    /// The caller must ensure the runtime is initialized and that
    /// registration happens before the server starts accepting requests.
    pub unsafe fn register_handler<F>(&mut self, name: &str, handler_fn: F)
    where
        F: Fn(&HandlerRequest) -> HandlerResponse + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<HandlerRequest>();
        let name = name.to_string();
        let coroutine_name = name.clone();
        let stack_size = self.stack_size;

        let spawn_result = coroutine::Builder::new()
            .stack_size(stack_size)
            .spawn(move || {
                debug!(handler = %coroutine_name, stack_size, "handler coroutine start");
                for req in rx.iter() {
                    let reply_tx = req.reply_tx.clone();
                    let request_id = req.request_id;
                    let started = Instant::now();

                    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        handler_fn(&req)
                    }));

                    match outcome {
                        Ok(response) => {
                            debug!(
                                request_id = %request_id,
                                handler = %coroutine_name,
                                status = response.status,
                                elapsed_ms = started.elapsed().as_millis() as u64,
                                "handler execution complete"
                            );
                            let _ = reply_tx.send(response);
                        }
                        Err(panic) => {
                            error!(
                                request_id = %request_id,
                                handler = %coroutine_name,
                                panic = ?panic,
                                "handler panicked"
                            );
                            let _ = reply_tx
                                .send(HandlerResponse::error(500, "Internal handler error"));
                        }
                    }
                }
            });

        match spawn_result {
            Ok(_) => {
                if self.handlers.insert(name.clone(), tx).is_some() {
                    debug!(handler = %name, "replaced existing handler");
                }
            }
            Err(e) => {
                error!(handler = %name, error = %e, "failed to spawn handler coroutine");
            }
        }
    }

    /// Dispatch a request to its handler and wait for the response.
    ///
    /// Returns `None` when no handler is registered for the route.
    #[allow(clippy::too_many_arguments)]
    pub fn dispatch(
        &self,
        route_match: RouteMatch,
        body: Option<Value>,
        raw_body: Option<String>,
        headers: HeaderVec,
        cookies: HeaderVec,
        request_id: RequestId,
    ) -> Option<HandlerResponse> {
        let tx = match self.handlers.get(&route_match.handler_name) {
            Some(tx) => tx,
            None => {
                error!(
                    handler = %route_match.handler_name,
                    registered = self.handlers.len(),
                    "handler not registered"
                );
                return None;
            }
        };

        let (reply_tx, reply_rx) = mpsc::channel();
        let request = HandlerRequest {
            request_id,
            method: route_match.route.method.clone(),
            path: route_match.route.path_pattern.clone(),
            handler_name: route_match.handler_name,
            path_params: route_match.path_params,
            query_params: route_match.query_params,
            headers,
            cookies,
            body,
            raw_body,
            reply_tx,
        };

        let mut early: Option<HandlerResponse> = None;
        for mw in &self.middlewares {
            if early.is_none() {
                early = mw.before(&request);
            }
        }

        let (mut response, latency) = if let Some(r) = early {
            (r, Duration::from_millis(0))
        } else {
            info!(
                request_id = %request_id,
                handler = %request.handler_name,
                method = %request.method,
                path = %request.path,
                "request dispatched"
            );
            let start = Instant::now();
            if tx.send(request.clone()).is_err() {
                error!(
                    request_id = %request_id,
                    handler = %request.handler_name,
                    "failed to send request to handler"
                );
                return None;
            }
            match reply_rx.recv() {
                Ok(r) => (r, start.elapsed()),
                Err(e) => {
                    error!(
                        request_id = %request_id,
                        handler = %request.handler_name,
                        error = %e,
                        "handler channel closed before replying"
                    );
                    return Some(HandlerResponse::error(
                        503,
                        "Handler is not responding",
                    ));
                }
            }
        };

        for mw in &self.middlewares {
            mw.after(&request, &mut response, latency);
        }

        Some(response)
    }
}
