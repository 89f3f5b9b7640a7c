//! HTTP server layer: request parsing, response writing, the service
//! implementation, and the server start/stop handle.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_cookies, parse_query_params, parse_request, ParsedRequest};
pub use service::AppService;
