use may_minihttp::Request;
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

use crate::dispatcher::HeaderVec;
use crate::router::ParamVec;

/// Parsed HTTP request data used by `AppService`.
#[derive(Debug)]
pub struct ParsedRequest {
    /// HTTP method (GET, POST, …).
    pub method: String,
    /// Request path without the query string.
    pub path: String,
    /// HTTP headers (lowercase names).
    pub headers: HeaderVec,
    /// Parsed cookies from the Cookie header.
    pub cookies: HeaderVec,
    /// Parsed query string parameters.
    pub query_params: ParamVec,
    /// Request body parsed as JSON when the body is valid JSON.
    pub body: Option<serde_json::Value>,
    /// Raw request body (non-empty bodies only).
    pub raw_body: Option<String>,
}

impl ParsedRequest {
    /// Get a header by name (case-insensitive).
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Parse the Cookie header into name/value pairs.
pub fn parse_cookies(headers: &HeaderVec) -> HeaderVec {
    headers
        .iter()
        .find(|(k, _)| k.as_ref() == "cookie")
        .map(|(_, c)| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim();
                    let value = parts.next().unwrap_or("").trim();
                    Some((Arc::from(name), value.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse query string parameters from a raw URL path.
pub fn parse_query_params(raw_path: &str) -> ParamVec {
    match raw_path.find('?') {
        Some(pos) => url::form_urlencoded::parse(raw_path[pos + 1..].as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.to_string()))
            .collect(),
        None => ParamVec::new(),
    }
}

/// Extract method, path, headers, cookies, query params, and body from a
/// raw `may_minihttp` request.
pub fn parse_request(req: Request) -> ParsedRequest {
    let method = req.method().to_string();
    let raw_path = req.path().to_string();
    let path = raw_path
        .split('?')
        .next()
        .unwrap_or("/")
        .to_string();

    let headers: HeaderVec = req
        .headers()
        .iter()
        .map(|h| {
            (
                Arc::from(h.name.to_ascii_lowercase().as_str()),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    let cookies = parse_cookies(&headers);
    let query_params = parse_query_params(&raw_path);

    let mut raw_body = None;
    let mut body = None;
    let mut body_str = String::new();
    if let Ok(size) = req.body().read_to_string(&mut body_str) {
        if size > 0 {
            body = serde_json::from_str(&body_str).ok();
            raw_body = Some(body_str);
        }
    }

    debug!(
        method = %method,
        path = %path,
        header_count = headers.len(),
        cookie_count = cookies.len(),
        query_count = query_params.len(),
        body_json = body.is_some(),
        "request parsed"
    );

    ParsedRequest {
        method,
        path,
        headers,
        cookies,
        query_params,
        body,
        raw_body,
    }
}
