use may_minihttp::Response;
use serde_json::Value;

use crate::dispatcher::HeaderVec;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Write a handler response: JSON bodies as `application/json`, string
/// bodies raw with the handler's content type (default `text/plain`).
/// Extra handler headers (e.g. Set-Cookie) are forwarded.
pub fn write_handler_response(res: &mut Response, status: u16, body: Value, headers: &HeaderVec) {
    res.status_code(status as usize, status_reason(status));

    let mut content_type: Option<&str> = None;
    for (name, value) in headers {
        if name.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.as_str());
            continue;
        }
        let line = format!("{name}: {value}").into_boxed_str();
        res.header(Box::leak(line));
    }

    match body {
        Value::String(s) => {
            let ct = content_type.unwrap_or("text/plain");
            let line = format!("Content-Type: {ct}").into_boxed_str();
            res.header(Box::leak(line));
            res.body_vec(s.into_bytes());
        }
        other => {
            res.header("Content-Type: application/json");
            res.body_vec(serde_json::to_vec(&other).unwrap_or_default());
        }
    }
}

/// Write a JSON error body with the given status.
pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}

/// Write raw bytes with an explicit content type (static files, reports).
pub fn write_bytes(res: &mut Response, status: u16, content_type: &str, bytes: Vec<u8>) {
    res.status_code(status as usize, status_reason(status));
    let line = format!("Content-Type: {content_type}").into_boxed_str();
    res.header(Box::leak(line));
    res.body_vec(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(503), "Service Unavailable");
    }
}
