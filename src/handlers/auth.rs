//! `POST /api/login` and `POST /api/logout` — session management.

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::AppContext;
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::security::{verify_password, SESSION_COOKIE};

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

pub fn login(ctx: &AppContext, req: &HandlerRequest) -> HandlerResponse {
    let Some(body) = req.body.as_ref() else {
        return HandlerResponse::json(
            400,
            json!({ "success": false, "error": "Request body must be a JSON object" }),
        );
    };
    let login: LoginRequest = match serde_json::from_value(body.clone()) {
        Ok(l) => l,
        Err(e) => {
            return HandlerResponse::json(400, json!({ "success": false, "error": e.to_string() }));
        }
    };

    let authenticated = ctx
        .users
        .get(&login.username)
        .filter(|entry| verify_password(entry, &login.password));

    match authenticated {
        Some(entry) => {
            let token = ctx.sessions.create(&login.username, entry.admin);
            info!(request_id = %req.request_id, username = %login.username, "login successful");
            let mut resp = HandlerResponse::ok_json(json!({ "success": true }));
            resp.set_header(
                "Set-Cookie",
                format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly"),
            );
            resp
        }
        None => {
            info!(request_id = %req.request_id, username = %login.username, "login rejected");
            HandlerResponse::json(
                401,
                json!({ "success": false, "error": "Invalid username or password" }),
            )
        }
    }
}

pub fn logout(ctx: &AppContext, req: &HandlerRequest) -> HandlerResponse {
    if let Some(token) = req.get_cookie(SESSION_COOKIE) {
        ctx.sessions.remove(token);
    }
    let mut resp = HandlerResponse::ok_json(json!({ "success": true }));
    resp.set_header(
        "Set-Cookie",
        format!("{SESSION_COOKIE}=; Path=/; Max-Age=0"),
    );
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserEntry;
    use crate::handlers::testing::{request_with_body, tiny_context};
    use crate::security::hash_password;
    use std::sync::Arc;

    fn ctx_with_user(dir: &std::path::Path) -> super::super::AppContext {
        let mut ctx = tiny_context(dir.to_path_buf());
        ctx.users.insert(
            "admin".to_string(),
            UserEntry {
                salt: "s1".to_string(),
                digest: hash_password("s1", "admin123"),
                admin: true,
            },
        );
        ctx
    }

    #[test]
    fn test_login_sets_session_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with_user(dir.path());
        let body = json!({ "username": "admin", "password": "admin123" });
        let resp = login(&ctx, &request_with_body("login", Some(body), None));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body["success"], true);
        let cookie = resp.get_header("set-cookie").unwrap();
        assert!(cookie.starts_with(SESSION_COOKIE));
        assert_eq!(ctx.sessions.len(), 1);
    }

    #[test]
    fn test_wrong_password_is_401() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with_user(dir.path());
        let body = json!({ "username": "admin", "password": "nope" });
        let resp = login(&ctx, &request_with_body("login", Some(body), None));
        assert_eq!(resp.status, 401);
        assert_eq!(
            resp.body["error"].as_str().unwrap(),
            "Invalid username or password"
        );
        assert!(ctx.sessions.is_empty());
    }

    #[test]
    fn test_logout_removes_session() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with_user(dir.path());
        let token = ctx.sessions.create("admin", true);

        let mut req = request_with_body("logout", None, None);
        req.cookies.push((Arc::from(SESSION_COOKIE), token));
        let resp = logout(&ctx, &req);
        assert_eq!(resp.status, 200);
        assert!(ctx.sessions.is_empty());
        assert!(resp.get_header("set-cookie").unwrap().contains("Max-Age=0"));
    }
}
