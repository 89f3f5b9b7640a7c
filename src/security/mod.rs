//! # Security Module
//!
//! Authentication providers enforced per-route before dispatch.
//!
//! A route lists the scheme names that may authorize it; the service looks
//! each one up in its provider registry and grants access when any
//! provider validates the request. Two providers exist:
//!
//! - [`ApiKeyProvider`] — a static key carried in a request header
//! - [`SessionProvider`] — a session cookie issued by `POST /api/login`,
//!   optionally restricted to admin users
//!
//! Passwords are stored as salted SHA-256 digests in the config file and
//! never in plain text.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::config::UserEntry;
use crate::dispatcher::HeaderVec;
use crate::router::ParamVec;

/// Name of the session cookie issued on login.
pub const SESSION_COOKIE: &str = "scorecast_session";

/// Credential-bearing parts of a request, borrowed from the parsed request.
pub struct SecurityRequest<'a> {
    pub headers: &'a HeaderVec,
    pub query: &'a ParamVec,
    pub cookies: &'a HeaderVec,
}

impl<'a> SecurityRequest<'a> {
    /// Get a header by name (case-insensitive).
    #[inline]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn get_query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k.as_ref() == name)
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

/// Validates a request against one security scheme.
pub trait SecurityProvider: Send + Sync {
    fn validate(&self, req: &SecurityRequest) -> bool;
}

/// Static API key checked against a request header.
pub struct ApiKeyProvider {
    header_name: String,
    key: String,
}

impl ApiKeyProvider {
    pub fn new(header_name: &str, key: &str) -> Self {
        Self {
            header_name: header_name.to_string(),
            key: key.to_string(),
        }
    }
}

impl SecurityProvider for ApiKeyProvider {
    fn validate(&self, req: &SecurityRequest) -> bool {
        req.get_header(&self.header_name)
            .map(|k| k == self.key)
            .unwrap_or(false)
    }
}

/// One live login session.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub admin: bool,
}

/// Concurrent token → session map. Tokens are ULIDs; sessions live until
/// logout or process exit.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session and return its token.
    pub fn create(&self, username: &str, admin: bool) -> String {
        let token = ulid::Ulid::new().to_string();
        self.sessions.insert(
            token.clone(),
            Session {
                username: username.to_string(),
                admin,
            },
        );
        token
    }

    pub fn get(&self, token: &str) -> Option<Session> {
        self.sessions.get(token).map(|s| s.value().clone())
    }

    pub fn remove(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Validates the session cookie against the store.
pub struct SessionProvider {
    store: Arc<SessionStore>,
    require_admin: bool,
}

impl SessionProvider {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            require_admin: false,
        }
    }

    /// Only sessions of admin users validate.
    pub fn admin_only(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            require_admin: true,
        }
    }
}

impl SecurityProvider for SessionProvider {
    fn validate(&self, req: &SecurityRequest) -> bool {
        let Some(token) = req.get_cookie(SESSION_COOKIE) else {
            return false;
        };
        match self.store.get(token) {
            Some(session) => !self.require_admin || session.admin,
            None => false,
        }
    }
}

fn sha256_hex(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut s, b| {
        use std::fmt::Write;
        let _ = write!(s, "{b:02x}");
        s
    })
}

/// Salted digest for a password, as stored in the config file.
pub fn hash_password(salt: &str, password: &str) -> String {
    sha256_hex(&format!("{salt}{password}"))
}

/// Check a login attempt against a config user entry.
pub fn verify_password(entry: &UserEntry, password: &str) -> bool {
    hash_password(&entry.salt, password) == entry.digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn creds<'a>(
        headers: &'a HeaderVec,
        query: &'a ParamVec,
        cookies: &'a HeaderVec,
    ) -> SecurityRequest<'a> {
        SecurityRequest {
            headers,
            query,
            cookies,
        }
    }

    #[test]
    fn test_api_key_provider() {
        let provider = ApiKeyProvider::new("X-API-Key", "test123");
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("x-api-key"), "test123".to_string()));
        let query = ParamVec::new();
        let cookies = HeaderVec::new();
        assert!(provider.validate(&creds(&headers, &query, &cookies)));

        let mut wrong = HeaderVec::new();
        wrong.push((Arc::from("x-api-key"), "nope".to_string()));
        assert!(!provider.validate(&creds(&wrong, &query, &cookies)));
    }

    #[test]
    fn test_session_provider() {
        let store = Arc::new(SessionStore::new());
        let token = store.create("admin", true);
        let provider = SessionProvider::new(Arc::clone(&store));
        let admin_provider = SessionProvider::admin_only(Arc::clone(&store));

        let headers = HeaderVec::new();
        let query = ParamVec::new();
        let mut cookies = HeaderVec::new();
        cookies.push((Arc::from(SESSION_COOKIE), token.clone()));
        assert!(provider.validate(&creds(&headers, &query, &cookies)));
        assert!(admin_provider.validate(&creds(&headers, &query, &cookies)));

        store.remove(&token);
        assert!(!provider.validate(&creds(&headers, &query, &cookies)));
    }

    #[test]
    fn test_admin_only_rejects_plain_users() {
        let store = Arc::new(SessionStore::new());
        let token = store.create("viewer", false);
        let provider = SessionProvider::admin_only(Arc::clone(&store));

        let headers = HeaderVec::new();
        let query = ParamVec::new();
        let mut cookies = HeaderVec::new();
        cookies.push((Arc::from(SESSION_COOKIE), token));
        assert!(!provider.validate(&creds(&headers, &query, &cookies)));
    }

    #[test]
    fn test_password_verification() {
        let entry = UserEntry {
            salt: "a1b2".to_string(),
            digest: hash_password("a1b2", "admin123"),
            admin: true,
        };
        assert!(verify_password(&entry, "admin123"));
        assert!(!verify_password(&entry, "admin124"));
    }
}
