//! Request description handed to the network layer.

use serde::Serialize;
use std::collections::BTreeMap;

/// A JSON request against the chat API, relative to the configured base URL.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: String,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub extra_headers: BTreeMap<String, String>,
    /// Attach the session token and treat 401 as session expiry.
    pub authenticated: bool,
}

impl ApiRequest {
    #[inline]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body: None,
            extra_headers: BTreeMap::new(),
            authenticated: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new("PATCH", path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new("DELETE", path)
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> crate::Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    /// Send without a bearer token; a 401 is then an ordinary failure.
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    #[inline]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = ApiRequest::post("/channels/7/messages")
            .with_json(&serde_json::json!({ "content": "hi" }))
            .unwrap()
            .with_header("X-Trace", "1");

        assert_eq!(req.method, "POST");
        assert!(req.has_body());
        assert!(req.authenticated);
        assert_eq!(req.extra_headers.get("X-Trace").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_anonymous_request() {
        let req = ApiRequest::post("/auth/login").anonymous();
        assert!(!req.authenticated);
        assert!(!req.has_body());
    }
}
