//! HTTP response as seen by the request layer.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        ApiResponse {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> crate::Result<T> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[inline]
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl Default for ApiResponse {
    fn default() -> Self {
        ApiResponse {
            status: 200,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let res = ApiResponse::new(200, "{}").with_header("Content-Type", "application/json");
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert!(res.is_success());
    }

    #[test]
    fn test_empty_body_decodes_as_unit() {
        let res = ApiResponse::new(204, "");
        let value: serde_json::Value = res.json().unwrap();
        assert!(value.is_null());
        let _: () = res.json().unwrap();
    }
}
