//! Transport-neutral request and response descriptors.
//!
//! Requests are values: decorating one (adding a header) produces a new
//! descriptor and leaves the original untouched.

use crate::{ClientError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// An outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_string(body)?);
        self.headers
            .insert(CONTENT_TYPE.to_string(), "application/json".to_string());
        Ok(self)
    }

    /// Copy of this request with one extra header
    pub fn with_header(&self, name: &str, value: &str) -> Self {
        let mut next = self.clone();
        next.headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
        next.headers.insert(name.to_string(), value.to_string());
        next
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// First value of a query parameter
    pub fn query_param(&self, name: &str) -> Option<String> {
        let url = url::Url::parse(&self.url).ok()?;
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// URL path without scheme, host or query
    pub fn path(&self) -> Option<String> {
        url::Url::parse(&self.url).ok().map(|u| u.path().to_string())
    }
}

/// A completed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(ClientError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_header_leaves_original_untouched() {
        let original = HttpRequest::get("http://api.test/api/solutions/kafka");
        let decorated = original.with_header(AUTHORIZATION, "Bearer abc");

        assert_eq!(original.header(AUTHORIZATION), None);
        assert_eq!(decorated.header("authorization"), Some("Bearer abc"));
        assert_eq!(decorated.url, original.url);
        assert_eq!(decorated.method, original.method);
    }

    #[test]
    fn test_with_header_replaces_case_insensitively() {
        let req = HttpRequest::get("http://api.test/")
            .with_header("authorization", "Bearer old")
            .with_header(AUTHORIZATION, "Bearer new");
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header(AUTHORIZATION), Some("Bearer new"));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let req = HttpRequest::post("http://api.test/api/x")
            .json(&serde_json::json!({"content": "hi"}))
            .unwrap();
        assert_eq!(req.header(CONTENT_TYPE), Some("application/json"));
        assert_eq!(req.body.as_deref(), Some(r#"{"content":"hi"}"#));
    }

    #[test]
    fn test_query_and_path() {
        let req = HttpRequest::get("http://api.test/api/solutions/k/comments?skip=10&limit=10&type=USER");
        assert_eq!(req.query_param("skip").as_deref(), Some("10"));
        assert_eq!(req.query_param("type").as_deref(), Some("USER"));
        assert_eq!(req.query_param("missing"), None);
        assert_eq!(req.path().as_deref(), Some("/api/solutions/k/comments"));
    }

    #[test]
    fn test_response_status_ranges() {
        assert!(HttpResponse::new(201, "").is_success());
        assert!(!HttpResponse::new(401, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }
}
