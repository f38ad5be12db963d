//! JSON envelopes wrapping every API payload.
//!
//! The catalog API reports success either as `success: bool` or as
//! `status: "success"`, and list totals either top-level or under `meta`.
//! Both spellings are accepted.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Single-object envelope: `{success, data}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: Option<bool>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        is_success(self.success, self.status.as_deref())
    }

    /// Payload of a successful envelope
    pub fn into_data(self) -> Result<T> {
        if !self.is_success() {
            return Err(Error::Unsuccessful(
                self.status.unwrap_or_else(|| "success=false".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| Error::Unsuccessful("missing data".to_string()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub total: Option<u64>,
}

/// List envelope: `{success, data: [...], total}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    #[serde(default)]
    pub success: Option<bool>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default = "Vec::new")]
    pub data: Vec<T>,

    #[serde(default)]
    pub total: Option<u64>,

    #[serde(default)]
    pub meta: Option<PageMeta>,
}

impl<T> PagedResponse<T> {
    pub fn is_success(&self) -> bool {
        is_success(self.success, self.status.as_deref())
    }

    /// Items and total of a successful envelope.
    ///
    /// A missing total falls back to the number of items returned, which
    /// marks the list as exhausted.
    pub fn into_page(self) -> Result<Page<T>> {
        if !self.is_success() {
            return Err(Error::Unsuccessful(
                self.status.unwrap_or_else(|| "success=false".to_string()),
            ));
        }
        let total = self
            .total
            .or_else(|| self.meta.as_ref().and_then(|m| m.total))
            .unwrap_or(self.data.len() as u64);
        Ok(Page {
            items: self.data,
            total,
        })
    }
}

/// One page of a server-side list
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

/// Error body: `{detail}`.
///
/// `detail` is a plain string for handled errors and a list of
/// `{loc, msg, type}` objects for request validation failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human-readable detail, if the server supplied one
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Array(entries) => {
                let msgs: Vec<&str> = entries
                    .iter()
                    .filter_map(|e| e.get("msg").and_then(|m| m.as_str()))
                    .collect();
                if msgs.is_empty() {
                    None
                } else {
                    Some(msgs.join("; "))
                }
            }
            _ => None,
        }
    }

    /// Parse a response body, tolerating non-JSON bodies
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

fn is_success(success: Option<bool>, status: Option<&str>) -> bool {
    match (success, status) {
        (Some(flag), _) => flag,
        (None, Some(status)) => status.eq_ignore_ascii_case("success"),
        (None, None) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paged_total_top_level() {
        let json = r#"{"success": true, "data": [1, 2, 3], "total": 25}"#;
        let page = serde_json::from_str::<PagedResponse<u32>>(json)
            .unwrap()
            .into_page()
            .unwrap();
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.total, 25);
    }

    #[test]
    fn test_paged_total_under_meta() {
        let json = r#"{"status": "success", "data": [1], "meta": {"page": 1, "total": 7}}"#;
        let page = serde_json::from_str::<PagedResponse<u32>>(json)
            .unwrap()
            .into_page()
            .unwrap();
        assert_eq!(page.total, 7);
    }

    #[test]
    fn test_paged_missing_total_means_exhausted() {
        let json = r#"{"success": true, "data": [1, 2]}"#;
        let page = serde_json::from_str::<PagedResponse<u32>>(json)
            .unwrap()
            .into_page()
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_unsuccessful_envelope() {
        let json = r#"{"success": false, "data": null}"#;
        let resp: ApiResponse<u32> = serde_json::from_str(json).unwrap();
        assert!(!resp.is_success());
        assert!(matches!(resp.into_data(), Err(Error::Unsuccessful(_))));
    }

    #[test]
    fn test_error_body_messages() {
        assert_eq!(
            ErrorBody::parse(r#"{"detail": "Solution not found"}"#).message(),
            Some("Solution not found".to_string())
        );
        let validation = r#"{"detail": [{"loc": ["body", "score"], "msg": "too large"}]}"#;
        assert_eq!(
            ErrorBody::parse(validation).message(),
            Some("too large".to_string())
        );
        assert_eq!(ErrorBody::parse("<html>").message(), None);
    }
}
