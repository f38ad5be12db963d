//! Conditional bearer-token injection.
//!
//! Rules, first match wins:
//!
//! 1. URL is exactly `{api_base}/users/me`, or contains `/solutions/my/`
//!    → attach
//! 2. URL is under `{api_base}` and the method is POST or PUT → attach
//! 3. Anything else → leave alone
//!
//! Attaching without a stored token is a silent no-op: the request goes out
//! unauthenticated and the server decides.

use crate::request::{HttpRequest, Method, AUTHORIZATION};
use crate::token::TokenStore;
use std::sync::Arc;
use tracing::trace;

/// Path of the current-user endpoint, relative to the API base
pub const CURRENT_USER_PATH: &str = "/users/me";

/// Path segment of the caller's own solutions
pub const MY_SOLUTIONS_SEGMENT: &str = "/solutions/my/";

/// Decides which outgoing requests carry the stored bearer token
#[derive(Clone)]
pub struct RequestAuthorizer {
    api_base: String,
    token_key: String,
    store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for RequestAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAuthorizer")
            .field("api_base", &self.api_base)
            .field("token_key", &self.token_key)
            .finish()
    }
}

impl RequestAuthorizer {
    pub fn new(
        api_base: impl Into<String>,
        store: Arc<dyn TokenStore>,
        token_key: impl Into<String>,
    ) -> Self {
        Self {
            api_base: canonical_base(&api_base.into()),
            token_key: token_key.into(),
            store,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Stored bearer token, if any
    pub fn token(&self) -> Option<String> {
        self.store.get(&self.token_key)
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// Whether `request` should carry the token. Pure; ignores the store.
    pub fn decide(&self, request: &HttpRequest) -> bool {
        let url = request.url.as_str();

        if url == self.current_user_url() || url.contains(MY_SOLUTIONS_SEGMENT) {
            return true;
        }

        if self.is_under_api_base(url) && matches!(request.method, Method::Post | Method::Put) {
            return true;
        }

        false
    }

    /// The request to actually send: a decorated copy when the rules match
    /// and a token is stored, otherwise an unchanged copy.
    pub fn authorize(&self, request: &HttpRequest) -> HttpRequest {
        if !self.decide(request) {
            return request.clone();
        }

        match self.token() {
            Some(token) => {
                trace!(method = %request.method, url = %request.url, "attaching bearer token");
                request.with_header(AUTHORIZATION, &format!("Bearer {token}"))
            }
            None => {
                trace!(method = %request.method, url = %request.url, "no stored token");
                request.clone()
            }
        }
    }

    fn current_user_url(&self) -> String {
        format!("{}{}", self.api_base, CURRENT_USER_PATH)
    }

    /// `url` is the API base itself or a path/query below it
    fn is_under_api_base(&self, url: &str) -> bool {
        match url.strip_prefix(self.api_base.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
            None => false,
        }
    }
}

/// `raw` as `url::Url` serializes it, without trailing slashes. Endpoint URLs
/// are built from the same form, so prefix checks against them hold even when
/// the configured base has an upper-case host, a default port or dot segments.
pub fn canonical_base(raw: &str) -> String {
    let raw = raw.trim();
    match url::Url::parse(raw) {
        Ok(url) => url.as_str().trim_end_matches('/').to_string(),
        Err(_) => raw.trim_end_matches('/').to_string(),
    }
}
