//! # Compass Client
//!
//! Typed access to the Compass catalog API.
//!
//! ```text
//! ┌───────────┐   ┌───────────────────┐   ┌───────────┐   ┌──────────┐
//! │ ApiClient │──>│ RequestAuthorizer │──>│ Transport │──>│ REST API │
//! │ (typed)   │   │ (bearer header?)  │   │ (reqwest) │   │          │
//! └───────────┘   └───────────────────┘   └───────────┘   └──────────┘
//!                           │
//!                     ┌────────────┐
//!                     │ TokenStore │
//!                     └────────────┘
//! ```
//!
//! Every outgoing request passes through the [`RequestAuthorizer`], which
//! decides from the URL and method alone whether the stored bearer token is
//! attached. Rejection of unauthenticated requests is left to the server.

pub mod api;
pub mod authorizer;
pub mod request;
pub mod token;
pub mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use api::ApiClient;
pub use authorizer::RequestAuthorizer;
pub use request::{HttpRequest, HttpResponse, Method};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{ReqwestTransport, Transport};

/// Result type for compass-client operations
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Status { status: u16, detail: Option<String> },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(#[from] compass_core::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Token store error: {0}")]
    Store(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server answered 401
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Server-supplied `detail`, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}
