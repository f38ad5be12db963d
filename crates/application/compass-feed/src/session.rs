//! Authentication collaborator seen from the solution page.

use compass_client::RequestAuthorizer;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

pub trait Session: Send + Sync {
    /// A user is signed in
    fn is_authenticated(&self) -> bool;

    /// Ask the user to sign in
    fn prompt_login(&self);
}

/// Session backed by the bearer token in the authorizer's store.
///
/// A login prompt is recorded rather than shown; the front-end checks
/// [`TokenSession::login_requested`] after each operation.
#[derive(Debug)]
pub struct TokenSession {
    authorizer: RequestAuthorizer,
    login_requested: AtomicBool,
}

impl TokenSession {
    pub fn new(authorizer: RequestAuthorizer) -> Self {
        Self {
            authorizer,
            login_requested: AtomicBool::new(false),
        }
    }

    /// Whether a login prompt was raised, clearing the flag
    pub fn take_login_request(&self) -> bool {
        self.login_requested.swap(false, Ordering::SeqCst)
    }

    pub fn login_requested(&self) -> bool {
        self.login_requested.load(Ordering::SeqCst)
    }
}

impl Session for TokenSession {
    fn is_authenticated(&self) -> bool {
        self.authorizer.has_token()
    }

    fn prompt_login(&self) {
        warn!("login required");
        self.login_requested.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compass_client::{MemoryTokenStore, TokenStore};
    use std::sync::Arc;

    #[test]
    fn test_token_session_follows_store() {
        let store = Arc::new(MemoryTokenStore::new());
        let session = TokenSession::new(RequestAuthorizer::new(
            "http://api.test/api",
            store.clone(),
            "token",
        ));
        assert!(!session.is_authenticated());

        store.set("token", "abc").unwrap();
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_login_request_flag() {
        let session = TokenSession::new(RequestAuthorizer::new(
            "http://api.test/api",
            Arc::new(MemoryTokenStore::new()),
            "token",
        ));
        assert!(!session.login_requested());
        session.prompt_login();
        assert!(session.login_requested());
        assert!(session.take_login_request());
        assert!(!session.login_requested());
    }
}
