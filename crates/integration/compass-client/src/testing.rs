//! In-memory transport for tests.
//!
//! Answers every request through a closure, records what was sent, and can
//! hold requests open until released so callers can observe in-flight state.

use crate::request::{HttpRequest, HttpResponse};
use crate::transport::Transport;
use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

type Responder = dyn Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync;

/// Transport answering from a closure
pub struct ScriptedTransport {
    responder: Box<Responder>,
    requests: Mutex<Vec<HttpRequest>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

/// Holds requests issued after [`ScriptedTransport::hold`] until released
#[derive(Clone)]
pub struct Gate {
    semaphore: Arc<Semaphore>,
}

impl Gate {
    /// Let every held and future request through
    pub fn release(&self) {
        self.semaphore.close();
    }
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        }
    }

    /// JSON response helper
    pub fn reply(status: u16, body: serde_json::Value) -> Result<HttpResponse> {
        Ok(HttpResponse::new(status, body.to_string()))
    }

    /// Page of `total` numbered items shaped by `make`, windowed by the
    /// request's `skip`/`limit`
    pub fn paged<F>(request: &HttpRequest, total: u64, make: F) -> Result<HttpResponse>
    where
        F: Fn(u64) -> serde_json::Value,
    {
        let skip: u64 = request
            .query_param("skip")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let limit: u64 = request
            .query_param("limit")
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);
        let end = total.min(skip.saturating_add(limit));
        let data: Vec<serde_json::Value> = (skip..end).map(make).collect();
        Self::reply(
            200,
            serde_json::json!({"success": true, "data": data, "total": total}),
        )
    }

    /// Hold requests issued from now on until the returned gate is released
    pub fn hold(&self) -> Gate {
        let semaphore = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap_or_else(|e| e.into_inner()) = Some(semaphore.clone());
        Gate { semaphore }
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Requests whose URL contains `needle`
    pub fn count_matching(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.url.contains(needle))
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let gate = self.gate.lock().unwrap_or_else(|e| e.into_inner()).clone();
        if let Some(semaphore) = gate {
            // Closed on release; acquiring then fails and the request proceeds
            let _ = semaphore.acquire().await;
        }

        (self.responder)(&request)
    }
}
