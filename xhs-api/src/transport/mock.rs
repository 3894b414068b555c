//! Mock transport for testing.
//!
//! Responses are registered per endpoint path; every sent request is
//! recorded for inspection.

use super::{AsyncTransport, HttpRequest, HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Reply = Result<HttpResponse, TransportError>;

/// Scripted transport. Clones share state.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    queued: HashMap<String, VecDeque<Reply>>,
    sticky: HashMap<String, Reply>,
    sent: Vec<HttpRequest>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A test that panicked mid-call must not hide the recorded state.
    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a reply for the next call to `path`. Queued replies are
    /// consumed in order before any [`respond_always`](Self::respond_always)
    /// reply.
    pub fn respond(&self, path: &str, reply: Reply) {
        let mut inner = self.lock();
        inner
            .queued
            .entry(path.to_owned())
            .or_default()
            .push_back(reply);
    }

    /// Reply to every call to `path` with `reply`.
    pub fn respond_always(&self, path: &str, reply: Reply) {
        let mut inner = self.lock();
        inner.sticky.insert(path.to_owned(), reply);
    }

    /// Shorthand: every call to `path` gets a 200 with this envelope.
    pub fn respond_json(&self, path: &str, json: &serde_json::Value) {
        self.respond_always(path, Ok(HttpResponse::json(json)));
    }

    /// All requests sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().sent.clone()
    }

    /// Number of requests sent to `path`.
    pub fn calls(&self, path: &str) -> usize {
        let inner = self.lock();
        inner.sent.iter().filter(|r| r.path == path).count()
    }

    /// Last request sent to `path`.
    pub fn last(&self, path: &str) -> Option<HttpRequest> {
        let inner = self.lock();
        inner.sent.iter().rev().find(|r| r.path == path).cloned()
    }

    fn reply(&self, request: &HttpRequest) -> Reply {
        let mut inner = self.lock();
        inner.sent.push(request.clone());
        if let Some(reply) = inner
            .queued
            .get_mut(&request.path)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        inner.sticky.get(&request.path).cloned().unwrap_or_else(|| {
            Err(TransportError::Request(format!(
                "no mock response for {}",
                request.path
            )))
        })
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest) -> Reply {
        self.reply(request)
    }
}

#[async_trait]
impl AsyncTransport for MockTransport {
    async fn send(&self, request: &HttpRequest) -> Reply {
        self.reply(request)
    }
}
