//! In-memory transport for deterministic tests
//!
//! `MockTransport` follows the same execution contract as
//! [`HttpTransport`](crate::http::HttpTransport): request interceptors, status
//! code mapping and response interceptors all run, only the network is
//! replaced by a table of registered responses keyed by request path.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::error::{NetworkError, Result};
use crate::http::interceptor::InterceptorChain;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::transport::Transport;

#[derive(Debug, Default)]
struct MockState {
    responses: HashMap<String, VecDeque<Response>>,
    recorded: Vec<Request>,
    failure: Option<NetworkError>,
    delay: Option<Duration>,
}

/// Deterministic [`Transport`] test double
#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
    interceptors: InterceptorChain,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock transport running `interceptors` around every call
    pub fn with_interceptors(interceptors: InterceptorChain) -> Self {
        Self {
            state: Mutex::default(),
            interceptors,
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve `response` for every request to `path`
    pub fn register_response(&self, path: impl Into<String>, response: Response) {
        self.register_sequence(path, vec![response]);
    }

    /// Serve `responses` in order; the last one keeps being served
    pub fn register_sequence(&self, path: impl Into<String>, responses: Vec<Response>) {
        self.state()
            .responses
            .insert(path.into(), responses.into_iter().collect());
    }

    /// Serve a JSON string body
    pub fn register_json(&self, path: impl Into<String>, json: impl Into<String>, status_code: u16) {
        self.register_response(path, Response::json(status_code, json));
    }

    /// Serve a serializable value encoded as JSON
    pub fn register_object<T: Serialize + ?Sized>(
        &self,
        path: impl Into<String>,
        object: &T,
        status_code: u16,
    ) -> Result<()> {
        let json = serde_json::to_string(object)
            .map_err(|e| NetworkError::EncodingFailed(e.to_string()))?;
        self.register_json(path, json, status_code);
        Ok(())
    }

    /// Serve raw bytes
    pub fn register_data(&self, path: impl Into<String>, data: impl Into<Bytes>, status_code: u16) {
        self.register_response(path, Response::new(status_code, data));
    }

    /// Fail every call with `error` until cleared with `None`
    pub fn set_failure(&self, error: Option<NetworkError>) {
        self.state().failure = error;
    }

    /// Sleep before answering each call
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state().delay = delay;
    }

    /// Requests seen so far, after request interceptors ran
    pub fn recorded_requests(&self) -> Vec<Request> {
        self.state().recorded.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state().recorded.len()
    }

    pub fn last_request(&self) -> Option<Request> {
        self.state().recorded.last().cloned()
    }

    pub fn reset_requests(&self) {
        self.state().recorded.clear();
    }

    pub fn reset_responses(&self) {
        self.state().responses.clear();
    }

    /// Clear recorded requests, registered responses, failure and delay
    pub fn reset(&self) {
        *self.state() = MockState::default();
    }

    fn next_response(&self, path: &str) -> Response {
        let mut state = self.state();
        match state.responses.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(default_response),
            Some(queue) => queue.front().cloned().unwrap_or_else(default_response),
            None => default_response(),
        }
    }
}

fn default_response() -> Response {
    Response::new(200, Bytes::new())
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: Request) -> Result<Response> {
        let request = self.interceptors.apply_request(request).await?;

        let delay = {
            let mut state = self.state();
            state.recorded.push(request.clone());
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.state().failure.clone();
        if let Some(error) = failure {
            return Err(error);
        }

        let response = self.next_response(request.path());
        if let Some(error) =
            NetworkError::from_status_code(response.status_code(), response.data().clone())
        {
            return Err(error);
        }

        let response = response.with_request(request);
        self.interceptors.apply_response(response).await
    }
}
