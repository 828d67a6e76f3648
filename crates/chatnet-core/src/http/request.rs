//! Outbound request descriptor
//!
//! A [`Request`] is an immutable value. The `with_*` combinators consume the
//! value and return a new one; none of them can change the path.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};

/// Default per-attempt timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
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

/// Whether and how a transport may reuse a cached response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Follow whatever the protocol and the server headers allow
    #[default]
    UseProtocolCachePolicy,
    /// Always go to the origin
    ReloadIgnoringLocalCacheData,
    /// Use cached data of any age, load only when nothing is cached
    ReturnCacheDataElseLoad,
    /// Use cached data of any age, never load
    ReturnCacheDataDontLoad,
}

impl CachePolicy {
    /// `Cache-Control` request directive for this policy
    pub fn cache_control(&self) -> Option<&'static str> {
        match self {
            CachePolicy::UseProtocolCachePolicy => None,
            CachePolicy::ReloadIgnoringLocalCacheData => Some("no-cache"),
            CachePolicy::ReturnCacheDataElseLoad => Some("max-stale"),
            CachePolicy::ReturnCacheDataDontLoad => Some("only-if-cached"),
        }
    }
}

/// Immutable descriptor of one HTTP call
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    path: String,
    method: Method,
    query_parameters: Option<HashMap<String, String>>,
    headers: Option<HashMap<String, String>>,
    body: Option<Bytes>,
    timeout: Duration,
    cache_policy: CachePolicy,
}

impl Request {
    /// Create a request with no query, headers or body
    pub fn new(path: impl Into<String>, method: Method) -> Self {
        Self {
            path: path.into(),
            method,
            query_parameters: None,
            headers: None,
            body: None,
            timeout: DEFAULT_TIMEOUT,
            cache_policy: CachePolicy::default(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path, Method::Get)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(path, Method::Delete)
    }

    /// POST with a raw body and explicit content type
    pub fn post(path: impl Into<String>, body: impl Into<Bytes>, content_type: &str) -> Self {
        Self::with_raw_body(path, Method::Post, body, content_type)
    }

    /// PUT with a raw body and explicit content type
    pub fn put(path: impl Into<String>, body: impl Into<Bytes>, content_type: &str) -> Self {
        Self::with_raw_body(path, Method::Put, body, content_type)
    }

    /// PATCH with a raw body and explicit content type
    pub fn patch(path: impl Into<String>, body: impl Into<Bytes>, content_type: &str) -> Self {
        Self::with_raw_body(path, Method::Patch, body, content_type)
    }

    /// POST with a JSON-serialized payload
    pub fn post_json<T: Serialize + ?Sized>(path: impl Into<String>, payload: &T) -> Result<Self> {
        Self::with_json_body(path, Method::Post, payload)
    }

    /// PUT with a JSON-serialized payload
    pub fn put_json<T: Serialize + ?Sized>(path: impl Into<String>, payload: &T) -> Result<Self> {
        Self::with_json_body(path, Method::Put, payload)
    }

    /// PATCH with a JSON-serialized payload
    pub fn patch_json<T: Serialize + ?Sized>(path: impl Into<String>, payload: &T) -> Result<Self> {
        Self::with_json_body(path, Method::Patch, payload)
    }

    fn with_raw_body(
        path: impl Into<String>,
        method: Method,
        body: impl Into<Bytes>,
        content_type: &str,
    ) -> Self {
        Self::new(path, method)
            .with_body(body)
            .with_header(CONTENT_TYPE, content_type)
    }

    fn with_json_body<T: Serialize + ?Sized>(
        path: impl Into<String>,
        method: Method,
        payload: &T,
    ) -> Result<Self> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| NetworkError::EncodingFailed(e.to_string()))?;
        Ok(Self::with_raw_body(path, method, body, APPLICATION_JSON))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn query_parameters(&self) -> Option<&HashMap<String, String>> {
        self.query_parameters.as_ref()
    }

    pub fn headers(&self) -> Option<&HashMap<String, String>> {
        self.headers.as_ref()
    }

    /// Look up a header by name, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        })
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.cache_policy
    }

    /// Add one query parameter, replacing an existing key
    pub fn with_query_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_parameters
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Merge query parameters over the existing ones
    pub fn with_query<I, K, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let query = self.query_parameters.get_or_insert_with(HashMap::new);
        for (key, value) in parameters {
            query.insert(key.into(), value.into());
        }
        self
    }

    /// Set one header; an existing header with the same name (any case) is replaced
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let headers = self.headers.get_or_insert_with(HashMap::new);
        headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        headers.insert(name, value.into());
        self
    }

    /// Merge headers over the existing ones
    pub fn with_headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        headers
            .into_iter()
            .fold(self, |request, (name, value)| request.with_header(name, value))
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }

    /// Merge transport default headers underneath this request's headers.
    ///
    /// Request headers win on a case-insensitive name collision.
    pub fn merged_with_defaults(mut self, defaults: &HashMap<String, String>) -> Self {
        if defaults.is_empty() {
            return self;
        }

        let mut merged: HashMap<String, String> = defaults
            .iter()
            .filter(|(name, _)| self.header(name).is_none())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        if let Some(own) = self.headers.take() {
            merged.extend(own);
        }
        self.headers = Some(merged);
        self
    }
}
