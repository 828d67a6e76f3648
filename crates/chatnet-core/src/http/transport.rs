//! Transport abstraction and the `reqwest`-backed implementation

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL};
use reqwest::Client as ReqwestClient;
use url::Url;

use crate::error::{NetworkError, Result};
use crate::http::interceptor::InterceptorChain;
use crate::http::request::Request;
use crate::http::response::Response;

/// Exchanges one full request for one full response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<Response>;
}

/// Construction-time settings of an [`HttpTransport`]
#[derive(Debug, Clone, Default)]
pub struct TransportConfig {
    /// Base URL relative request paths are appended to
    pub base_url: Option<String>,
    /// Headers sent with every request unless the request overrides them
    pub default_headers: HashMap<String, String>,
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }
}

/// Real network transport over `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    base_url: Option<String>,
    default_headers: HashMap<String, String>,
    interceptors: InterceptorChain,
}

impl HttpTransport {
    /// Create a transport; an unparseable base URL is rejected here
    pub fn new(config: TransportConfig, interceptors: InterceptorChain) -> Result<Self> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(|e| NetworkError::Unknown(format!("Failed to create HTTP client: {}", e)))?;
        Self::with_client(client, config, interceptors)
    }

    /// Create a transport around an existing `reqwest` client
    pub fn with_client(
        client: ReqwestClient,
        config: TransportConfig,
        interceptors: InterceptorChain,
    ) -> Result<Self> {
        if let Some(base_url) = &config.base_url {
            Url::parse(base_url)?;
        }

        Ok(Self {
            client,
            base_url: config.base_url,
            default_headers: config.default_headers,
            interceptors,
        })
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Final URL of `request` against this transport's base URL
    pub fn resolve_url(&self, request: &Request) -> Result<Url> {
        resolve_url(self.base_url.as_deref(), request)
    }

    fn build_request(&self, request: &Request, url: Url) -> Result<reqwest::Request> {
        let mut headers = HeaderMap::new();
        if let Some(own) = request.headers() {
            for (name, value) in own {
                let header_name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| NetworkError::Unknown(format!("Invalid header name {}: {}", name, e)))?;
                let header_value = HeaderValue::from_str(value)
                    .map_err(|e| NetworkError::Unknown(format!("Invalid value for header {}: {}", name, e)))?;
                headers.insert(header_name, header_value);
            }
        }
        if let Some(directive) = request.cache_policy().cache_control() {
            if !headers.contains_key(CACHE_CONTROL) {
                headers.insert(CACHE_CONTROL, HeaderValue::from_static(directive));
            }
        }

        let mut builder = self
            .client
            .request(request.method().into(), url)
            .headers(headers)
            .timeout(request.timeout());
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        builder
            .build()
            .map_err(|e| NetworkError::from_transport_error(&e))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request) -> Result<Response> {
        let request = request.merged_with_defaults(&self.default_headers);
        // Fail fast before any interceptor runs
        self.resolve_url(&request)?;

        let request = self.interceptors.apply_request(request).await?;
        let url = self.resolve_url(&request)?;
        let outbound = self.build_request(&request, url)?;

        tracing::debug!(method = %request.method(), url = %outbound.url(), "sending request");

        let response = self
            .client
            .execute(outbound)
            .await
            .map_err(|e| NetworkError::from_transport_error(&e))?;

        let status_code = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let data = response
            .bytes()
            .await
            .map_err(|e| NetworkError::from_transport_error(&e))?;

        tracing::debug!(status_code, bytes = data.len(), "received response");

        if let Some(error) = NetworkError::from_status_code(status_code, data.clone()) {
            return Err(error);
        }

        let response = Response::new(status_code, data)
            .with_headers(headers)
            .with_request(request);
        self.interceptors.apply_response(response).await
    }
}

/// Resolve the final URL of a request.
///
/// Absolute `http`/`https` paths are used as-is; anything else is appended
/// to `base_url` with exactly one `/` between the two. Query parameters are
/// appended in sorted key order.
pub fn resolve_url(base_url: Option<&str>, request: &Request) -> Result<Url> {
    let path = request.path();
    let mut url = match Url::parse(path) {
        Ok(absolute) if matches!(absolute.scheme(), "http" | "https") => absolute,
        _ => {
            let base = base_url.ok_or(NetworkError::InvalidUrl)?;
            Url::parse(&join_path(base, path))?
        }
    };

    if let Some(query) = request.query_parameters().filter(|q| !q.is_empty()) {
        let mut pairs: Vec<_> = query.iter().collect();
        pairs.sort();
        url.query_pairs_mut().extend_pairs(pairs);
    }

    Ok(url)
}

fn join_path(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut collected: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}
