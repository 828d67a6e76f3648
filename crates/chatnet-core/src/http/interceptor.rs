//! Request and response interceptor chains
//!
//! Interceptors are small capability objects run in the order they were
//! configured. Any interceptor may fail; the first failure aborts the rest of
//! the chain and is returned to the caller unchanged.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::http::request::Request;
use crate::http::response::Response;

/// Transforms an outbound request before it hits the network
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn intercept_request(&self, request: Request) -> Result<Request>;
}

/// Transforms a response before it is returned to the caller
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn intercept_response(&self, response: Response) -> Result<Response>;
}

#[async_trait]
impl<F> RequestInterceptor for F
where
    F: Fn(Request) -> Result<Request> + Send + Sync,
{
    async fn intercept_request(&self, request: Request) -> Result<Request> {
        self(request)
    }
}

#[async_trait]
impl<F> ResponseInterceptor for F
where
    F: Fn(Response) -> Result<Response> + Send + Sync,
{
    async fn intercept_response(&self, response: Response) -> Result<Response> {
        self(response)
    }
}

/// Ordered request and response pipelines owned by a transport
#[derive(Clone, Default)]
pub struct InterceptorChain {
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request interceptor to the end of the request pipeline
    pub fn with_request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    /// Append a response interceptor to the end of the response pipeline
    pub fn with_response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }

    /// Register one value in both pipelines
    pub fn with_interceptor<I>(self, interceptor: Arc<I>) -> Self
    where
        I: RequestInterceptor + ResponseInterceptor + 'static,
    {
        self.with_request_interceptor(interceptor.clone())
            .with_response_interceptor(interceptor)
    }

    pub fn request_interceptor_count(&self) -> usize {
        self.request_interceptors.len()
    }

    pub fn response_interceptor_count(&self) -> usize {
        self.response_interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.request_interceptors.is_empty() && self.response_interceptors.is_empty()
    }

    /// Run every request interceptor front to back
    pub async fn apply_request(&self, mut request: Request) -> Result<Request> {
        for interceptor in &self.request_interceptors {
            request = interceptor.intercept_request(request).await?;
        }
        Ok(request)
    }

    /// Run every response interceptor front to back
    pub async fn apply_response(&self, mut response: Response) -> Result<Response> {
        for interceptor in &self.response_interceptors {
            response = interceptor.intercept_response(response).await?;
        }
        Ok(response)
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .finish()
    }
}
