//! Authentication header injection
//!
//! Supports:
//! - Raw tokens in a configurable header
//! - Bearer tokens (`Authorization: Bearer <token>`)
//! - Synchronous or asynchronous token providers

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::http::interceptor::RequestInterceptor;
use crate::http::request::Request;

pub const AUTHORIZATION: &str = "Authorization";
pub const BEARER_PREFIX: &str = "Bearer ";

/// Supplies the current credential, if any
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// `Ok(None)` means "no credential", the request goes out unauthenticated
    async fn token(&self) -> Result<Option<String>>;
}

#[async_trait]
impl<F> TokenProvider for F
where
    F: Fn() -> Result<Option<String>> + Send + Sync,
{
    async fn token(&self) -> Result<Option<String>> {
        self()
    }
}

/// Adapter turning an async closure into a [`TokenProvider`]
pub struct AsyncTokenProvider<F, Fut> {
    provider: F,
    _future: PhantomData<fn() -> Fut>,
}

/// Wrap an async closure as a token provider
pub fn async_token_provider<F, Fut>(provider: F) -> AsyncTokenProvider<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<String>>> + Send + 'static,
{
    AsyncTokenProvider {
        provider,
        _future: PhantomData,
    }
}

#[async_trait]
impl<F, Fut> TokenProvider for AsyncTokenProvider<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<String>>> + Send + 'static,
{
    async fn token(&self) -> Result<Option<String>> {
        (self.provider)().await
    }
}

/// Injects the provider's token into every outbound request
#[derive(Clone)]
pub struct AuthInterceptor {
    provider: Arc<dyn TokenProvider>,
    header_name: String,
    prefix: String,
}

impl AuthInterceptor {
    /// Token is written verbatim into the `Authorization` header
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            header_name: AUTHORIZATION.to_string(),
            prefix: String::new(),
        }
    }

    /// `Authorization: Bearer <token>`
    pub fn bearer(provider: Arc<dyn TokenProvider>) -> Self {
        Self::new(provider).with_prefix(BEARER_PREFIX)
    }

    pub fn with_header_name(mut self, header_name: impl Into<String>) -> Self {
        self.header_name = header_name.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }
}

#[async_trait]
impl RequestInterceptor for AuthInterceptor {
    async fn intercept_request(&self, request: Request) -> Result<Request> {
        match self.provider.token().await? {
            Some(token) => Ok(request.with_header(
                self.header_name.clone(),
                format!("{}{}", self.prefix, token),
            )),
            None => Ok(request),
        }
    }
}

impl std::fmt::Debug for AuthInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthInterceptor")
            .field("header_name", &self.header_name)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
