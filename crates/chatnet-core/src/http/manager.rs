//! Network manager façade
//!
//! Provides a high-level interface for executing requests through any
//! [`Transport`], with optional JSON decoding and retry.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::config::NetworkConfig;
use crate::error::Result;
use crate::http::interceptor::InterceptorChain;
use crate::http::request::Request;
use crate::http::response::{Decoder, JsonDecoder, Response};
use crate::http::retry::{RetryConfig, RetryHandler};
use crate::http::transport::{HttpTransport, Transport};

/// Executes requests through a transport, optionally retrying
#[derive(Clone)]
pub struct NetworkManager {
    transport: Arc<dyn Transport>,
    retry_handler: Option<RetryHandler>,
}

impl NetworkManager {
    /// Manager with the default retry policy
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry_handler: Some(RetryHandler::default()),
        }
    }

    pub fn with_retry_handler(transport: Arc<dyn Transport>, retry_handler: RetryHandler) -> Self {
        Self {
            transport,
            retry_handler: Some(retry_handler),
        }
    }

    /// Manager whose `execute_with_retry*` calls make a single attempt
    pub fn without_retry(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            retry_handler: None,
        }
    }

    /// Build the real transport and retry policy from configuration.
    ///
    /// When `log_level` is not `none` a logging interceptor is appended after
    /// `interceptors`, so it sees each request as it goes on the wire.
    pub fn from_config(config: &NetworkConfig, interceptors: InterceptorChain) -> Result<Self> {
        config.validate()?;
        let interceptors = match config.logging_interceptor() {
            Some(logger) => interceptors.with_interceptor(Arc::new(logger)),
            None => interceptors,
        };
        let transport = HttpTransport::new(config.transport_config(), interceptors)?;
        Ok(Self::with_retry_handler(
            Arc::new(transport),
            RetryHandler::new(config.retry.clone()),
        ))
    }

    pub fn retry_handler(&self) -> Option<&RetryHandler> {
        self.retry_handler.as_ref()
    }

    /// Execute `request` exactly once
    pub async fn execute(&self, request: Request) -> Result<Response> {
        self.transport.execute(request).await
    }

    /// Execute once and decode the body as JSON
    pub async fn execute_decoded<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        self.execute_decoded_with(request, &JsonDecoder).await
    }

    pub async fn execute_decoded_with<T, D>(&self, request: Request, decoder: &D) -> Result<T>
    where
        T: DeserializeOwned,
        D: Decoder,
    {
        self.execute(request).await?.decode_with(decoder)
    }

    /// Execute under the retry policy
    pub async fn execute_with_retry(&self, request: Request) -> Result<Response> {
        match &self.retry_handler {
            Some(handler) => {
                handler
                    .execute(|| self.transport.execute(request.clone()))
                    .await
            }
            None => self.execute(request).await,
        }
    }

    /// Execute under the retry policy, then decode once
    pub async fn execute_with_retry_decoded<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        self.execute_with_retry_decoded_with(request, &JsonDecoder).await
    }

    pub async fn execute_with_retry_decoded_with<T, D>(
        &self,
        request: Request,
        decoder: &D,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        D: Decoder,
    {
        self.execute_with_retry(request).await?.decode_with(decoder)
    }

    /// Execute under the retry policy until `token` is cancelled
    pub async fn execute_with_retry_cancellable(
        &self,
        request: Request,
        token: &CancellationToken,
    ) -> Result<Response> {
        let handler = self
            .retry_handler
            .clone()
            .unwrap_or_else(|| RetryHandler::new(RetryConfig::new(0)));
        handler
            .execute_cancellable(|| self.transport.execute(request.clone()), token)
            .await
    }
}

impl std::fmt::Debug for NetworkManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkManager")
            .field("retry_handler", &self.retry_handler)
            .finish_non_exhaustive()
    }
}
