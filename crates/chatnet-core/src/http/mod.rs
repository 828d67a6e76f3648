//! HTTP layer of the chat client
//!
//! This module provides:
//! - An immutable request value with builder-style combinators
//! - Response values with JSON decoding
//! - Ordered request/response interceptor chains
//! - Bearer authentication and redacting request logging
//! - A retry handler with deterministic exponential backoff
//! - A real `reqwest` transport and an in-memory mock transport

pub mod request;
pub mod response;
pub mod interceptor;
pub mod auth;
pub mod logging;
pub mod retry;
pub mod transport;
pub mod mock;
pub mod manager;

pub use request::{CachePolicy, Method, Request, DEFAULT_TIMEOUT};
pub use response::{Decoder, JsonDecoder, Response};
pub use interceptor::{InterceptorChain, RequestInterceptor, ResponseInterceptor};
pub use auth::{async_token_provider, AsyncTokenProvider, AuthInterceptor, TokenProvider};
pub use logging::{is_sensitive_header, LogLevel, LogSink, LoggingInterceptor};
pub use retry::{RetryConfig, RetryHandler};
pub use transport::{resolve_url, HttpTransport, Transport, TransportConfig};
pub use mock::MockTransport;
pub use manager::NetworkManager;
