//! Chatnet Core - HTTP networking for the chat client
//!
//! Every call the client makes to its backend goes through this crate:
//! requests are described as plain values, passed through an ordered chain of
//! interceptors, executed by a [`Transport`](http::Transport) and either
//! returned as a [`Response`](http::Response) or mapped onto the closed
//! [`NetworkError`] taxonomy.
//!
//! # Main Components
//!
//! - **Error Handling**: `NetworkError`, a `thiserror` enum with user-facing messages
//! - **Requests and Responses**: immutable values with JSON helpers
//! - **Interceptors**: bearer authentication and header-redacting logging
//! - **Retry**: deterministic exponential backoff with cancellation
//! - **Transports**: `reqwest`-backed `HttpTransport` and `MockTransport`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chatnet_core::{AuthInterceptor, InterceptorChain, NetworkConfig, NetworkManager, Request, Result};
//!
//! #[derive(serde::Deserialize)]
//! struct Room {
//!     id: u64,
//! }
//!
//! async fn example() -> Result<()> {
//!     let auth = AuthInterceptor::bearer(Arc::new(|| -> Result<Option<String>> {
//!         Ok(Some("token".to_string()))
//!     }));
//!     let chain = InterceptorChain::new().with_request_interceptor(Arc::new(auth));
//!     let config = NetworkConfig::new().with_base_url("https://chat.example.com/api");
//!     let manager = NetworkManager::from_config(&config, chain)?;
//!
//!     let rooms: Vec<Room> = manager
//!         .execute_with_retry_decoded(Request::get("/rooms").with_query_parameter("page", "1"))
//!         .await?;
//!     println!("{} rooms", rooms.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;

// Re-export main types for convenience
pub use config::NetworkConfig;
pub use error::{NetworkError, Result};
pub use http::{
    // Values
    CachePolicy, Method, Request, Response,

    // Interceptors
    AuthInterceptor, InterceptorChain, LogLevel, LoggingInterceptor, RequestInterceptor,
    ResponseInterceptor, TokenProvider,

    // Execution
    HttpTransport, MockTransport, NetworkManager, RetryConfig, RetryHandler, Transport,
    TransportConfig,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
