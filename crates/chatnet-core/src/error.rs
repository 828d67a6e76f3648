//! Error taxonomy for the networking core
//!
//! Every failure surfaced to a caller is one of the [`NetworkError`] variants.
//! Raw transport, serializer and decoder errors are remapped at the point
//! where they are caught; an already-typed `NetworkError` is always propagated
//! unchanged.

use std::error::Error as StdError;
use std::io;

use bytes::Bytes;
use thiserror::Error;

/// Normalized error kinds produced by the networking core.
///
/// The `Display` output of each variant is the stable, user-facing
/// description for that kind of failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The request URL could not be built or resolved
    #[error("The request URL is invalid.")]
    InvalidUrl,

    /// The transport produced something that is not a usable HTTP response
    #[error("The server returned an invalid response.")]
    InvalidResponse,

    /// HTTP 401
    #[error("Authentication required. Please sign in again.")]
    Unauthorized,

    /// HTTP 403
    #[error("You don't have permission to access this resource.")]
    Forbidden,

    /// HTTP 404
    #[error("The requested resource was not found.")]
    NotFound,

    /// HTTP 408 or a transport-level timeout
    #[error("The request timed out. Please try again.")]
    Timeout,

    /// Any 5xx status
    #[error("Server error ({status_code}). Please try again later.")]
    ServerError { status_code: u16 },

    /// Any other non-2xx status, with the raw response body
    #[error("Request failed with status code {status_code}.")]
    HttpError { status_code: u16, data: Bytes },

    /// The device is offline or the connection dropped
    #[error("No internet connection. Please check your network settings.")]
    NoConnection,

    /// The call was cancelled before it completed
    #[error("The request was cancelled.")]
    Cancelled,

    /// The response body could not be decoded into the requested type
    #[error("Failed to decode the response: {0}")]
    DecodingFailed(String),

    /// A request payload could not be serialized at construction time
    #[error("Failed to encode the request body: {0}")]
    EncodingFailed(String),

    /// Anything the taxonomy does not recognize
    #[error("An unexpected error occurred: {0}")]
    Unknown(String),
}

/// Convenience type alias for Results using [`NetworkError`]
pub type Result<T> = std::result::Result<T, NetworkError>;

impl NetworkError {
    /// Map an HTTP status code to an error, `None` for 2xx.
    pub fn from_status_code(status_code: u16, data: impl Into<Bytes>) -> Option<Self> {
        match status_code {
            200..=299 => None,
            401 => Some(NetworkError::Unauthorized),
            403 => Some(NetworkError::Forbidden),
            404 => Some(NetworkError::NotFound),
            408 => Some(NetworkError::Timeout),
            500..=599 => Some(NetworkError::ServerError { status_code }),
            _ => Some(NetworkError::HttpError {
                status_code,
                data: data.into(),
            }),
        }
    }

    /// Map a `reqwest` failure into the taxonomy.
    ///
    /// The source chain is searched for an `io::Error` first since hyper
    /// reports dropped connections as a generic request error.
    pub fn from_transport_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return NetworkError::Timeout;
        }

        if let Some(io_error) = find_io_error(error) {
            let mapped = Self::from_io_error(io_error);
            if !matches!(mapped, NetworkError::Unknown(_)) {
                return mapped;
            }
        }

        if error.is_connect() {
            return NetworkError::NoConnection;
        }

        if error.is_builder() && find_source::<url::ParseError>(error).is_some() {
            return NetworkError::InvalidUrl;
        }

        if error.is_decode() {
            return NetworkError::InvalidResponse;
        }

        NetworkError::Unknown(error.to_string())
    }

    /// Classify a platform-level I/O failure.
    pub fn from_io_error(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::TimedOut => NetworkError::Timeout,
            io::ErrorKind::NotConnected
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => NetworkError::NoConnection,
            io::ErrorKind::Interrupted => NetworkError::Cancelled,
            _ => NetworkError::Unknown(error.to_string()),
        }
    }

    /// HTTP status code carried by this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetworkError::Unauthorized => Some(401),
            NetworkError::Forbidden => Some(403),
            NetworkError::NotFound => Some(404),
            NetworkError::ServerError { status_code }
            | NetworkError::HttpError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        NetworkError::DecodingFailed(err.to_string())
    }
}

impl From<url::ParseError> for NetworkError {
    fn from(_: url::ParseError) -> Self {
        NetworkError::InvalidUrl
    }
}

fn find_io_error(error: &reqwest::Error) -> Option<&io::Error> {
    find_source::<io::Error>(error)
}

fn find_source<'a, T: StdError + 'static>(error: &'a (dyn StdError + 'static)) -> Option<&'a T> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = current {
        if let Some(found) = err.downcast_ref::<T>() {
            return Some(found);
        }
        current = err.source();
    }
    None
}
