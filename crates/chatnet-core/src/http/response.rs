//! Completed-call result and body decoding

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{NetworkError, Result};
use crate::http::request::Request;

/// Turns raw response bytes into a typed value.
///
/// Failures are reported as plain messages and wrapped into
/// [`NetworkError::DecodingFailed`] by the caller.
pub trait Decoder: Send + Sync {
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> std::result::Result<T, String>;
}

/// Default `serde_json` decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> std::result::Result<T, String> {
        serde_json::from_slice(data).map_err(|e| e.to_string())
    }
}

/// Immutable result of a completed call
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    data: Bytes,
    status_code: u16,
    headers: HashMap<String, String>,
    request: Option<Request>,
}

impl Response {
    pub fn new(status_code: u16, data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            status_code,
            headers: HashMap::new(),
            request: None,
        }
    }

    /// Response with a JSON body and matching content type
    pub fn json(status_code: u16, body: impl Into<String>) -> Self {
        Self::new(status_code, body.into()).with_header("Content-Type", "application/json")
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Attach the originating request for correlation
    pub fn with_request(mut self, request: Request) -> Self {
        self.request = Some(request);
        self
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Look up a header by name, ignoring ASCII case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn request(&self) -> Option<&Request> {
        self.request.as_ref()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Decode the body as JSON
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        self.decode_with(&JsonDecoder)
    }

    pub fn decode_with<T: DeserializeOwned, D: Decoder>(&self, decoder: &D) -> Result<T> {
        decoder
            .decode(&self.data)
            .map_err(NetworkError::DecodingFailed)
    }

    /// Body as UTF-8 text, `None` when the bytes are not valid UTF-8
    pub fn text(&self) -> Option<String> {
        std::str::from_utf8(&self.data).ok().map(str::to_owned)
    }

    /// Body as UTF-8 text with invalid sequences replaced
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}
