//! Request/response logging with header redaction
//!
//! Verbosity levels are cumulative: `Basic` prints the request line,
//! `Headers` adds sorted headers with credentials masked, `Body` adds the
//! payload.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::http::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::http::request::Request;
use crate::http::response::Response;

/// Longest body text printed before truncation, in characters
pub const MAX_BODY_LOG_CHARS: usize = 1000;

pub const MASKED_VALUE: &str = "***";

/// Logging verbosity, each level a superset of the previous one
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    None,
    #[default]
    Basic,
    Headers,
    Body,
}

/// Plain-text consumer of rendered log entries
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Logs every request and response passing through the chain
#[derive(Clone)]
pub struct LoggingInterceptor {
    level: LogLevel,
    sink: Option<LogSink>,
    console: bool,
}

impl LoggingInterceptor {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            sink: None,
            console: true,
        }
    }

    /// Send entries to `sink` instead of the console
    pub fn with_sink(mut self, sink: LogSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Toggle the `tracing` fallback used when no sink is set
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Render the entry for an outbound request, `None` at `LogLevel::None`
    pub fn format_request(&self, request: &Request) -> Option<String> {
        if self.level == LogLevel::None {
            return None;
        }

        let mut entry = format!("→ {} {}", request.method(), request_target(request));
        if self.level >= LogLevel::Headers {
            if let Some(headers) = request.headers() {
                write_headers(&mut entry, headers);
            }
        }
        if self.level >= LogLevel::Body {
            if let Some(body) = request.body() {
                write_body(&mut entry, body);
            }
        }
        Some(entry)
    }

    /// Render the entry for a received response, `None` at `LogLevel::None`
    pub fn format_response(&self, response: &Response) -> Option<String> {
        if self.level == LogLevel::None {
            return None;
        }

        let mut entry = format!("← {}", response.status_code());
        if let Some(request) = response.request() {
            let _ = write!(entry, " {} {}", request.method(), request_target(request));
        }
        if self.level >= LogLevel::Headers {
            write_headers(&mut entry, response.headers());
        }
        if self.level >= LogLevel::Body {
            write_body(&mut entry, response.data());
        }
        Some(entry)
    }

    fn emit(&self, entry: &str) {
        match &self.sink {
            Some(sink) => sink(entry),
            None if self.console => tracing::info!(target: "chatnet::http", "{}", entry),
            None => {}
        }
    }
}

#[async_trait]
impl RequestInterceptor for LoggingInterceptor {
    async fn intercept_request(&self, request: Request) -> Result<Request> {
        if let Some(entry) = self.format_request(&request) {
            self.emit(&entry);
        }
        Ok(request)
    }
}

#[async_trait]
impl ResponseInterceptor for LoggingInterceptor {
    async fn intercept_response(&self, response: Response) -> Result<Response> {
        if let Some(entry) = self.format_response(&response) {
            self.emit(&entry);
        }
        Ok(response)
    }
}

impl std::fmt::Debug for LoggingInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingInterceptor")
            .field("level", &self.level)
            .field("has_sink", &self.sink.is_some())
            .field("console", &self.console)
            .finish()
    }
}

/// Whether a header value must never be printed
pub fn is_sensitive_header(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower == "authorization" || lower == "cookie" || lower.contains("api-key")
}

fn request_target(request: &Request) -> String {
    let mut target = request.path().to_string();
    if let Some(query) = request.query_parameters().filter(|q| !q.is_empty()) {
        let mut pairs: Vec<_> = query.iter().collect();
        pairs.sort();
        let rendered: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
        target.push(if target.contains('?') { '&' } else { '?' });
        target.push_str(&rendered.join("&"));
    }
    target
}

fn write_headers(entry: &mut String, headers: &HashMap<String, String>) {
    let mut sorted: Vec<_> = headers.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in sorted {
        let shown = if is_sensitive_header(name) {
            MASKED_VALUE
        } else {
            value.as_str()
        };
        let _ = write!(entry, "\n  {name}: {shown}");
    }
}

fn write_body(entry: &mut String, body: &Bytes) {
    if body.is_empty() {
        return;
    }
    match std::str::from_utf8(body) {
        Ok(text) => {
            let mut chars = text.char_indices();
            match chars.nth(MAX_BODY_LOG_CHARS) {
                Some((cut, _)) => {
                    let _ = write!(entry, "\n  {}...", &text[..cut]);
                }
                None => {
                    let _ = write!(entry, "\n  {text}");
                }
            }
        }
        Err(_) => {
            let _ = write!(entry, "\n  <binary data: {} bytes>", body.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn capture(level: LogLevel) -> (LoggingInterceptor, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink_lines = lines.clone();
        let sink: LogSink = Arc::new(move |line: &str| {
            sink_lines.lock().unwrap().push(line.to_string());
        });
        (LoggingInterceptor::new(level).with_sink(sink), lines)
    }

    fn sample_request() -> Request {
        Request::post("/messages", r#"{"text":"hi"}"#, "application/json")
            .with_header("Authorization", "secret-token")
            .with_header("X-Request-Id", "req-1")
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(LogLevel::None < LogLevel::Basic);
        assert!(LogLevel::Basic < LogLevel::Headers);
        assert!(LogLevel::Headers < LogLevel::Body);
    }

    #[test]
    fn test_none_logs_nothing() {
        let logger = LoggingInterceptor::new(LogLevel::None);
        assert!(logger.format_request(&sample_request()).is_none());
        assert!(logger.format_response(&Response::new(200, "")).is_none());
    }

    #[test]
    fn test_basic_has_no_headers_or_body() {
        let logger = LoggingInterceptor::new(LogLevel::Basic);
        let entry = logger.format_request(&sample_request()).unwrap();
        assert!(entry.contains("POST"));
        assert!(entry.contains("/messages"));
        assert!(!entry.contains("X-Request-Id"));
        assert!(!entry.contains("\"text\""));
    }

    #[test]
    fn test_headers_are_sorted_and_masked() {
        let logger = LoggingInterceptor::new(LogLevel::Headers);
        let entry = logger.format_request(&sample_request()).unwrap();

        assert!(entry.contains("Authorization: ***"));
        assert!(!entry.contains("secret-token"));
        let auth = entry.find("Authorization").unwrap();
        let content_type = entry.find("Content-Type").unwrap();
        let request_id = entry.find("X-Request-Id: req-1").unwrap();
        assert!(auth < content_type && content_type < request_id);
        assert!(!entry.contains("\"text\""));
    }

    #[test]
    fn test_sensitive_header_names() {
        assert!(is_sensitive_header("authorization"));
        assert!(is_sensitive_header("COOKIE"));
        assert!(is_sensitive_header("X-API-Key"));
        assert!(is_sensitive_header("x-api-key-secondary"));
        assert!(!is_sensitive_header("Content-Type"));
        assert!(!is_sensitive_header("X-Api-Version"));
    }

    #[test]
    fn test_body_level_includes_text() {
        let logger = LoggingInterceptor::new(LogLevel::Body);
        let entry = logger.format_request(&sample_request()).unwrap();
        assert!(entry.contains(r#"{"text":"hi"}"#));
        assert!(entry.contains("Authorization: ***"));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let logger = LoggingInterceptor::new(LogLevel::Body);
        let response = Response::new(200, "a".repeat(1500));
        let entry = logger.format_response(&response).unwrap();

        assert!(entry.contains(&format!("{}...", "a".repeat(MAX_BODY_LOG_CHARS))));
        assert!(!entry.contains(&"a".repeat(MAX_BODY_LOG_CHARS + 1)));
    }

    #[test]
    fn test_body_at_limit_is_not_truncated() {
        let logger = LoggingInterceptor::new(LogLevel::Body);
        let response = Response::new(200, "b".repeat(MAX_BODY_LOG_CHARS));
        let entry = logger.format_response(&response).unwrap();
        assert!(!entry.contains("..."));
    }

    #[test]
    fn test_binary_body_summary() {
        let logger = LoggingInterceptor::new(LogLevel::Body);
        let response = Response::new(200, vec![0xFFu8, 0xD8, 0xFF, 0xE0]);
        let entry = logger.format_response(&response).unwrap();
        assert!(entry.contains("<binary data: 4 bytes>"));
    }

    #[test]
    fn test_query_is_rendered_sorted() {
        let logger = LoggingInterceptor::new(LogLevel::Basic);
        let request = Request::get("/rooms").with_query([("page", "1"), ("limit", "20")]);
        let entry = logger.format_request(&request).unwrap();
        assert!(entry.contains("/rooms?limit=20&page=1"));
    }

    #[tokio::test]
    async fn test_interceptor_writes_to_sink_and_does_not_mutate() {
        let (logger, lines) = capture(LogLevel::Headers);
        let request = sample_request();

        let passed = logger.intercept_request(request.clone()).await.unwrap();
        assert_eq!(passed, request);

        let response = Response::new(201, "").with_request(request);
        let returned = logger.intercept_response(response.clone()).await.unwrap();
        assert_eq!(returned, response);

        let lines = lines.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("→ POST /messages"));
        assert!(lines[1].starts_with("← 201 POST /messages"));
        assert!(lines.iter().all(|line| !line.contains("secret-token")));
    }
}
