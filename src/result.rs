use http::{Method, StatusCode};

use crate::content::Body;
use crate::error::ResultError;
use crate::headers::Headers;
use crate::uri::XUri;

/// The transport-level failure attached to a result.
///
/// Surfaced as data rather than an error: status classification helpers are
/// oblivious to transport failures, so callers must check both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    /// Non-zero transport error code.
    pub code: i32,
    /// Human-readable failure message, when the transport supplied one.
    pub message: Option<String>,
}

/// The request that produced a result, for tracing and log output.
#[derive(Debug, Clone)]
pub struct RequestTrace {
    /// The HTTP method of the originating request.
    pub method: Method,
    /// The URI the request targeted.
    pub uri: XUri,
}

/// A response value object: status, headers, body and transport outcome.
///
/// Unsuccessful statuses are not errors here; classification predicates
/// operate purely on the numeric status code and callers (or
/// [`crate::ApiPlug`]) decide what to raise.
#[derive(Debug, Clone, Default)]
pub struct HttpResult {
    status: Option<StatusCode>,
    headers: Headers,
    body: Option<Body>,
    failure: Option<TransportFailure>,
    request: Option<RequestTrace>,
}

impl HttpResult {
    /// Creates a result from the transport-facing parts.
    pub fn new(status: StatusCode, headers: Headers, body: Option<Body>) -> Self {
        Self {
            status: Some(status),
            headers,
            body,
            failure: None,
            request: None,
        }
    }

    /// Creates a result carrying only a status code. Useful for canned mock
    /// results.
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status, Headers::new(), None)
    }

    /// Creates a result representing a transport-level failure.
    pub fn from_failure(code: i32, message: Option<String>) -> Self {
        Self {
            status: None,
            headers: Headers::new(),
            body: None,
            failure: Some(TransportFailure { code, message }),
            request: None,
        }
    }

    /// Returns a copy with the given body.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns a copy with a header appended.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.add(name, value);
        self
    }

    pub(crate) fn stamp_request(&mut self, method: Method, uri: XUri) {
        self.request = Some(RequestTrace { method, uri });
    }

    /// The response status code, absent on transport failure.
    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The response headers.
    #[inline]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The response body, if any.
    #[inline]
    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// The transport failure, if the exchange never produced a status.
    #[inline]
    pub fn failure(&self) -> Option<&TransportFailure> {
        self.failure.as_ref()
    }

    /// The originating request, stamped by the invoking plug.
    #[inline]
    pub fn request(&self) -> Option<&RequestTrace> {
        self.request.as_ref()
    }

    /// True for a 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| s.is_success())
    }

    /// True for a 3xx status.
    pub fn is_redirect(&self) -> bool {
        self.status.is_some_and(|s| s.is_redirection())
    }

    /// True for a 4xx status.
    pub fn is_request_error(&self) -> bool {
        self.status.is_some_and(|s| s.is_client_error())
    }

    /// True for a 5xx status.
    pub fn is_server_error(&self) -> bool {
        self.status.is_some_and(|s| s.is_server_error())
    }

    /// True when the transport reported a failure. Independent of the
    /// status predicates.
    pub fn is_transport_error(&self) -> bool {
        self.failure.as_ref().is_some_and(|f| f.code != 0)
    }

    /// The value of the `Content-Length` response header, if present and
    /// numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get_line("Content-Length")
            .and_then(|line| line.parse().ok())
    }

    /// Returns the body after enforcing a size cap.
    ///
    /// The cap is checked against the `Content-Length` response header
    /// before the body is touched, so oversized payloads are rejected
    /// before any deserialization.
    ///
    /// # Errors
    ///
    /// Fails with [`ResultError::ContentLengthExceeded`] when the reported
    /// length exceeds `max`.
    pub fn checked_body(&self, max: u64) -> Result<Option<&Body>, ResultError> {
        match self.content_length() {
            Some(length) if length > max => {
                Err(ResultError::ContentLengthExceeded { limit: max, length })
            }
            _ => Ok(self.body.as_ref()),
        }
    }

    /// The body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Fails with [`ResultError::NonTextBody`] when the body is not valid
    /// UTF-8. An absent body yields an empty string.
    pub fn text(&self) -> Result<&str, ResultError> {
        match self.body.as_ref() {
            Some(body) => body.as_str().ok_or(ResultError::NonTextBody),
            None => Ok(""),
        }
    }

    /// Deserializes the body as JSON.
    ///
    /// # Optional
    ///
    /// This requires the optional `json` feature enabled.
    ///
    /// # Errors
    ///
    /// Fails with [`ResultError::Decode`] when the body is not valid JSON
    /// for the target type.
    #[cfg(feature = "json")]
    #[cfg_attr(docsrs, doc(cfg(feature = "json")))]
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ResultError> {
        let bytes = self
            .body
            .as_ref()
            .map(|b| b.bytes().as_ref())
            .unwrap_or_default();
        let value = serde_json::from_slice(bytes)?;
        Ok(value)
    }
}
