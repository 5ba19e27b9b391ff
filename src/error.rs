//! Error types for the http-plug crate.
//!
//! This module defines the [`Error`] enum, a unified error type used throughout the crate.
//! All errors produced by this crate will be returned as a variant of [`Error`],
//! making error handling simple and consistent.

use std::fmt;

use http::StatusCode;
use thiserror::Error;

use crate::result::HttpResult;

/// A unified error type for all operations in this crate.
///
/// Most methods return a [`Result<T, Error>`]. Construction errors (malformed
/// URIs, invalid raw headers) fail fast at the call site; result
/// interpretation errors are modeled as data on [`HttpResult`] first and only
/// become an `Error` through [`crate::ApiPlug`] or an explicit check.
#[derive(Debug, Error)]
#[error(transparent)]
pub enum Error {
    /// An error constructing or manipulating a URI.
    Uri(#[from] UriError),
    /// An error constructing a header collection.
    Header(#[from] HeaderError),
    /// An error interpreting a response body.
    Result(#[from] ResultError),
    /// An invocation was attempted with neither a transport nor a matching mock.
    #[error("no transport configured")]
    NoTransport,
    /// The mock registry was active in fail-fast mode and no registration matched.
    #[error("no mock registered for request: {0}")]
    UnmatchedRequest(String),
    /// An error from serializing URL query parameters or form bodies.
    #[error("error serializing url-encoded data")]
    SerializeUrl(#[from] serde_urlencoded::ser::Error),
    /// An error from serializing a JSON body (available when the `json` feature is enabled).
    #[cfg(feature = "json")]
    #[error("error serializing JSON body")]
    SerializeJson(#[from] serde_json::Error),
    /// Returned when an API invocation completes with an unsuccessful status code.
    Api(#[from] ApiError),
}

impl Error {
    /// Returns true if the error came from URI construction.
    pub fn is_uri(&self) -> bool {
        matches!(self, Self::Uri(..))
    }

    /// Returns true if the error came from an unsuccessful API result.
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api(..))
    }

    /// Returns true if the error is an unmatched-mock failure.
    pub fn is_unmatched(&self) -> bool {
        matches!(self, Self::UnmatchedRequest(..))
    }

    /// Returns the status code, if the error was generated from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api(err) => err.result.status(),
            _ => None,
        }
    }
}

/// An error building or parsing a [`crate::XUri`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UriError {
    /// The string could not be parsed as an absolute URI.
    #[error("malformed URI: {0:?}")]
    Malformed(String),
    /// A scheme is required and must be non-empty.
    #[error("URI scheme must not be empty")]
    EmptyScheme,
    /// A host is required and must be non-empty.
    #[error("URI host must not be empty")]
    EmptyHost,
    /// The port component was present but not numeric.
    #[error("invalid URI port: {0:?}")]
    InvalidPort(String),
    /// `with_query` received a string with a leading `?`.
    #[error("query string must not start with '?'")]
    QueryLeadingQuestionMark,
    /// `at_path` received a relative reference it could not parse.
    #[error("malformed relative reference: {0:?}")]
    RelativeRef(String),
}

/// An error building a [`crate::Headers`] collection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    /// A raw header line had no `:` separator.
    #[error("raw header has no colon: {0:?}")]
    MissingColon(String),
    /// A header name was empty.
    #[error("header name must not be empty")]
    EmptyName,
}

/// A recoverable error interpreting a response body.
#[derive(Debug, Error)]
pub enum ResultError {
    /// The response body exceeds the configured cap. The check reads the
    /// `Content-Length` response header before any deserialization happens.
    #[error("response content length {length} exceeds the configured maximum {limit}")]
    ContentLengthExceeded {
        /// The configured maximum body size in bytes.
        limit: u64,
        /// The length reported by the `Content-Length` header.
        length: u64,
    },
    /// The response body is not valid UTF-8 text.
    #[error("response body is not valid text")]
    NonTextBody,
    /// The response body could not be deserialized in the expected format.
    #[cfg(feature = "json")]
    #[error("error decoding response body")]
    Decode(#[from] serde_json::Error),
}

/// Returned when an API invocation completes with an unsuccessful result.
///
/// Carries the full [`HttpResult`] so a caller-supplied handler can inspect
/// status, headers and body and decide to suppress or propagate.
#[derive(Debug)]
pub struct ApiError {
    result: HttpResult,
}

impl ApiError {
    pub(crate) fn new(result: HttpResult) -> Self {
        Self { result }
    }

    /// The unsuccessful result that triggered this error.
    pub fn result(&self) -> &HttpResult {
        &self.result
    }

    /// Consumes the error, returning the raw result for callers that choose
    /// to suppress the failure.
    pub fn into_result(self) -> HttpResult {
        self.result
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result.status() {
            Some(status) if status.is_client_error() => {
                write!(f, "API request error ({status})")
            }
            Some(status) if status.is_server_error() => {
                write!(f, "API server error ({status})")
            }
            Some(status) => write!(f, "unexpected API status ({status})"),
            None => write!(f, "API transport failure"),
        }
    }
}

impl std::error::Error for ApiError {}

/// A result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
