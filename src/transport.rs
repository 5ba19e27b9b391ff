use std::time::Duration;

use http::Method;

use crate::content::Body;
use crate::headers::Headers;
use crate::uri::XUri;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default automatic-redirect budget. Zero disables redirect following.
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// A fully composed outgoing request, handed to the transport (and to the
/// mock registry) at invocation time.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// The HTTP method.
    pub method: Method,
    /// The request target. Owned by this envelope; the plug that produced it
    /// keeps its own snapshot.
    pub uri: XUri,
    /// The request headers.
    pub headers: Headers,
    /// The encoded body, if any.
    pub body: Option<Body>,
}

/// Per-invocation transport options.
#[derive(Debug, Clone, Copy)]
pub struct InvokeOptions {
    /// How long the blocking exchange may take.
    pub timeout: Duration,
    /// How many automatic redirects to follow. Zero disables.
    pub max_redirects: u32,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// The raw outcome of one HTTP exchange.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    /// The numeric status code, zero when the exchange failed before a
    /// response arrived.
    pub status: u16,
    /// Parsed response headers.
    pub headers: Headers,
    /// The raw response body, if any.
    pub body: Option<Body>,
    /// Transport error code; zero means no transport-level failure.
    pub error_code: i32,
    /// Transport error message accompanying a non-zero code.
    pub error_message: Option<String>,
    /// The raw response header lines as received on the wire.
    pub raw_header_lines: Vec<String>,
}

/// The HTTP exchange collaborator.
///
/// One blocking call per request: implementations open and close their own
/// connection, honor [`InvokeOptions::timeout`] and follow at most
/// [`InvokeOptions::max_redirects`] redirects. The actual I/O layer lives
/// outside this crate.
pub trait Transport: Send + Sync {
    /// Performs the exchange described by `request`.
    fn execute(&self, request: &RequestEnvelope, options: &InvokeOptions) -> TransportResponse;
}
