//! API-gateway extension of [`HttpPlug`].
//!
//! Gateways that route on decoded paths force clients to double-encode
//! segments containing reserved characters, so a segment survives one round
//! of gateway decoding intact. [`ApiPlug::at`] applies that rule;
//! [`ApiPlug::at_raw`] keeps the plain single-encoding for path pieces that
//! address the API itself rather than user data.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use http::Method;

use crate::content::Content;
use crate::error::{ApiError, Result};
use crate::plug::HttpPlug;
use crate::result::HttpResult;
use crate::uri::encode_segment;
use crate::value::Value;

/// The header carrying the signed server token.
pub const TOKEN_HEADER: &str = "X-Api-Token";

/// The query parameter negotiating the response format.
pub const FORMAT_PARAM: &str = "api.format";

/// Produces the cryptographic signature for a server token.
///
/// The signing algorithm (an HMAC over key and timestamp) lives outside this
/// crate; tests supply a fixed fake.
pub trait TokenSigner: Send + Sync {
    /// Signs `key` at the given Unix timestamp, returning the signature in
    /// its wire form.
    fn sign(&self, key: &str, timestamp: u64) -> String;
}

/// A server token: a key identifier plus its signer.
#[derive(Clone)]
pub struct ApiToken {
    key: String,
    signer: Arc<dyn TokenSigner>,
}

impl ApiToken {
    /// Creates a token for the given key.
    pub fn new(key: &str, signer: Arc<dyn TokenSigner>) -> Self {
        Self {
            key: key.to_string(),
            signer,
        }
    }

    /// The `key_timestamp_signature` header value for the current moment.
    fn header_value(&self) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let signature = self.signer.sign(&self.key, timestamp);
        format!("{}_{timestamp}_{signature}", self.key)
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiToken").field("key", &self.key).finish()
    }
}

type ErrorHandler = dyn Fn(&HttpResult) -> bool + Send + Sync;

/// An [`HttpPlug`] specialization for a path-routed HTTP API.
///
/// Adds double-encoded path segments, server-token signing and
/// unsuccessful-result-to-error mapping. Like the underlying plug, every
/// builder call returns a new instance.
#[derive(Clone)]
pub struct ApiPlug {
    plug: HttpPlug,
    token: Option<ApiToken>,
    error_handler: Option<Arc<ErrorHandler>>,
}

impl ApiPlug {
    /// Wraps an existing plug.
    pub fn new(plug: HttpPlug) -> Self {
        Self {
            plug,
            token: None,
            error_handler: None,
        }
    }

    /// Creates an API plug by parsing an absolute URI string.
    ///
    /// # Errors
    ///
    /// Fails when the string is not a valid absolute URI.
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(Self::new(HttpPlug::parse(raw)?))
    }

    /// The underlying plug.
    pub fn inner(&self) -> &HttpPlug {
        &self.plug
    }

    /// Appends path segments with API double-encoding.
    ///
    /// Each segment is percent-encoded and then has its `%` signs encoded
    /// again, so `a/b` becomes `a%252Fb` on the wire and arrives at the API
    /// as the literal segment `a%2Fb` after one gateway decode.
    pub fn at<I, S>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut next = self.clone();
        for segment in segments {
            let trimmed = segment.as_ref().trim_matches('/');
            if trimmed.is_empty() {
                continue;
            }
            let doubled = encode_segment(trimmed).replace('%', "%25");
            next.plug = next.plug.at_preencoded(&doubled);
        }
        next
    }

    /// Appends path segments with plain single encoding, for path pieces
    /// addressing the API itself.
    pub fn at_raw<I, S>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut next = self.clone();
        next.plug = next.plug.at(segments);
        next
    }

    /// Returns a copy attaching a signed server token to every request.
    pub fn with_token(&self, token: ApiToken) -> Self {
        let mut next = self.clone();
        next.token = Some(token);
        next
    }

    /// Returns a copy negotiating the given response format.
    pub fn with_format(&self, format: &str) -> Self {
        let mut next = self.clone();
        next.plug = next
            .plug
            .with_query_param(FORMAT_PARAM, Some(format.into()));
        next
    }

    /// Returns a copy with a query parameter set on the URI.
    pub fn with_query_param(&self, key: &str, value: Option<Value>) -> Self {
        let mut next = self.clone();
        next.plug = next.plug.with_query_param(key, value);
        next
    }

    /// Returns a copy with a header appended.
    pub fn with_header(&self, name: &str, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.plug = next.plug.with_header(name, value);
        next
    }

    /// Returns a copy with an error handler that inspects an unsuccessful
    /// result; returning `true` suppresses the error and hands the raw
    /// result back to the caller.
    pub fn with_error_handler(
        &self,
        handler: impl Fn(&HttpResult) -> bool + Send + Sync + 'static,
    ) -> Self {
        let mut next = self.clone();
        next.error_handler = Some(Arc::new(handler));
        next
    }

    /// Invokes `GET`, mapping unsuccessful results to errors.
    ///
    /// # Errors
    ///
    /// See [`ApiPlug::invoke`].
    pub fn get(&self) -> Result<HttpResult> {
        self.invoke(Method::GET, None)
    }

    /// Invokes `POST`, mapping unsuccessful results to errors.
    ///
    /// # Errors
    ///
    /// See [`ApiPlug::invoke`].
    pub fn post(&self, content: impl Content + 'static) -> Result<HttpResult> {
        self.invoke(Method::POST, Some(Box::new(content)))
    }

    /// Invokes `PUT`, mapping unsuccessful results to errors.
    ///
    /// # Errors
    ///
    /// See [`ApiPlug::invoke`].
    pub fn put(&self, content: impl Content + 'static) -> Result<HttpResult> {
        self.invoke(Method::PUT, Some(Box::new(content)))
    }

    /// Invokes `DELETE`, mapping unsuccessful results to errors.
    ///
    /// # Errors
    ///
    /// See [`ApiPlug::invoke`].
    pub fn delete(&self) -> Result<HttpResult> {
        self.invoke(Method::DELETE, None)
    }

    /// Composes and executes the request, converting an unsuccessful result
    /// into [`crate::Error::Api`] unless the error handler suppresses it.
    ///
    /// # Errors
    ///
    /// All [`HttpPlug::invoke`] failure modes, plus `Error::Api` for
    /// non-2xx results and transport failures.
    pub fn invoke(&self, method: Method, content: Option<Box<dyn Content>>) -> Result<HttpResult> {
        let plug = match self.token.as_ref() {
            Some(token) => self.plug.with_header(TOKEN_HEADER, token.header_value()),
            None => self.plug.clone(),
        };
        let result = plug.invoke(method, content)?;
        if result.is_success() {
            return Ok(result);
        }
        if let Some(handler) = self.error_handler.as_ref() {
            if handler(&result) {
                return Ok(result);
            }
        }
        Err(ApiError::new(result).into())
    }
}

impl std::fmt::Debug for ApiPlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiPlug")
            .field("plug", &self.plug)
            .field("token", &self.token)
            .field("has_error_handler", &self.error_handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_double_encodes_segments() {
        let api = ApiPlug::parse("http://example.com/@api").unwrap();
        let api = api.at(["some/page"]);
        assert_eq!(
            api.inner().uri().to_string(),
            "http://example.com/@api/some%252Fpage"
        );
    }

    #[test]
    fn at_raw_single_encodes() {
        let api = ApiPlug::parse("http://example.com/@api").unwrap();
        let api = api.at_raw(["pages", "some page"]);
        assert_eq!(
            api.inner().uri().to_string(),
            "http://example.com/@api/pages/some%20page"
        );
    }

    #[test]
    fn format_param_is_set() {
        let api = ApiPlug::parse("http://example.com/@api").unwrap();
        let api = api.with_format("json");
        assert_eq!(
            api.inner().uri().query().as_deref(),
            Some("api.format=json")
        );
    }
}
