use bytes::Bytes;
use mime::Mime;
use serde::Serialize;

use crate::Result;

/// Represents the body of an HTTP request or response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    inner: Bytes,
}

impl Body {
    /// Returns a reference to the raw bytes of the HTTP body.
    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.inner
    }

    /// The body length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the body is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// The body as UTF-8 text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.inner).ok()
    }
}

impl From<Bytes> for Body {
    #[inline]
    fn from(value: Bytes) -> Self {
        Self { inner: value }
    }
}

impl From<Vec<u8>> for Body {
    #[inline]
    fn from(value: Vec<u8>) -> Self {
        Self {
            inner: value.into(),
        }
    }
}

impl From<&'static [u8]> for Body {
    #[inline]
    fn from(value: &'static [u8]) -> Self {
        Self {
            inner: Bytes::from_static(value),
        }
    }
}

impl From<String> for Body {
    #[inline]
    fn from(value: String) -> Self {
        Self {
            inner: value.into(),
        }
    }
}

impl From<&'static str> for Body {
    #[inline]
    fn from(value: &'static str) -> Self {
        Self {
            inner: value.into(),
        }
    }
}

/// A typed request payload that knows its own content type.
///
/// Implementations turn a typed value into raw bytes once, at invocation
/// time. The plug stamps [`Content::content_type`] onto the outgoing
/// `Content-Type` header when one is supplied.
pub trait Content {
    /// The MIME type to send, if any.
    fn content_type(&self) -> Option<Mime>;

    /// Encodes the payload into a raw body.
    ///
    /// # Errors
    ///
    /// Fails when the payload cannot be serialized.
    fn into_body(self: Box<Self>) -> Result<Body>;
}

/// A plain-text payload.
#[derive(Debug, Clone)]
pub struct TextContent(String);

impl TextContent {
    /// Wraps a text payload.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl Content for TextContent {
    fn content_type(&self) -> Option<Mime> {
        Some(mime::TEXT_PLAIN)
    }

    fn into_body(self: Box<Self>) -> Result<Body> {
        Ok(self.0.into())
    }
}

/// A URL-encoded form payload.
#[derive(Debug, Clone)]
pub struct FormContent<T>(T);

impl<T: Serialize> FormContent<T> {
    /// Wraps a serializable form payload.
    pub fn new(form: T) -> Self {
        Self(form)
    }
}

impl<T: Serialize> Content for FormContent<T> {
    fn content_type(&self) -> Option<Mime> {
        Some(mime::APPLICATION_WWW_FORM_URLENCODED)
    }

    fn into_body(self: Box<Self>) -> Result<Body> {
        let encoded = serde_urlencoded::to_string(&self.0)?;
        Ok(encoded.into())
    }
}

/// A JSON payload.
///
/// # Optional
///
/// This requires the optional `json` feature enabled.
#[cfg(feature = "json")]
#[cfg_attr(docsrs, doc(cfg(feature = "json")))]
#[derive(Debug, Clone)]
pub struct JsonContent<T>(T);

#[cfg(feature = "json")]
impl<T: Serialize> JsonContent<T> {
    /// Wraps a serializable JSON payload.
    pub fn new(json: T) -> Self {
        Self(json)
    }
}

#[cfg(feature = "json")]
impl<T: Serialize> Content for JsonContent<T> {
    fn content_type(&self) -> Option<Mime> {
        Some(mime::APPLICATION_JSON)
    }

    fn into_body(self: Box<Self>) -> Result<Body> {
        let encoded = serde_json::to_vec(&self.0)?;
        Ok(encoded.into())
    }
}

/// A pre-encoded payload with an explicit content type.
#[derive(Debug, Clone)]
pub struct RawContent {
    body: Body,
    content_type: Option<Mime>,
}

impl RawContent {
    /// Wraps an already-encoded body.
    pub fn new(body: impl Into<Body>, content_type: Option<Mime>) -> Self {
        Self {
            body: body.into(),
            content_type,
        }
    }
}

impl Content for RawContent {
    fn content_type(&self) -> Option<Mime> {
        self.content_type.clone()
    }

    fn into_body(self: Box<Self>) -> Result<Body> {
        Ok(self.body)
    }
}
