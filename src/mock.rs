//! Deterministic request/response mocking.
//!
//! A [`MockMatcher`] computes a canonical, order-independent identity for an
//! outgoing request; a [`MockRegistry`] maps those identities to canned
//! [`HttpResult`]s and records every invocation attempt for later
//! verification.
//!
//! The registry is an explicit, injectable object: attach one to a plug with
//! [`crate::HttpPlug::with_mock_registry`] and reset it between test cases.
//! Internals are mutex-guarded, so one registry can be shared across a
//! parallel test runner.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use base64::{Engine, prelude::BASE64_STANDARD};
use http::Method;

use crate::content::Body;
use crate::headers::Headers;
use crate::result::HttpResult;
use crate::transport::RequestEnvelope;
use crate::uri::XUri;
use crate::value::Value;

/// What happens when the registry is active and no registration matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnmatchedMode {
    /// The request falls through to the real transport (reference behavior).
    #[default]
    FallThrough,
    /// The invocation fails with [`crate::Error::UnmatchedRequest`], so a
    /// missing registration cannot silently hit the network.
    Fail,
}

/// The canonical identity of an outgoing request for mock matching.
///
/// Identity covers method, scheme/host/port, path, query parameters and
/// headers (both sorted and filtered through the registry's ignore-lists)
/// and the body. Two matchers describing the same logical request produce
/// the same identity no matter in which order headers or query parameters
/// were added.
#[derive(Debug, Clone)]
pub struct MockMatcher {
    method: Method,
    uri: XUri,
    headers: Headers,
    body: Option<Body>,
}

impl MockMatcher {
    /// Creates a matcher for a method and target URI.
    pub fn new(method: Method, uri: XUri) -> Self {
        Self {
            method,
            uri,
            headers: Headers::new(),
            body: None,
        }
    }

    /// Creates a matcher describing a composed request envelope.
    pub fn from_envelope(envelope: &RequestEnvelope) -> Self {
        Self {
            method: envelope.method.clone(),
            uri: envelope.uri.clone(),
            headers: envelope.headers.clone(),
            body: envelope.body.clone(),
        }
    }

    /// Returns a copy with a header added.
    pub fn with_header(&self, name: &str, value: impl Into<Value>) -> Self {
        let mut matcher = self.clone();
        matcher.headers.add(name, value);
        matcher
    }

    /// Returns a copy with a query parameter added.
    pub fn with_query_param(&self, key: &str, value: Option<Value>) -> Self {
        let mut matcher = self.clone();
        matcher.uri = matcher.uri.with_query_param(key, value);
        matcher
    }

    /// Returns a copy with the expected body.
    pub fn with_body(&self, body: impl Into<Body>) -> Self {
        let mut matcher = self.clone();
        matcher.body = Some(body.into());
        matcher
    }

    /// The matcher's method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The matcher's target URI.
    pub fn uri(&self) -> &XUri {
        &self.uri
    }

    /// Computes the canonical identity under the given ignore-lists.
    ///
    /// The serialization is deterministic: query pairs and header pairs are
    /// sorted after filtering, so insertion order never affects the result.
    /// The string itself is the identity; no hash is taken, so distinct
    /// inputs cannot collide.
    fn signature(&self, filters: &IgnoreFilters) -> String {
        let mut out = String::new();
        out.push_str(self.method.as_str());
        out.push('\n');
        out.push_str(&self.uri.scheme().to_ascii_lowercase());
        out.push_str("://");
        out.push_str(&self.uri.host().to_ascii_lowercase());
        if let Some(port) = self.uri.port() {
            out.push_str(&format!(":{port}"));
        }
        out.push('\n');
        out.push_str(self.uri.path());
        out.push('\n');

        let mut query: Vec<String> = self
            .uri
            .query_params()
            .map(|params| {
                params
                    .iter()
                    .filter(|(key, _)| !filters.query.iter().any(|q| q == key))
                    .map(|(key, value)| match value {
                        Some(value) => format!("?{key}={value}"),
                        None => format!("?{key}"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        query.sort();
        for line in query {
            out.push_str(&line);
            out.push('\n');
        }

        let mut header_lines: Vec<String> = Vec::new();
        for (name, values) in self.headers.iter() {
            if filters.headers.iter().any(|h| h.as_str() == name) {
                continue;
            }
            for value in values {
                header_lines.push(format!("!{name}: {value}"));
            }
        }
        header_lines.sort();
        for line in header_lines {
            out.push_str(&line);
            out.push('\n');
        }

        // Bodies are matched byte for byte; base64 keeps the serialization
        // printable for binary payloads.
        if let Some(body) = self.body.as_ref() {
            out.push_str(&BASE64_STANDARD.encode(body.bytes()));
        }
        out
    }
}

#[derive(Debug, Default, Clone)]
struct IgnoreFilters {
    query: Vec<String>,
    /// Canonicalized header names.
    headers: Vec<String>,
}

#[derive(Debug, Default)]
struct RegistryState {
    registrations: HashMap<String, Registration>,
    /// Identities of every attempted call, matched or not.
    call_log: Vec<String>,
    call_count: u64,
    matched: HashSet<String>,
    filters: IgnoreFilters,
    mode: UnmatchedMode,
}

#[derive(Debug)]
struct Registration {
    result: HttpResult,
    must_be_called: bool,
}

/// A registry of canned results keyed by request identity.
///
/// Becomes active the moment a mock is registered and stays active until
/// [`MockRegistry::reset`]. While active, a plug carrying this registry
/// checks every outgoing request against the registrations before touching
/// its transport.
#[derive(Debug, Default)]
pub struct MockRegistry {
    state: Mutex<RegistryState>,
}

impl MockRegistry {
    /// Creates an empty, inactive registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        // A poisoned lock means a test already panicked; the registry state
        // is still sound for read-out.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Registers a canned result that must be called before
    /// [`MockRegistry::verify_all`] passes.
    pub fn register(&self, matcher: &MockMatcher, result: HttpResult) {
        self.register_with(matcher, result, true);
    }

    /// Registers a canned result that may go uncalled.
    pub fn register_optional(&self, matcher: &MockMatcher, result: HttpResult) {
        self.register_with(matcher, result, false);
    }

    fn register_with(&self, matcher: &MockMatcher, result: HttpResult, must_be_called: bool) {
        let mut state = self.lock();
        let identity = matcher.signature(&state.filters);
        state.registrations.insert(
            identity,
            Registration {
                result,
                must_be_called,
            },
        );
    }

    /// True once any mock is registered and until [`MockRegistry::reset`].
    pub fn is_active(&self) -> bool {
        !self.lock().registrations.is_empty()
    }

    /// The configured behavior for unmatched requests while active.
    pub fn unmatched_mode(&self) -> UnmatchedMode {
        self.lock().mode
    }

    /// Configures the behavior for unmatched requests while active.
    pub fn set_unmatched_mode(&self, mode: UnmatchedMode) {
        self.lock().mode = mode;
    }

    /// Ignores a query parameter name during identity computation.
    ///
    /// The filter never alters the request actually sent to a transport.
    pub fn ignore_query_param(&self, name: &str) {
        self.lock().filters.query.push(name.to_string());
    }

    /// Ignores a header name during identity computation.
    ///
    /// The filter never alters the request actually sent to a transport.
    pub fn ignore_header(&self, name: &str) {
        let canonical = crate::headers::canonicalize(name);
        self.lock().filters.headers.push(canonical);
    }

    /// Looks up the canned result for a request.
    ///
    /// The attempt is always logged before matching, so
    /// [`MockRegistry::verify`] sees unmatched attempts too. A matched
    /// result is returned verbatim; the caller stamps request-trace
    /// information onto it.
    pub fn lookup(&self, matcher: &MockMatcher) -> Option<HttpResult> {
        let mut state = self.lock();
        let identity = matcher.signature(&state.filters);
        state.call_log.push(identity.clone());
        state.call_count += 1;
        match state.registrations.get(&identity) {
            Some(registration) => {
                let result = registration.result.clone();
                state.matched.insert(identity);
                Some(result)
            }
            None => None,
        }
    }

    /// Describes a matcher for diagnostics (unmatched-request errors).
    pub(crate) fn describe(&self, matcher: &MockMatcher) -> String {
        format!(
            "{} {}",
            matcher.method(),
            matcher.uri().to_sanitized(&[])
        )
    }

    /// True if this exact request identity was attempted at least once.
    pub fn verify(&self, matcher: &MockMatcher) -> bool {
        let state = self.lock();
        let identity = matcher.signature(&state.filters);
        state.call_log.iter().any(|logged| *logged == identity)
    }

    /// True if every registration made with [`MockRegistry::register`] was
    /// matched at least once.
    pub fn verify_all(&self) -> bool {
        let state = self.lock();
        state
            .registrations
            .iter()
            .filter(|(_, registration)| registration.must_be_called)
            .all(|(identity, _)| state.matched.contains(identity))
    }

    /// True if any call was attempted at all.
    pub fn verify_called(&self) -> bool {
        self.lock().call_count > 0
    }

    /// The number of attempted calls since the last reset.
    pub fn call_count(&self) -> u64 {
        self.lock().call_count
    }

    /// Deregisters everything: registrations, the call log and the
    /// ignore-lists. The registry becomes inactive. The unmatched mode is
    /// configuration and survives.
    pub fn reset(&self) {
        let mut state = self.lock();
        let mode = state.mode;
        *state = RegistryState::default();
        state.mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    fn uri(raw: &str) -> XUri {
        XUri::parse(raw).unwrap()
    }

    #[test]
    fn identity_is_header_order_independent() {
        let registry = MockRegistry::new();
        let base = MockMatcher::new(Method::GET, uri("http://e.com/x"));
        let forward = base.with_header("X-A", "1").with_header("X-B", "2");
        let backward = base.with_header("X-B", "2").with_header("X-A", "1");

        registry.register(&forward, HttpResult::from_status(StatusCode::OK));
        assert!(registry.lookup(&backward).is_some());
    }

    #[test]
    fn identity_is_query_order_independent() {
        let registry = MockRegistry::new();
        let a = MockMatcher::new(Method::GET, uri("http://e.com/x?a=1&b=2"));
        let b = MockMatcher::new(Method::GET, uri("http://e.com/x?b=2&a=1"));

        registry.register(&a, HttpResult::from_status(StatusCode::OK));
        assert!(registry.lookup(&b).is_some());
    }

    #[test]
    fn identity_distinguishes_method_and_body() {
        let registry = MockRegistry::new();
        let get = MockMatcher::new(Method::GET, uri("http://e.com/x"));
        let post = MockMatcher::new(Method::POST, uri("http://e.com/x")).with_body("payload");

        registry.register(&get, HttpResult::from_status(StatusCode::OK));
        assert!(registry.lookup(&post).is_none());
        assert!(registry.lookup(&post.with_body("other")).is_none());
    }

    #[test]
    fn binary_bodies_participate_in_identity() {
        let registry = MockRegistry::new();
        let bodyless = MockMatcher::new(Method::POST, uri("http://e.com/x"));
        registry.register(&bodyless, HttpResult::from_status(StatusCode::OK));

        let binary = bodyless.with_body(vec![0xFF, 0xFE, 0x00]);
        assert!(registry.lookup(&binary).is_none());

        registry.register(&binary, HttpResult::from_status(StatusCode::OK));
        let other = bodyless.with_body(vec![0xFF, 0xFE, 0x01]);
        assert!(registry.lookup(&other).is_none());
        assert!(registry.lookup(&binary).is_some());
    }

    #[test]
    fn ignored_query_param_still_matches() {
        let registry = MockRegistry::new();
        registry.ignore_query_param("dream.out.format");

        let registered = MockMatcher::new(Method::GET, uri("http://e.com/x?a=1"));
        registry.register(&registered, HttpResult::from_status(StatusCode::OK));

        let requested = MockMatcher::new(
            Method::GET,
            uri("http://e.com/x?a=1&dream.out.format=json"),
        );
        assert!(registry.lookup(&requested).is_some());
    }

    #[test]
    fn ignored_header_still_matches() {
        let registry = MockRegistry::new();
        registry.ignore_header("content-length");

        let registered = MockMatcher::new(Method::POST, uri("http://e.com/x")).with_body("b");
        registry.register(&registered, HttpResult::from_status(StatusCode::OK));

        let requested = registered.with_header("Content-Length", "1");
        assert!(registry.lookup(&requested).is_some());
    }

    #[test]
    fn lookup_logs_unmatched_attempts() {
        let registry = MockRegistry::new();
        let matcher = MockMatcher::new(Method::GET, uri("http://e.com/missing"));
        assert!(registry.lookup(&matcher).is_none());
        assert!(registry.verify(&matcher));
        assert!(registry.verify_called());
    }

    #[test]
    fn verify_all_requires_every_mandatory_registration() {
        let registry = MockRegistry::new();
        let a = MockMatcher::new(Method::GET, uri("http://e.com/a"));
        let b = MockMatcher::new(Method::GET, uri("http://e.com/b"));
        let optional = MockMatcher::new(Method::GET, uri("http://e.com/opt"));

        registry.register(&a, HttpResult::from_status(StatusCode::OK));
        registry.register(&b, HttpResult::from_status(StatusCode::OK));
        registry.register_optional(&optional, HttpResult::from_status(StatusCode::OK));

        registry.lookup(&a);
        assert!(!registry.verify_all());
        registry.lookup(&b);
        assert!(registry.verify_all());
    }

    #[test]
    fn reset_deactivates_and_clears_filters() {
        let registry = MockRegistry::new();
        registry.ignore_query_param("x");
        let matcher = MockMatcher::new(Method::GET, uri("http://e.com/a"));
        registry.register(&matcher, HttpResult::from_status(StatusCode::OK));
        assert!(registry.is_active());

        registry.reset();
        assert!(!registry.is_active());
        assert!(!registry.verify_called());

        // After reset, the previously ignored param matters again.
        registry.register(&matcher, HttpResult::from_status(StatusCode::OK));
        let with_param = MockMatcher::new(Method::GET, uri("http://e.com/a?x=1"));
        assert!(registry.lookup(&with_param).is_none());
    }

    #[test]
    fn mode_survives_reset() {
        let registry = MockRegistry::new();
        registry.set_unmatched_mode(UnmatchedMode::Fail);
        registry.reset();
        assert_eq!(registry.unmatched_mode(), UnmatchedMode::Fail);
    }
}
