//! `fetch` stand-in.
//!
//! Routes are tried in registration order and the first live one answers.
//! A request no route claims resolves with the default stand-in response
//! (`200`, body `{}`) unless unmatched requests are blocked, in which case
//! it gets a `404`. Routes built with [`Reply::Fail`] make `fetch` reject
//! the way a browser network failure does.

use crate::result::{HeadlessError, HeadlessResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Network-level failure a route can simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchFailure {
    /// `navigator.onLine` is false
    Offline,
    /// Nothing listening on the host
    ConnectionRefused,
    /// DNS lookup failed
    NameNotResolved,
    /// Server never answered
    TimedOut,
    /// `AbortController.abort()` was called
    Aborted,
}

impl FetchFailure {
    /// Chromium error code for the failure
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Offline => "net::ERR_INTERNET_DISCONNECTED",
            Self::ConnectionRefused => "net::ERR_CONNECTION_REFUSED",
            Self::NameNotResolved => "net::ERR_NAME_NOT_RESOLVED",
            Self::TimedOut => "net::ERR_TIMED_OUT",
            Self::Aborted => "net::ERR_ABORTED",
        }
    }

    /// Whether page code sees an `AbortError` rather than a `TypeError`
    #[must_use]
    pub const fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// Request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// HEAD
    Head,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
}

impl HttpMethod {
    /// Every method `fetch` accepts
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Options,
    ];

    /// Canonical upper-case name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = HeadlessError;

    /// `fetch` upper-cases the method it is given, so parsing ignores case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| HeadlessError::invalid_request(format!("unknown HTTP method '{s}'")))
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `Response` a route resolves with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockResponse {
    /// `response.status`
    pub status: u16,
    /// `response.headers`, keys lower-cased
    pub headers: BTreeMap<String, String>,
    /// Body text
    pub body: String,
    /// Time the response takes to arrive
    pub delay_ms: u64,
}

impl Default for MockResponse {
    /// The stand-in every unrouted request receives
    fn default() -> Self {
        Self {
            status: 200,
            headers: BTreeMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            body: "{}".to_string(),
            delay_ms: 0,
        }
    }
}

impl MockResponse {
    /// `200` with body `{}`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `200` with `data` serialized as JSON
    pub fn json<T: Serialize>(data: &T) -> HeadlessResult<Self> {
        Ok(Self {
            body: serde_json::to_string(data)?,
            ..Self::default()
        })
    }

    /// `200` with a plain-text body
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self::default()
            .with_header("Content-Type", "text/plain")
            .with_body(body)
    }

    /// An HTTP error status with `{"error": message}` as body
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message }).to_string(),
            ..Self::default()
        }
    }

    /// Replace the status
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Replace the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header; names are case-insensitive
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let _ = self
            .headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Delay delivery by `delay_ms`
    #[must_use]
    pub const fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// `response.ok`
    #[must_use]
    pub const fn ok(&self) -> bool {
        matches!(self.status, 200..=299)
    }

    /// `response.headers.get(name)`
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// `response.json()`
    pub fn body_json<T: for<'de> Deserialize<'de>>(&self) -> HeadlessResult<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Exact(String),
    Prefix(String),
    Contains(String),
    Pattern(Regex),
    Any,
}

/// Which request URLs a route claims.
///
/// Regex and glob patterns are compiled once, when the pattern is built.
#[derive(Debug, Clone)]
pub struct UrlPattern {
    source: String,
    matcher: Matcher,
}

impl UrlPattern {
    /// The URL exactly
    #[must_use]
    pub fn exact(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            source: url.clone(),
            matcher: Matcher::Exact(url),
        }
    }

    /// URLs starting with `prefix`
    #[must_use]
    pub fn prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            source: format!("{prefix}*"),
            matcher: Matcher::Prefix(prefix),
        }
    }

    /// URLs containing `needle`
    #[must_use]
    pub fn contains(needle: impl Into<String>) -> Self {
        let needle = needle.into();
        Self {
            source: format!("*{needle}*"),
            matcher: Matcher::Contains(needle),
        }
    }

    /// URLs matching a regular expression anywhere
    ///
    /// # Errors
    ///
    /// Returns [`HeadlessError::InvalidRequest`] if `pattern` does not compile.
    pub fn regex(pattern: &str) -> HeadlessResult<Self> {
        let compiled = Regex::new(pattern).map_err(|e| {
            HeadlessError::invalid_request(format!("invalid URL regex '{pattern}': {e}"))
        })?;
        Ok(Self {
            source: format!("/{pattern}/"),
            matcher: Matcher::Pattern(compiled),
        })
    }

    /// Whole-URL glob where `*` (and `**`) stand for any run of characters
    #[must_use]
    pub fn glob(pattern: &str) -> Self {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        // Every literal is escaped, so the translation always compiles.
        let matcher = Regex::new(&format!("^{body}$"))
            .map_or_else(|_| Matcher::Exact(pattern.to_string()), Matcher::Pattern);
        Self {
            source: pattern.to_string(),
            matcher,
        }
    }

    /// Every URL
    #[must_use]
    pub fn any() -> Self {
        Self {
            source: "*".to_string(),
            matcher: Matcher::Any,
        }
    }

    /// Whether `url` is claimed by this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match &self.matcher {
            Matcher::Exact(expected) => url == expected,
            Matcher::Prefix(prefix) => url.starts_with(prefix.as_str()),
            Matcher::Contains(needle) => url.contains(needle.as_str()),
            Matcher::Pattern(re) => re.is_match(url),
            Matcher::Any => true,
        }
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Arguments of one `fetch(url, init)` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    /// Request URL
    pub url: String,
    /// `init.method`
    pub method: HttpMethod,
    /// `init.headers`, keys lower-cased
    pub headers: BTreeMap<String, String>,
    /// `init.body`
    pub body: Option<String>,
}

impl FetchRequest {
    /// `fetch(url)`
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// `fetch(url, { method: "POST" })`
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// A request with an explicit method
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Set a header; names are case-insensitive
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let _ = self
            .headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    /// Set a text body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `data` as the body and mark it JSON
    pub fn with_json<T: Serialize>(self, data: &T) -> HeadlessResult<Self> {
        let body = serde_json::to_string(data)?;
        Ok(self
            .with_header("Content-Type", "application/json")
            .with_body(body))
    }

    /// Parse the body as JSON
    ///
    /// # Errors
    ///
    /// Returns [`HeadlessError::InvalidRequest`] when there is no body.
    pub fn body_json<T: for<'de> Deserialize<'de>>(&self) -> HeadlessResult<T> {
        let body = self
            .body
            .as_deref()
            .ok_or_else(|| HeadlessError::invalid_request(format!("{} {} has no body", self.method, self.url)))?;
        Ok(serde_json::from_str(body)?)
    }
}

/// A request as seen by the stub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRequest {
    /// What the page asked for
    pub request: FetchRequest,
    /// Status it was answered with; `None` when the fetch rejected
    pub status: Option<u16>,
    /// Milliseconds since the stub was created or reset
    pub elapsed_ms: u64,
}

/// How a matched route answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Resolve with a response
    Respond(MockResponse),
    /// Reject with a network failure
    Fail(FetchFailure),
}

/// One entry in the routing table
#[derive(Debug, Clone)]
pub struct Route {
    pattern: UrlPattern,
    method: Option<HttpMethod>,
    reply: Reply,
    limit: Option<usize>,
    hits: usize,
}

impl Route {
    /// Answer every method on URLs matching `pattern` with `reply`
    #[must_use]
    pub fn new(pattern: UrlPattern, reply: Reply) -> Self {
        Self {
            pattern,
            method: None,
            reply,
            limit: None,
            hits: 0,
        }
    }

    /// Only claim requests with `method`
    #[must_use]
    pub const fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Stop claiming requests after `n` hits
    #[must_use]
    pub const fn times(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Requests this route has answered
    #[must_use]
    pub const fn hits(&self) -> usize {
        self.hits
    }

    /// Whether the hit limit has been reached
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.hits >= limit)
    }

    /// Whether this route would answer `request`
    #[must_use]
    pub fn claims(&self, request: &FetchRequest) -> bool {
        !self.is_exhausted()
            && self.method.map_or(true, |m| m == request.method)
            && self.pattern.matches(&request.url)
    }
}

#[derive(Debug)]
struct FetchState {
    routes: Vec<Route>,
    captured: Vec<CapturedRequest>,
    block_unmatched: bool,
    clock: Instant,
}

impl FetchState {
    fn fresh() -> Self {
        Self {
            routes: Vec::new(),
            captured: Vec::new(),
            block_unmatched: false,
            clock: Instant::now(),
        }
    }
}

/// `window.fetch`; clones share routes and captured requests
#[derive(Debug, Clone)]
pub struct MockFetch {
    state: Arc<Mutex<FetchState>>,
}

impl Default for MockFetch {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetch {
    /// A stub with no routes that resolves everything with the stand-in
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FetchState::fresh())),
        }
    }

    fn state(&self) -> MutexGuard<'_, FetchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer unmatched requests with a 404 instead of the stand-in
    #[must_use]
    pub fn block_unmatched(self) -> Self {
        self.set_block_unmatched(true);
        self
    }

    /// Toggle 404s for unmatched requests
    pub fn set_block_unmatched(&self, block: bool) {
        self.state().block_unmatched = block;
    }

    /// Append a route
    pub fn route(&self, route: Route) {
        tracing::trace!(target: "jugar_headless::fetch", pattern = %route.pattern, "route added");
        self.state().routes.push(route);
    }

    fn respond_to(&self, method: HttpMethod, url_part: &str, response: MockResponse) {
        self.route(Route::new(UrlPattern::contains(url_part), Reply::Respond(response)).method(method));
    }

    /// GET requests whose URL contains `url_part`
    pub fn get(&self, url_part: &str, response: MockResponse) {
        self.respond_to(HttpMethod::Get, url_part, response);
    }

    /// POST requests whose URL contains `url_part`
    pub fn post(&self, url_part: &str, response: MockResponse) {
        self.respond_to(HttpMethod::Post, url_part, response);
    }

    /// PUT requests whose URL contains `url_part`
    pub fn put(&self, url_part: &str, response: MockResponse) {
        self.respond_to(HttpMethod::Put, url_part, response);
    }

    /// DELETE requests whose URL contains `url_part`
    pub fn delete(&self, url_part: &str, response: MockResponse) {
        self.respond_to(HttpMethod::Delete, url_part, response);
    }

    /// Reject any request whose URL contains `url_part`
    pub fn fail(&self, url_part: &str, failure: FetchFailure) {
        self.route(Route::new(UrlPattern::contains(url_part), Reply::Fail(failure)));
    }

    /// `fetch(request)`.
    ///
    /// # Errors
    ///
    /// Returns [`HeadlessError::FetchFailed`] when a failing route claims the
    /// request.
    pub async fn fetch(&self, request: FetchRequest) -> HeadlessResult<MockResponse> {
        let reply = {
            let mut guard = self.state();
            let state = &mut *guard;
            let reply = match state.routes.iter_mut().find(|route| route.claims(&request)) {
                Some(route) => {
                    route.hits += 1;
                    route.reply.clone()
                }
                None if state.block_unmatched => {
                    Reply::Respond(MockResponse::error(404, "No route matched"))
                }
                None => Reply::Respond(MockResponse::default()),
            };
            let status = match &reply {
                Reply::Respond(response) => Some(response.status),
                Reply::Fail(_) => None,
            };
            state.captured.push(CapturedRequest {
                request: request.clone(),
                status,
                elapsed_ms: state.clock.elapsed().as_millis() as u64,
            });
            reply
        };

        match reply {
            Reply::Respond(response) => {
                tracing::debug!(
                    target: "jugar_headless::fetch",
                    method = %request.method,
                    url = %request.url,
                    status = response.status,
                    "fetch resolved"
                );
                if response.delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(response.delay_ms)).await;
                }
                Ok(response)
            }
            Reply::Fail(failure) => {
                tracing::debug!(
                    target: "jugar_headless::fetch",
                    method = %request.method,
                    url = %request.url,
                    code = failure.code(),
                    "fetch rejected"
                );
                Err(HeadlessError::FetchFailed {
                    url: request.url,
                    reason: failure.code().to_string(),
                })
            }
        }
    }

    /// `fetch(url)`
    pub async fn get_url(&self, url: &str) -> HeadlessResult<MockResponse> {
        self.fetch(FetchRequest::get(url)).await
    }

    /// Every request so far, oldest first
    #[must_use]
    pub fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.state().captured.clone()
    }

    /// Captured requests whose URL matches `pattern`
    #[must_use]
    pub fn requests_matching(&self, pattern: &UrlPattern) -> Vec<CapturedRequest> {
        self.state()
            .captured
            .iter()
            .filter(|c| pattern.matches(&c.request.url))
            .cloned()
            .collect()
    }

    fn count_matching(&self, pattern: &UrlPattern) -> usize {
        self.state()
            .captured
            .iter()
            .filter(|c| pattern.matches(&c.request.url))
            .count()
    }

    /// Fail unless at least one request matched `pattern`
    pub fn assert_requested(&self, pattern: &UrlPattern) -> HeadlessResult<()> {
        if self.count_matching(pattern) == 0 {
            return Err(HeadlessError::assertion(format!("no fetch matched {pattern}")));
        }
        Ok(())
    }

    /// Fail unless exactly `times` requests matched `pattern`
    pub fn assert_requested_times(&self, pattern: &UrlPattern, times: usize) -> HeadlessResult<()> {
        match self.count_matching(pattern) {
            n if n == times => Ok(()),
            n => Err(HeadlessError::assertion(format!(
                "{pattern} was fetched {n} time(s), wanted {times}"
            ))),
        }
    }

    /// Fail if any request matched `pattern`
    pub fn assert_not_requested(&self, pattern: &UrlPattern) -> HeadlessResult<()> {
        match self.count_matching(pattern) {
            0 => Ok(()),
            n => Err(HeadlessError::assertion(format!(
                "{pattern} should not have been fetched, saw {n} request(s)"
            ))),
        }
    }

    /// Forget captured requests, keeping routes
    pub fn clear_captured(&self) {
        self.state().captured.clear();
    }

    /// Number of routes, exhausted ones included
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.state().routes.len()
    }

    /// Drop every route
    pub fn clear_routes(&self) {
        self.state().routes.clear();
    }

    /// Return to the state of [`MockFetch::new`]
    pub fn reset(&self) {
        *self.state() = FetchState::fresh();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    mod http_method_tests {
        use super::*;

        #[test]
        fn test_parse_ignores_case() {
            assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
            assert_eq!("Patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
        }

        #[test]
        fn test_unknown_method_rejected() {
            let err = "BREW".parse::<HttpMethod>().unwrap_err();
            assert!(matches!(err, HeadlessError::InvalidRequest { .. }));
        }
    }

    mod mock_response_tests {
        use super::*;

        #[test]
        fn test_default_is_resolved_stand_in() {
            let response = MockResponse::default();
            assert_eq!(response.status, 200);
            assert!(response.ok());
            assert_eq!(response.body, "{}");
            assert_eq!(response.header("Content-Type"), Some("application/json"));
            let body: serde_json::Value = response.body_json().unwrap();
            assert_eq!(body, json!({}));
        }

        #[test]
        fn test_json_and_error() {
            let response = MockResponse::json(&json!({"items": [1, 2]})).unwrap();
            let body: serde_json::Value = response.body_json().unwrap();
            assert_eq!(body["items"][1], 2);

            let response = MockResponse::error(500, "boom");
            assert!(!response.ok());
            assert!(response.body.contains("boom"));
        }

        #[test]
        fn test_text_sets_content_type() {
            let response = MockResponse::text("hi").with_header("X-Trace", "1");
            assert_eq!(response.header("content-type"), Some("text/plain"));
            assert_eq!(response.header("x-trace"), Some("1"));
            assert_eq!(response.body, "hi");
        }
    }

    mod url_pattern_tests {
        use super::*;

        #[test]
        fn test_simple_patterns() {
            let url = "https://api.test/v1/users/42";
            assert!(UrlPattern::exact(url).matches(url));
            assert!(!UrlPattern::exact(url).matches("https://api.test/v1/users/4"));
            assert!(UrlPattern::prefix("https://api").matches(url));
            assert!(UrlPattern::contains("/users/").matches(url));
            assert!(UrlPattern::regex(r"/users/\d+$").unwrap().matches(url));
            assert!(UrlPattern::any().matches(url));
        }

        #[test]
        fn test_glob() {
            let url = "https://api.test/v1/users/42";
            assert!(UrlPattern::glob("**/users/*").matches(url));
            assert!(!UrlPattern::glob("**/orders/*").matches(url));
            assert!(!UrlPattern::glob("*/users").matches(url));
        }

        #[test]
        fn test_glob_suffix_repeated_in_url() {
            assert!(UrlPattern::glob("*/users").matches("/users/1/users"));
            assert!(UrlPattern::glob("https://x/*.json").matches("https://x/a.json/b.json"));
            assert!(!UrlPattern::glob("https://x/*.json").matches("https://x/a.json/b.txt"));
        }

        #[test]
        fn test_glob_treats_regex_syntax_literally() {
            let pattern = UrlPattern::glob("/search?q=*");
            assert!(pattern.matches("/search?q=rust"));
            assert!(!pattern.matches("/searchXq=rust"));
        }

        #[test]
        fn test_invalid_regex_rejected_at_build() {
            let err = UrlPattern::regex("(").unwrap_err();
            assert!(matches!(err, HeadlessError::InvalidRequest { .. }));
        }
    }

    mod mock_fetch_tests {
        use super::*;

        #[tokio::test]
        async fn test_unmatched_request_gets_stand_in() {
            let fetch = MockFetch::new();
            let response = fetch.get_url("/api/anything").await.unwrap();
            assert_eq!(response, MockResponse::default());
            assert_eq!(fetch.captured_requests()[0].status, Some(200));
        }

        #[tokio::test]
        async fn test_block_unmatched() {
            let fetch = MockFetch::new().block_unmatched();
            let response = fetch.get_url("/api/anything").await.unwrap();
            assert_eq!(response.status, 404);
        }

        #[tokio::test]
        async fn test_route_by_method() {
            let fetch = MockFetch::new();
            fetch.get("/api/users", MockResponse::json(&json!([{"id": 1}])).unwrap());
            fetch.post("/api/users", MockResponse::new().with_status(201));

            let listed = fetch.get_url("/api/users").await.unwrap();
            let users: Vec<serde_json::Value> = listed.body_json().unwrap();
            assert_eq!(users.len(), 1);

            let request = FetchRequest::post("/api/users")
                .with_json(&json!({"name": "ada"}))
                .unwrap();
            let created = fetch.fetch(request).await.unwrap();
            assert_eq!(created.status, 201);

            let captured = fetch.captured_requests();
            let posted = &captured[1].request;
            assert_eq!(posted.method, HttpMethod::Post);
            assert_eq!(posted.headers.get("content-type").map(String::as_str), Some("application/json"));
            let body: serde_json::Value = posted.body_json().unwrap();
            assert_eq!(body["name"], "ada");
        }

        #[tokio::test]
        async fn test_route_times_then_fallback() {
            let fetch = MockFetch::new();
            let route = Route::new(
                UrlPattern::contains("/flaky"),
                Reply::Respond(MockResponse::error(503, "unavailable")),
            )
            .method(HttpMethod::Get)
            .times(1);
            fetch.route(route);
            assert_eq!(fetch.get_url("/flaky").await.unwrap().status, 503);
            assert_eq!(fetch.get_url("/flaky").await.unwrap().status, 200);
        }

        #[tokio::test]
        async fn test_failing_route_rejects() {
            let fetch = MockFetch::new();
            fetch.fail("/offline", FetchFailure::Offline);
            let err = fetch.get_url("/offline/data").await.unwrap_err();
            match err {
                HeadlessError::FetchFailed { url, reason } => {
                    assert_eq!(url, "/offline/data");
                    assert_eq!(reason, "net::ERR_INTERNET_DISCONNECTED");
                }
                other => panic!("unexpected error: {other}"),
            }
            assert_eq!(fetch.captured_requests()[0].status, None);
        }

        #[tokio::test(start_paused = true)]
        async fn test_delay_and_capture_clock() {
            let fetch = MockFetch::new();
            fetch.get("/slow", MockResponse::new().with_delay(250));
            let start = Instant::now();
            let _ = fetch.get_url("/slow").await.unwrap();
            assert!(start.elapsed() >= Duration::from_millis(250));

            let _ = fetch.get_url("/after").await.unwrap();
            let captured = fetch.captured_requests();
            assert_eq!(captured[0].elapsed_ms, 0);
            assert!(captured[1].elapsed_ms >= 250);
        }

        #[tokio::test]
        async fn test_assertions() {
            let fetch = MockFetch::new();
            let _ = fetch.get_url("/api/config").await.unwrap();
            let _ = fetch.get_url("/api/config").await.unwrap();

            let config = UrlPattern::contains("/api/config");
            assert!(fetch.assert_requested(&config).is_ok());
            assert!(fetch.assert_requested_times(&config, 2).is_ok());
            let err = fetch.assert_requested_times(&config, 1).unwrap_err();
            assert!(err.to_string().contains("fetched 2 time(s), wanted 1"));
            assert!(fetch.assert_not_requested(&config).is_err());
            assert!(fetch
                .assert_not_requested(&UrlPattern::contains("/admin"))
                .is_ok());
        }

        #[tokio::test]
        async fn test_reset_matches_fresh_stub() {
            let fetch = MockFetch::new().block_unmatched();
            fetch.get("/a", MockResponse::text("a"));
            let _ = fetch.get_url("/a").await.unwrap();

            fetch.reset();

            let fresh = MockFetch::new();
            assert_eq!(fetch.route_count(), fresh.route_count());
            assert!(fetch.captured_requests().is_empty());
            assert_eq!(
                fetch.get_url("/anything").await.unwrap(),
                fresh.get_url("/anything").await.unwrap()
            );
        }
    }
}
