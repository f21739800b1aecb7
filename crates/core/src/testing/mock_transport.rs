//! Mock HTTP transport for testing provider and indexer clients.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use crate::http::{HttpRequest, HttpResponse, HttpTransport, TransportError};

struct Route {
    pattern: String,
    responses: VecDeque<HttpResponse>,
}

#[derive(Default)]
struct State {
    routes: Vec<Route>,
    requests: Vec<HttpRequest>,
    next_error: Option<TransportError>,
}

/// Mock implementation of the HttpTransport trait.
///
/// Routes are matched by substring against `"{METHOD} {full_url}"`, so a
/// pattern may be a path fragment (`"magnet/instant"`) or pin the method
/// (`"GET https://host/torrents?"`). The most recently registered matching
/// route wins. Unmatched requests get a 404.
///
/// # Example
///
/// ```rust,ignore
/// use streamrelay_core::http::HttpResponse;
/// use streamrelay_core::testing::MockTransport;
///
/// let transport = Arc::new(MockTransport::new());
/// transport.respond_with("/user", HttpResponse::new(200, r#"{"username":"u"}"#));
///
/// // ... drive a client ...
///
/// assert_eq!(transport.call_count(), 1);
/// assert!(transport.requests()[0].full_url().ends_with("/user"));
/// ```
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<State>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("requests", &self.call_count())
            .finish()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test must not poison assertions in the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Always answer requests matching `pattern` with `response`.
    pub fn respond_with(&self, pattern: &str, response: HttpResponse) {
        self.respond_sequence(pattern, vec![response]);
    }

    /// Answer matching requests with `responses` in order. The last response
    /// repeats once the others are used up.
    pub fn respond_sequence(&self, pattern: &str, responses: Vec<HttpResponse>) {
        self.lock().routes.push(Route {
            pattern: pattern.to_string(),
            responses: responses.into(),
        });
    }

    /// Fail the next request with a transport error.
    pub fn set_next_error(&self, error: TransportError) {
        self.lock().next_error = Some(error);
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let key = format!("{} {}", request.method.as_str(), request.full_url());
        let mut state = self.lock();
        state.requests.push(request);

        if let Some(error) = state.next_error.take() {
            return Err(error);
        }

        let route = state
            .routes
            .iter_mut()
            .rev()
            .find(|route| key.contains(&route.pattern));

        Ok(match route {
            Some(route) if route.responses.len() > 1 => {
                route.responses.pop_front().unwrap_or_else(not_found)
            }
            Some(route) => route.responses.front().cloned().unwrap_or_else(not_found),
            None => not_found(),
        })
    }
}

fn not_found() -> HttpResponse {
    HttpResponse::new(404, "not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_latest_route_wins_and_sequence_repeats_last() {
        let transport = MockTransport::new();
        transport.respond_with("/a", HttpResponse::new(200, "old"));
        transport.respond_sequence(
            "/a",
            vec![HttpResponse::new(500, "first"), HttpResponse::new(200, "then")],
        );

        let get = || HttpRequest::get("https://host/a");
        assert_eq!(transport.execute(get()).await.unwrap().body, "first");
        assert_eq!(transport.execute(get()).await.unwrap().body, "then");
        assert_eq!(transport.execute(get()).await.unwrap().body, "then");
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unmatched_is_404_and_errors_are_one_shot() {
        let transport = MockTransport::new();
        transport.set_next_error(TransportError::Timeout);

        let err = transport.execute(HttpRequest::get("https://host/x")).await.unwrap_err();
        assert_eq!(err, TransportError::Timeout);

        let response = transport.execute(HttpRequest::get("https://host/x")).await.unwrap();
        assert_eq!(response.status, 404);
    }
}
