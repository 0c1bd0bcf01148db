//! Mock transport for testing.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::traits::*;

/// Mock transport for testing.
///
/// Replays scripted responses in order and records every request it was
/// asked to send. Once the script runs out every call fails at the
/// transport level.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and JSON body.
    pub fn with_json(self, status: u16, body: serde_json::Value) -> Self {
        self.push(Ok(HttpResponse::new(status_code(status)).with_json(&body)));
        self
    }

    /// Queue a response with the given status and an empty body.
    pub fn with_status(self, status: u16) -> Self {
        self.push(Ok(HttpResponse::new(status_code(status))));
        self
    }

    /// Queue a response with the given status and raw body.
    pub fn with_body(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.push(Ok(HttpResponse::new(status_code(status)).with_body(body)));
        self
    }

    /// Queue a transport-level failure.
    pub fn with_failure(self, error: TransportError) -> Self {
        self.push(Err(error));
        self
    }

    /// All requests sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of requests sent so far.
    pub fn call_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn push(&self, entry: Result<HttpResponse, TransportError>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(entry);
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Connect(
                    "mock transport has no scripted response".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_in_order() {
        let transport = MockTransport::new()
            .with_status(201)
            .with_json(200, serde_json::json!({"ok": true}));

        let first = transport
            .send(HttpRequest::new(Method::Post, "http://sl/a"))
            .await
            .unwrap();
        assert_eq!(first.status, StatusCode::CREATED);

        let second = transport
            .send(HttpRequest::new(Method::Get, "http://sl/b"))
            .await
            .unwrap();
        assert_eq!(second.status, StatusCode::OK);
        assert_eq!(second.json::<serde_json::Value>().unwrap()["ok"], true);

        assert_eq!(transport.call_count(), 2);
        assert_eq!(transport.requests()[1].url, "http://sl/b");
    }

    #[tokio::test]
    async fn test_mock_exhausted_script_fails() {
        let transport = MockTransport::new();
        let result = transport
            .send(HttpRequest::new(Method::Get, "http://sl/x"))
            .await;
        assert!(matches!(result, Err(TransportError::Connect(_))));
        assert_eq!(transport.call_count(), 1);
    }
}
