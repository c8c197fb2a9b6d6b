//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use parley_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::sleep;

pub use preset::*;

// Gives concurrent tasks a chance to run between streamed events.
const EVENT_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    preset: PresetResponse,
    event_idx: usize,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    async fn next_event(
        &mut self,
    ) -> Result<Option<ModelResponseEvent>, Self::Error> {
        let events = &self.preset.events;
        if self.event_idx > events.len() {
            // In case this method is called after completion.
            return Ok(None);
        }

        sleep(EVENT_INTERVAL).await;

        if self.event_idx < events.len() {
            let event = match &events[self.event_idx] {
                PresetEvent::MessageDelta(msg) => {
                    ModelResponseEvent::MessageDelta(msg.clone())
                }
                PresetEvent::ToolCall(req) => {
                    ModelResponseEvent::ToolCall(req.clone())
                }
            };
            self.event_idx += 1;
            return Ok(Some(event));
        }

        self.event_idx += 1;
        if self.preset.failure == Some(PresetFailure::MidStream) {
            return Err(Error {
                message: "stream interrupted",
                kind: self.preset.error_kind(),
            });
        }
        let has_tool_call = events
            .iter()
            .any(|event| matches!(event, PresetEvent::ToolCall(_)));
        Ok(Some(ModelResponseEvent::Completed(if has_tool_call {
            ModelFinishReason::ToolCalls
        } else {
            ModelFinishReason::Stop
        })))
    }
}

#[derive(Default)]
struct Script {
    responses: VecDeque<PresetResponse>,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Responses are queued up front and handed out one per request, in
/// order. Every request the model receives is recorded so tests can
/// check what a responder actually sent. Running out of queued
/// responses is reported as an error.
///
/// Clones share the same script, so a test can keep one handle while
/// another is moved into a responder.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
}

impl TestModelProvider {
    /// Queues the response for the next unanswered request.
    #[inline]
    pub fn push_response(&self, preset: PresetResponse) {
        self.script().responses.push_back(preset);
    }

    /// Returns every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.script().requests.clone()
    }

    /// Returns the number of queued responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script().responses.len()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread can't leave the script half-updated.
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut script = self.script();
        script.requests.push(req.clone());
        let result = match script.responses.pop_front() {
            None => Err(Error {
                message: "no enough responses",
                kind: ErrorKind::RateLimitExceeded,
            }),
            Some(preset) if preset.failure == Some(PresetFailure::Request) => {
                Err(Error {
                    message: "request rejected",
                    kind: preset.error_kind(),
                })
            }
            Some(preset) => Ok(TestModelResponse {
                preset,
                event_idx: 0,
            }),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use parley_model::{ModelMessage, ModelTool, ToolCallRequest};
    use serde_json::json;

    use super::*;

    async fn collect_response(
        mut resp: TestModelResponse,
    ) -> (String, Option<ToolCallRequest>, ModelFinishReason) {
        let mut msg = String::new();
        let mut tool_call = None;
        loop {
            let event = resp.next_event().await.unwrap().unwrap();
            match event {
                ModelResponseEvent::Completed(reason) => {
                    assert_eq!(resp.next_event().await.unwrap(), None);
                    return (msg, tool_call, reason);
                }
                ModelResponseEvent::MessageDelta(delta) => {
                    msg.push_str(&delta);
                }
                ModelResponseEvent::ToolCall(req) => tool_call = Some(req),
            }
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let provider = TestModelProvider::default();
        provider.push_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Hello, ".to_owned()),
            PresetEvent::MessageDelta("world!".to_owned()),
        ]));
        provider.push_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Sure, ".to_owned()),
            PresetEvent::MessageDelta("let me take a look.".to_owned()),
            PresetEvent::ToolCall(ToolCallRequest {
                id: "tool:1".to_owned(),
                name: "current_time".to_owned(),
                arguments: json!({}),
            }),
        ]));

        let mut req = ModelRequest {
            messages: vec![ModelMessage::user("Hi")],
            tools: vec![ModelTool {
                name: "current_time".to_owned(),
                description: "Returns the local time".to_owned(),
                parameters: json!({ "type": "object", "properties": {} }),
            }],
        };
        let resp = provider.send_request(&req).await.unwrap();
        let (msg, _, reason) = collect_response(resp).await;
        assert_eq!(msg, "Hello, world!");
        assert_eq!(reason, ModelFinishReason::Stop);

        req.messages.push(ModelMessage::assistant(msg));
        req.messages.push(ModelMessage::user("What time is it?"));
        let resp = provider.send_request(&req).await.unwrap();
        let (msg, tool_call, reason) = collect_response(resp).await;
        assert_eq!(msg, "Sure, let me take a look.");
        assert_eq!(tool_call.unwrap().name, "current_time");
        assert_eq!(reason, ModelFinishReason::ToolCalls);

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn test_failures() {
        let provider = TestModelProvider::default();
        provider.push_response(
            PresetResponse::with_text("ignored")
                .with_failure(PresetFailure::Request),
        );
        provider.push_response(
            PresetResponse::with_text("partial")
                .with_failure(PresetFailure::MidStream),
        );

        let req = ModelRequest::default();
        let err = provider.send_request(&req).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Unavailable);

        let mut resp = provider.send_request(&req).await.unwrap();
        assert_eq!(
            resp.next_event().await.unwrap(),
            Some(ModelResponseEvent::MessageDelta("partial".to_owned()))
        );
        assert!(resp.next_event().await.is_err());

        // The script is exhausted now.
        let err = provider.send_request(&req).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }
}
