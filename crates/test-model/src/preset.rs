use parley_model::{ErrorKind, ToolCallRequest};
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "message_delta")]
    MessageDelta(String),
    #[serde(rename = "tool_call")]
    ToolCall(ToolCallRequest),
}

/// The preset outcome of one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request fails with this kind instead of streaming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<PresetFailure>,
}

/// A failure that the test model reports instead of a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresetFailure {
    /// The request itself is rejected.
    Request,
    /// The response fails after the preset events have been delivered.
    MidStream,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failure: None,
        }
    }

    /// Creates a response that streams `text` as a single delta.
    #[inline]
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        Self::with_events([PresetEvent::MessageDelta(text.into())])
    }

    /// Makes the request fail at the given point.
    #[inline]
    pub fn with_failure(mut self, failure: PresetFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub(crate) fn error_kind(&self) -> ErrorKind {
        match self.failure {
            Some(PresetFailure::Request) => ErrorKind::Unavailable,
            _ => ErrorKind::Other,
        }
    }
}
