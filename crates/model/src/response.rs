use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::provider::ModelProviderError;

/// A streaming response from the model provider.
pub trait ModelResponse: Send + 'static {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Waits for the next event from the response.
    ///
    /// - `Ok(Some(event))` delivers an event; more may follow.
    /// - `Ok(None)` means the response has completed. Calling this method
    ///   again after completion should keep returning `Ok(None)`.
    /// - `Err(error)` means the response failed, and no more events will
    ///   be produced.
    ///
    /// A well-behaved response emits message deltas and tool calls first,
    /// then exactly one [`ModelResponseEvent::Completed`].
    fn next_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<ModelResponseEvent>, Self::Error>> + Send;
}

/// The reason why a model response has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFinishReason {
    /// The model needs to call a tool.
    ToolCalls,
    /// The model has finished generating text.
    Stop,
}

/// Describes a tool call request from the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// The unique identifier for the tool call request.
    pub id: String,
    /// The name of the tool to call.
    pub name: String,
    /// The arguments to pass to the tool, usually a JSON object.
    pub arguments: Value,
}

/// The event from a model response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelResponseEvent {
    /// The response has been completed.
    Completed(ModelFinishReason),
    /// Received a message delta.
    MessageDelta(String),
    /// Received a tool call request.
    ToolCall(ToolCallRequest),
}
