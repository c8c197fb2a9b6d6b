use std::collections::VecDeque;

use parley_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use serde_json::Value;

use crate::Error;
use crate::io::Sse;
use crate::proto::{ChatCompletionChunk, ToolCall};

/// A streaming chat completion.
///
/// Text deltas are surfaced as soon as they arrive. Tool calls stream as
/// indexed fragments, so they are merged here and only surfaced once the
/// server reports a finish reason (or the stream ends).
pub struct OllamaResponse {
    sse: Sse,
    pending: VecDeque<ModelResponseEvent>,
    tool_calls: Vec<ToolCall>,
    completed: bool,
    exhausted: bool,
}

impl OllamaResponse {
    #[inline]
    pub(crate) fn from_sse(sse: Sse) -> Self {
        Self {
            sse,
            pending: Default::default(),
            tool_calls: Default::default(),
            completed: false,
            exhausted: false,
        }
    }

    fn absorb(&mut self, chunk: ChatCompletionChunk) {
        // Ollama only ever returns one choice.
        let Some(choice) = chunk.choices.into_iter().next() else {
            return;
        };

        if let Some(reasoning) = choice.delta.reasoning {
            trace!("reasoning delta: {reasoning:?}");
        }
        if let Some(content) = choice.delta.content {
            if !content.is_empty() {
                self.pending
                    .push_back(ModelResponseEvent::MessageDelta(content));
            }
        }
        for tool_call in choice.delta.tool_calls.into_iter().flatten() {
            self.merge_tool_call(tool_call);
        }

        if let Some(finish_reason) = choice.finish_reason {
            let finish_reason = if finish_reason == "tool_calls" {
                ModelFinishReason::ToolCalls
            } else {
                ModelFinishReason::Stop
            };
            self.complete(Some(finish_reason));
        }
    }

    fn merge_tool_call(&mut self, tool_call: ToolCall) {
        // Fragments without an index each describe a whole call.
        let existing = tool_call.index.and_then(|index| {
            self.tool_calls.iter_mut().find(|t| t.index == Some(index))
        });
        let Some(partial) = existing else {
            self.tool_calls.push(tool_call);
            return;
        };

        if let Some(id) = tool_call.id {
            partial.id.get_or_insert_default().push_str(&id);
        }
        if let Some(ty) = tool_call.r#type {
            partial.r#type = Some(ty);
        }
        let Some(function) = tool_call.function else {
            return;
        };
        let partial_func = partial.function.get_or_insert_with(|| {
            crate::proto::FunctionToolCall {
                name: None,
                arguments: None,
            }
        });
        if let Some(name) = function.name {
            partial_func.name.get_or_insert_default().push_str(&name);
        }
        if let Some(arguments) = function.arguments {
            partial_func
                .arguments
                .get_or_insert_default()
                .push_str(&arguments);
        }
    }

    /// Flushes merged tool calls, then the completion event. Only the
    /// first call has any effect.
    fn complete(&mut self, reason: Option<ModelFinishReason>) {
        if self.completed {
            return;
        }
        self.completed = true;

        let has_tool_calls = !self.tool_calls.is_empty();
        for (idx, tool_call) in self.tool_calls.drain(..).enumerate() {
            self.pending
                .push_back(ModelResponseEvent::ToolCall(finish_tool_call(
                    idx, tool_call,
                )));
        }

        let reason = reason.unwrap_or(if has_tool_calls {
            ModelFinishReason::ToolCalls
        } else {
            ModelFinishReason::Stop
        });
        self.pending.push_back(ModelResponseEvent::Completed(reason));
    }
}

impl ModelResponse for OllamaResponse {
    type Error = crate::Error;

    async fn next_event(
        &mut self,
    ) -> Result<Option<ModelResponseEvent>, Self::Error> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if self.exhausted {
                return Ok(None);
            }

            let sse_event = self.sse.next_event().await.map_err(|err| {
                self.exhausted = true;
                Error::new(format!("malformed stream: {err:?}"), ErrorKind::Other)
            })?;
            let Some(sse_event) = sse_event else {
                self.exhausted = true;
                self.complete(None);
                continue;
            };
            trace!("got sse event: {sse_event}");
            if sse_event == "[DONE]" {
                self.exhausted = true;
                self.complete(None);
                continue;
            }

            let chunk = serde_json::from_str::<ChatCompletionChunk>(&sse_event)
                .map_err(|err| {
                    self.exhausted = true;
                    Error::new(format!("{err}"), ErrorKind::Other)
                })?;
            self.absorb(chunk);
        }
    }
}

fn finish_tool_call(idx: usize, tool_call: ToolCall) -> ToolCallRequest {
    let (name, arguments) = match tool_call.function {
        Some(function) => (function.name, function.arguments),
        None => (None, None),
    };
    let arguments = arguments
        .filter(|args| !args.trim().is_empty())
        .map(|args| {
            serde_json::from_str::<Value>(&args).unwrap_or_else(|err| {
                warn!("tool call arguments are not valid JSON: {err}");
                Value::Null
            })
        })
        .unwrap_or(Value::Null);
    ToolCallRequest {
        id: tool_call.id.unwrap_or_else(|| format!("call_{idx}")),
        name: name.unwrap_or_default(),
        arguments,
    }
}
