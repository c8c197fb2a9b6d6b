use std::pin::Pin;
use std::sync::Arc;

use parley_model::{
    ModelFinishReason, ModelProvider, ModelRequest, ModelResponse,
    ModelResponseEvent, ToolCallRequest,
};
use tracing::Instrument;

use crate::Error;

type SendRequestResult = Result<ModelClientResponse, Error>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that drains its streamed responses
/// and provides a type-erased interface for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since responders hold the client
        // without a generic parameter.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and waits for the complete response.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(&self, req: ModelRequest) -> SendRequestResult {
        (self.handler_fn)(req).await
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug, Default)]
pub struct ModelClientResponse {
    /// All message deltas, joined.
    pub transcript: String,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCallRequest>,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
) -> SendRequestResult {
    let mut resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Error::model(err));
        }
    };

    let mut result = ModelClientResponse::default();

    trace!("start receiving events");
    loop {
        let event = match resp.next_event().await {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(Error::model(err));
            }
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(msg) => {
                result.transcript.push_str(&msg);
            }
            ModelResponseEvent::ToolCall(req) => {
                result.tool_calls.push(req);
            }
            ModelResponseEvent::Completed(reason) => {
                result.finish_reason = Some(reason);
            }
        }
    }
    trace!("finished a request");

    Ok(result)
}

#[cfg(test)]
mod tests {
    use parley_model::{ErrorKind, ModelMessage};
    use parley_test_model::{
        PresetEvent, PresetFailure, PresetResponse, TestModelProvider,
    };
    use serde_json::json;

    use super::*;

    fn hi() -> ModelRequest {
        ModelRequest {
            messages: vec![ModelMessage::user("Hi")],
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let model_provider = TestModelProvider::default();
        for _ in 0..3 {
            model_provider.push_response(PresetResponse::with_events([
                PresetEvent::MessageDelta("How ".to_owned()),
                PresetEvent::MessageDelta("are ".to_owned()),
                PresetEvent::MessageDelta("you?".to_owned()),
            ]));
        }

        let model_client = ModelClient::new(model_provider);
        for _ in 0..3 {
            let resp = model_client.send_request(hi()).await.unwrap();
            assert_eq!(resp.transcript, "How are you?");
            assert!(resp.tool_calls.is_empty());
            assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
        }
    }

    #[tokio::test]
    async fn test_tool_calls_collected() {
        let model_provider = TestModelProvider::default();
        model_provider.push_response(PresetResponse::with_events([
            PresetEvent::ToolCall(ToolCallRequest {
                id: "call_0".to_owned(),
                name: "current_time".to_owned(),
                arguments: json!({}),
            }),
        ]));

        let resp = ModelClient::new(model_provider)
            .send_request(hi())
            .await
            .unwrap();
        assert_eq!(resp.transcript, "");
        assert_eq!(resp.tool_calls.len(), 1);
        assert_eq!(resp.finish_reason, Some(ModelFinishReason::ToolCalls));
    }

    #[tokio::test]
    async fn test_error_handling() {
        let model_provider = TestModelProvider::default();
        let model_client = ModelClient::new(model_provider.clone());
        let resp_or_err = model_client.send_request(hi()).await;
        assert!(matches!(
            resp_or_err,
            Err(Error::Model {
                kind: ErrorKind::RateLimitExceeded,
                ..
            })
        ));

        model_provider.push_response(
            PresetResponse::with_text("cut")
                .with_failure(PresetFailure::MidStream),
        );
        let resp_or_err = model_client.send_request(hi()).await;
        assert!(matches!(resp_or_err, Err(Error::Model { .. })));
    }
}
