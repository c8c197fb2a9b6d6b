use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::time::Duration;

use parley_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::sleep;

#[derive(Debug)]
struct EchoingModelError(ErrorKind);

impl Display for EchoingModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for EchoingModelError {}

impl ModelProviderError for EchoingModelError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Streams back "You said <last user message>" one word at a time.
#[derive(Debug)]
struct EchoingModelResponse {
    words: VecDeque<String>,
    completed: bool,
}

impl EchoingModelResponse {
    fn new(input: &str) -> Self {
        let words = format!("You said {input}")
            .split(' ')
            .map(ToString::to_string)
            .collect();
        Self {
            words,
            completed: false,
        }
    }
}

impl ModelResponse for EchoingModelResponse {
    type Error = EchoingModelError;

    async fn next_event(
        &mut self,
    ) -> Result<Option<ModelResponseEvent>, Self::Error> {
        sleep(Duration::from_millis(1)).await;

        if let Some(mut word) = self.words.pop_front() {
            if !self.words.is_empty() {
                word.push(' ');
            }
            return Ok(Some(ModelResponseEvent::MessageDelta(word)));
        }
        if !self.completed {
            self.completed = true;
            return Ok(Some(ModelResponseEvent::Completed(
                ModelFinishReason::Stop,
            )));
        }
        Ok(None)
    }
}

struct EchoingModelProvider;

impl ModelProvider for EchoingModelProvider {
    type Error = EchoingModelError;
    type Response = EchoingModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let last_user_input = req.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User { content } => Some(content.as_str()),
            _ => None,
        });
        let result = match last_user_input {
            Some(input) => Ok(EchoingModelResponse::new(input)),
            None => Err(EchoingModelError(ErrorKind::Other)),
        };
        ready(result)
    }
}

#[tokio::test]
async fn test_completion() {
    let provider = EchoingModelProvider;
    let req = ModelRequest {
        messages: vec![
            ModelMessage::system("Repeat after the user."),
            ModelMessage::user("Good morning"),
        ],
        tools: vec![],
    };
    let mut resp = provider.send_request(&req).await.unwrap();

    let mut resp_message = String::new();
    let mut finish_reason = None;
    while let Some(event) = resp.next_event().await.unwrap() {
        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                resp_message.push_str(&delta);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
            _ => unreachable!("unexpected event: {event:?}"),
        }
    }

    assert_eq!(resp_message, "You said Good morning");
    assert_eq!(finish_reason, Some(ModelFinishReason::Stop));
    // Exhausted responses keep reporting completion.
    assert_eq!(resp.next_event().await.unwrap(), None);
}

#[tokio::test]
async fn test_error() {
    let provider = EchoingModelProvider;
    let req = ModelRequest {
        messages: vec![ModelMessage::system("Repeat after the user.")],
        tools: vec![],
    };
    let result = provider.send_request(&req).await;
    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);
}
