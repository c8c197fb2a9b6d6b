use async_trait::async_trait;
use parley_model::{ModelMessage, ModelProvider, ModelRequest};

use crate::model_client::ModelClient;
use crate::responder::Responder;
use crate::tool::Toolkit;
use crate::{Error, Message, Role};

const DEFAULT_NAME: &str = "assistant";
const DEFAULT_MAX_STEPS: usize = 10;

/// [`ModelResponder`] builder.
pub struct ModelResponderBuilder {
    model_client: ModelClient,
    name: String,
    system_prompt: Option<String>,
    toolkit: Toolkit,
    max_steps: usize,
}

impl ModelResponderBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            name: DEFAULT_NAME.to_owned(),
            system_prompt: None,
            toolkit: Toolkit::default(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Sets the display name of the responder.
    #[inline]
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the system prompt, sent ahead of the memory on every request.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the tools the model may call.
    #[inline]
    pub fn with_toolkit(mut self, toolkit: Toolkit) -> Self {
        self.toolkit = toolkit;
        self
    }

    /// Limits how many model calls a single turn may take. Each round of
    /// tool calls costs one more. Values below 1 are treated as 1.
    #[inline]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Builds the responder.
    #[inline]
    pub fn build(self) -> ModelResponder {
        ModelResponder {
            model_client: self.model_client,
            name: self.name,
            system_prompt: self.system_prompt,
            toolkit: self.toolkit,
            max_steps: self.max_steps,
            memory: vec![],
        }
    }
}

/// A responder whose replies are generated by a language model.
///
/// Each turn runs a reason-act loop: the model either answers, or asks
/// for tool calls whose results are fed back before asking again. The
/// responder remembers the whole exchange, so later turns see earlier
/// ones.
pub struct ModelResponder {
    model_client: ModelClient,
    name: String,
    system_prompt: Option<String>,
    toolkit: Toolkit,
    max_steps: usize,
    memory: Vec<ModelMessage>,
}

impl ModelResponder {
    /// Returns what the responder remembers, oldest first. The system
    /// prompt is not part of the memory.
    #[inline]
    pub fn memory(&self) -> &[ModelMessage] {
        &self.memory
    }

    /// Forgets every previous turn.
    #[inline]
    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    fn build_model_request(&self) -> ModelRequest {
        let system = self.system_prompt.as_ref().map(ModelMessage::system);
        ModelRequest {
            messages: system
                .into_iter()
                .chain(self.memory.iter().cloned())
                .collect(),
            tools: self.toolkit.definitions(),
        }
    }
}

#[async_trait]
impl Responder for ModelResponder {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(
        &mut self,
        incoming: Option<&Message>,
    ) -> Result<Message, Error> {
        let Some(incoming) = incoming else {
            return Err(Error::NoInput {
                name: self.name.clone(),
            });
        };
        // A failed turn leaves no trace, so the next one starts from the
        // last completed exchange.
        let checkpoint = self.memory.len();
        self.memory.push(match incoming.role() {
            Role::System => ModelMessage::system(incoming.content()),
            Role::User | Role::Assistant => {
                ModelMessage::user(incoming.content())
            }
        });

        let result = self.run_steps().await;
        if result.is_err() {
            self.memory.truncate(checkpoint);
        }
        result
    }
}

impl ModelResponder {
    async fn run_steps(&mut self) -> Result<Message, Error> {
        for step in 1..=self.max_steps {
            let request = self.build_model_request();
            debug!("{} step {step}: {} messages", self.name, request.messages.len());
            let resp = self.model_client.send_request(request).await?;
            match resp.finish_reason {
                Some(reason) => trace!("{} step {step} finished: {reason:?}", self.name),
                None => warn!("{} step {step}: reply ended without a finish reason", self.name),
            }

            let tool_calls = resp.tool_calls;
            self.memory.push(ModelMessage::Assistant {
                content: resp.transcript.clone(),
                tool_calls: tool_calls.clone(),
            });
            if tool_calls.is_empty() {
                return Ok(Message::new(
                    &self.name,
                    resp.transcript,
                    Role::Assistant,
                ));
            }

            for call in &tool_calls {
                let result = self.toolkit.call(call).await;
                self.memory.push(ModelMessage::Tool(result));
            }
        }

        warn!("{} hit the step limit of {}", self.name, self.max_steps);
        Err(Error::StepLimit {
            name: self.name.clone(),
            limit: self.max_steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;
    use std::sync::LazyLock;

    use parley_model::{ToolCallRequest, ToolCallResult};
    use parley_test_model::{
        PresetEvent, PresetFailure, PresetResponse, TestModelProvider,
    };
    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::tool::{Tool, ToolResult};

    static EMPTY_SCHEMA: LazyLock<Value> =
        LazyLock::new(|| json!({ "type": "object", "properties": {} }));

    #[derive(Deserialize)]
    struct NoInput {}

    struct FixedClockTool;

    impl Tool for FixedClockTool {
        type Input = NoInput;

        fn name(&self) -> &str {
            "current_time"
        }

        fn description(&self) -> &str {
            "Returns the current local time."
        }

        fn parameter_schema(&self) -> &Value {
            &EMPTY_SCHEMA
        }

        fn execute(
            &self,
            _input: Self::Input,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Ok("2025-10-01 09:30:00".to_owned()))
        }
    }

    fn clock_call() -> PresetEvent {
        PresetEvent::ToolCall(ToolCallRequest {
            id: "call_0".to_owned(),
            name: "current_time".to_owned(),
            arguments: json!({}),
        })
    }

    fn user(content: &str) -> Message {
        Message::new("user", content, Role::User)
    }

    #[tokio::test]
    async fn test_plain_reply() {
        let provider = TestModelProvider::default();
        provider.push_response(PresetResponse::with_text("Hello there."));

        let mut assistant = ModelResponderBuilder::with_model_provider(provider.clone())
            .with_name("assistant")
            .with_system_prompt("You are a kind assistant.")
            .build();
        let reply = assistant.respond(Some(&user("Hi"))).await.unwrap();
        assert_eq!(reply.name(), "assistant");
        assert_eq!(reply.content(), "Hello there.");
        assert_eq!(reply.role(), Role::Assistant);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].messages,
            vec![
                ModelMessage::system("You are a kind assistant."),
                ModelMessage::user("Hi"),
            ]
        );
        assert!(requests[0].tools.is_empty());
    }

    #[tokio::test]
    async fn test_memory_spans_turns() {
        let provider = TestModelProvider::default();
        provider.push_response(PresetResponse::with_text("Nice to meet you, Ann."));
        provider.push_response(PresetResponse::with_text("You are Ann."));

        let mut assistant =
            ModelResponderBuilder::with_model_provider(provider.clone()).build();
        assistant.respond(Some(&user("I am Ann"))).await.unwrap();
        assistant.respond(Some(&user("Who am I?"))).await.unwrap();

        let requests = provider.requests();
        assert_eq!(
            requests[1].messages,
            vec![
                ModelMessage::user("I am Ann"),
                ModelMessage::assistant("Nice to meet you, Ann."),
                ModelMessage::user("Who am I?"),
            ]
        );
        assert_eq!(assistant.memory().len(), 4);

        assistant.clear_memory();
        assert!(assistant.memory().is_empty());
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let provider = TestModelProvider::default();
        provider.push_response(PresetResponse::with_events([clock_call()]));
        provider.push_response(PresetResponse::with_text("It is 09:30."));

        let mut assistant = ModelResponderBuilder::with_model_provider(provider.clone())
            .with_toolkit(Toolkit::new().with_tool(FixedClockTool))
            .build();
        let reply = assistant
            .respond(Some(&user("What time is it?")))
            .await
            .unwrap();
        assert_eq!(reply.content(), "It is 09:30.");

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].tools[0].name, "current_time");
        assert_eq!(
            requests[1].messages.last(),
            Some(&ModelMessage::Tool(ToolCallResult {
                id: "call_0".to_owned(),
                content: "2025-10-01 09:30:00".to_owned(),
            }))
        );
    }

    #[tokio::test]
    async fn test_step_limit() {
        let provider = TestModelProvider::default();
        for _ in 0..3 {
            provider.push_response(PresetResponse::with_events([clock_call()]));
        }

        let mut assistant = ModelResponderBuilder::with_model_provider(provider.clone())
            .with_toolkit(Toolkit::new().with_tool(FixedClockTool))
            .with_max_steps(2)
            .build();
        let err = assistant.respond(Some(&user("Time?"))).await.unwrap_err();
        assert!(matches!(err, Error::StepLimit { limit: 2, .. }));
        assert_eq!(provider.remaining(), 1);
        assert!(assistant.memory().is_empty());
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let provider = TestModelProvider::default();
        provider.push_response(
            PresetResponse::with_text("").with_failure(PresetFailure::Request),
        );

        let mut assistant =
            ModelResponderBuilder::with_model_provider(provider).build();
        let err = assistant.respond(Some(&user("Hi"))).await.unwrap_err();
        assert!(matches!(err, Error::Model { .. }));
    }

    #[tokio::test]
    async fn test_failed_turn_is_forgotten() {
        let provider = TestModelProvider::default();
        provider.push_response(
            PresetResponse::with_text("").with_failure(PresetFailure::Request),
        );
        provider.push_response(PresetResponse::with_text("Hello again."));

        let mut assistant =
            ModelResponderBuilder::with_model_provider(provider.clone()).build();
        assistant.respond(Some(&user("Hi"))).await.unwrap_err();
        assert!(assistant.memory().is_empty());

        assistant.respond(Some(&user("Hi again"))).await.unwrap();
        assert_eq!(
            provider.requests()[1].messages,
            vec![ModelMessage::user("Hi again")]
        );
    }

    #[tokio::test]
    async fn test_requires_input() {
        let provider = TestModelProvider::default();
        let mut critic = ModelResponderBuilder::with_model_provider(provider.clone())
            .with_name("critic")
            .build();
        let err = critic.respond(None).await.unwrap_err();
        assert!(matches!(err, Error::NoInput { ref name } if name == "critic"));
        assert!(provider.requests().is_empty());
    }
}
