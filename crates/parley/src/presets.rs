use parley_core::responder::{
    EchoResponder, ModelResponder, ModelResponderBuilder,
};
use parley_core::tool::Toolkit;
use parley_core::{Message, Role};
use parley_model::ModelProvider;

use crate::tools::CurrentTimeTool;

/// Name of the console participant.
pub const USER_NAME: &str = "user";
/// Name of the general-purpose assistant.
pub const ASSISTANT_NAME: &str = "assistant";
/// Name of the responder that drafts plans.
pub const PLANNER_NAME: &str = "planner";
/// Name of the responder that reviews plans.
pub const CRITIC_NAME: &str = "critic";

/// Builds the model-backed responders of the bundled dialogues.
///
/// Every responder gets its own clone of the provider and its own
/// memory.
#[derive(Clone, Debug)]
pub struct Presets<P> {
    provider: P,
    max_steps: Option<usize>,
}

impl<P: ModelProvider + Clone + 'static> Presets<P> {
    /// Creates presets backed by `provider`.
    #[inline]
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            max_steps: None,
        }
    }

    /// Limits the model calls of a single turn, see
    /// [`ModelResponderBuilder::with_max_steps`].
    #[inline]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// A plain chat assistant.
    pub fn assistant(&self) -> ModelResponder {
        self.builder(ASSISTANT_NAME)
            .with_system_prompt(include_str!("./prompts/assistant.md").trim())
            .build()
    }

    /// A chat assistant that can look up the current time.
    pub fn assistant_with_tools(&self) -> ModelResponder {
        let toolkit = Toolkit::new().with_tool(CurrentTimeTool::new());
        self.builder(ASSISTANT_NAME)
            .with_system_prompt(
                include_str!("./prompts/assistant_tools.md").trim(),
            )
            .with_toolkit(toolkit)
            .build()
    }

    /// A responder that turns a task into a step-by-step plan.
    pub fn planner(&self) -> ModelResponder {
        self.builder(PLANNER_NAME)
            .with_system_prompt(include_str!("./prompts/planner.md").trim())
            .build()
    }

    /// A responder that reviews a plan and suggests improvements.
    pub fn critic(&self) -> ModelResponder {
        self.builder(CRITIC_NAME)
            .with_system_prompt(include_str!("./prompts/critic.md").trim())
            .build()
    }

    fn builder(&self, name: &str) -> ModelResponderBuilder {
        let builder =
            ModelResponderBuilder::with_model_provider(self.provider.clone())
                .with_name(name);
        match self.max_steps {
            Some(max_steps) => builder.with_max_steps(max_steps),
            None => builder,
        }
    }
}

/// Two responders that greet each other with fixed lines.
pub fn greeters() -> [EchoResponder; 2] {
    [
        EchoResponder::new("Alice", "Hello Bob! I'm Alice."),
        EchoResponder::new("Bob", "Hi Alice! How are you doing?"),
    ]
}

/// The message that opens the greeting exchange.
pub fn greeting() -> Message {
    Message::new("system", "Alice, please say hello to Bob.", Role::System)
}

#[cfg(test)]
mod tests {
    use parley_core::Responder;
    use parley_model::ModelMessage;
    use parley_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    #[tokio::test]
    async fn test_each_preset_has_own_prompt() {
        let provider = TestModelProvider::default();
        let presets = Presets::new(provider.clone());
        let task = Message::new(USER_NAME, "Learn Rust", Role::User);

        let mut responders = [
            presets.assistant(),
            presets.assistant_with_tools(),
            presets.planner(),
            presets.critic(),
        ];
        for responder in &mut responders {
            provider.push_response(PresetResponse::with_text("ok"));
            responder.respond(Some(&task)).await.unwrap();
        }

        let requests = provider.requests();
        let prompts: Vec<_> = requests
            .iter()
            .map(|req| match &req.messages[0] {
                ModelMessage::System { content } => content.clone(),
                other => panic!("expected a system prompt, got {other:?}"),
            })
            .collect();
        assert!(prompts[2].contains("planner"));
        assert!(prompts[3].contains("critic"));
        assert!(requests[0].tools.is_empty());
        assert_eq!(requests[1].tools[0].name, "current_time");
        assert_eq!(responders[2].name(), PLANNER_NAME);
    }

    #[tokio::test]
    async fn test_greeters() {
        let [mut alice, mut bob] = greeters();
        let from_alice = alice.respond(Some(&greeting())).await.unwrap();
        let from_bob = bob.respond(Some(&from_alice)).await.unwrap();
        assert_eq!(from_alice.name(), "Alice");
        assert_eq!(from_bob.content(), "Hi Alice! How are you doing?");
    }
}
