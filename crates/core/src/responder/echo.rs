use async_trait::async_trait;

use crate::responder::Responder;
use crate::{Error, Message, Role};

/// A responder that always answers with the same text.
///
/// Useful for wiring up dialogues without a model, and in tests.
#[derive(Clone, Debug)]
pub struct EchoResponder {
    name: String,
    response_text: String,
}

impl EchoResponder {
    /// Creates a responder named `name` that always replies with
    /// `response_text`.
    #[inline]
    pub fn new<N, T>(name: N, response_text: T) -> Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            response_text: response_text.into(),
        }
    }
}

#[async_trait]
impl Responder for EchoResponder {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(
        &mut self,
        incoming: Option<&Message>,
    ) -> Result<Message, Error> {
        if let Some(incoming) = incoming {
            info!("{} received '{}'", self.name, incoming.content());
        }
        Ok(Message::new(&self.name, &self.response_text, Role::Assistant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reply_ignores_input() {
        let mut bob = EchoResponder::new("Bob", "Hello!");
        for input in ["Hi", "", "exit", "What's the weather like?"] {
            let incoming = Message::new("user", input, Role::User);
            let reply = bob.respond(Some(&incoming)).await.unwrap();
            assert_eq!(reply.name(), "Bob");
            assert_eq!(reply.content(), "Hello!");
            assert_eq!(reply.role(), Role::Assistant);
        }

        let reply = bob.respond(None).await.unwrap();
        assert_eq!(reply.content(), "Hello!");
    }
}
