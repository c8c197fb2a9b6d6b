//! Participants that take turns in a dialogue.
//!
//! A [`Responder`] receives the previous message (or nothing, when it
//! opens a round) and produces a new one. Which variant answers is
//! decided when the dialogue is assembled; there is no runtime dispatch
//! on concrete types.

mod console;
mod echo;
mod model;

use async_trait::async_trait;

pub use console::ConsoleResponder;
pub use echo::EchoResponder;
pub use model::{ModelResponder, ModelResponderBuilder};

use crate::{Error, Message};

/// Anything that can take a turn in a dialogue.
#[async_trait]
pub trait Responder: Send {
    /// Returns the display name, which is also the sender name of every
    /// message this responder produces.
    fn name(&self) -> &str;

    /// Produces a reply to `incoming`.
    ///
    /// This may suspend for a long time, waiting on the console or a
    /// model server.
    async fn respond(&mut self, incoming: Option<&Message>)
    -> Result<Message, Error>;
}

#[async_trait]
impl<R: Responder + ?Sized> Responder for Box<R> {
    #[inline]
    fn name(&self) -> &str {
        (**self).name()
    }

    #[inline]
    async fn respond(
        &mut self,
        incoming: Option<&Message>,
    ) -> Result<Message, Error> {
        (**self).respond(incoming).await
    }
}
