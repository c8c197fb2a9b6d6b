//! Core logic including messages, responders, tool execution and the
//! turn-taking dialogue loop.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod dialogue;
mod error;
mod message;
mod model_client;
pub mod responder;
pub mod tool;

pub use dialogue::{
    DialogueLoop, DialogueLoopBuilder, EXIT_SENTINEL, Ending, Feedback,
    Summary, TurnObserver, is_exit,
};
pub use error::Error;
pub use message::{Message, Role};
pub use responder::Responder;
