//! The protocol spoken between responders and language models.
//!
//! Responders build a [`ModelRequest`] from their memory and hand it to
//! a [`ModelProvider`]. The provider streams back [`ModelResponseEvent`]s
//! which the caller drains until the response completes.
//!
//! Nothing in this crate talks to a network. Implementors live in their
//! own crates (a local Ollama server, a scripted fake for tests, etc).

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
