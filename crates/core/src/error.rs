use std::error::Error as StdError;
use std::io;

use parley_model::{ErrorKind, ModelProviderError};

/// Errors that abort a turn, and with it the dialogue loop.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The model provider failed to produce a reply.
    #[error("model request failed: {source}")]
    Model {
        /// What went wrong, as classified by the provider.
        kind: ErrorKind,
        /// The provider's own error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// A responder that needs something to answer was called without a
    /// message.
    #[error("{name} needs an incoming message to respond to")]
    NoInput {
        /// Name of the responder.
        name: String,
    },
    /// The model kept calling tools without ever giving a final answer.
    #[error("{name} gave no final answer within {limit} model calls")]
    StepLimit {
        /// Name of the responder.
        name: String,
        /// The configured limit.
        limit: usize,
    },
    /// The console reached end of input.
    #[error("console input closed")]
    InputClosed,
    /// Reading from or writing to the console failed.
    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn model<E: ModelProviderError>(err: E) -> Self {
        Self::Model {
            kind: err.kind(),
            source: Box::new(err),
        }
    }
}
