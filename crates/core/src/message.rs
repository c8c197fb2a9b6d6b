use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(0);

/// Who a message speaks as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that set up a dialogue.
    System,
    /// A human at the console.
    User,
    /// A responder answering on its own behalf.
    Assistant,
}

/// A message passed from one turn to the next.
///
/// Messages are immutable: responders always produce a new one. There is
/// intentionally no `PartialEq`, two messages with the same fields are
/// still two different messages (their [`id`](Self::id) differs).
#[derive(Clone, Debug, Serialize)]
pub struct Message {
    id: String,
    name: String,
    content: String,
    role: Role,
}

impl Message {
    /// Creates a new message.
    pub fn new<N, C>(name: N, content: C, role: Role) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        let id = NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("msg:{id}"),
            name: name.into(),
            content: content.into(),
            role,
        }
    }

    /// Returns the process-unique identifier of this message.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the sender's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the body.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the role tag.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }
}
