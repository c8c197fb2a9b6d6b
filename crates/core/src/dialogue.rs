//! The turn-taking dialogue loop.
//!
//! A dialogue alternates between a user-input responder (usually the
//! console) and a pipeline of one or more responders. Each round starts
//! by asking the user; unless the user typed [`EXIT_SENTINEL`], the
//! message is relayed through the pipeline, every responder answering
//! the output of the one before it.


use crate::responder::Responder;
use crate::{Error, Message};

/// The exact input that ends a dialogue. Compared case-sensitively and
/// without trimming.
pub const EXIT_SENTINEL: &str = "exit";

/// Whether the last reply of a round is shown at the next user prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feedback {
    /// Hand the last reply to the user responder, which renders it before
    /// prompting. Fits a ping-pong chat with a single responder.
    Carry,
    /// Start every round with a fresh prompt. Fits relays whose outputs
    /// are already reported through a [`TurnObserver`].
    Discard,
}

impl Feedback {
    /// The policy used when none is configured: [`Feedback::Carry`] for a
    /// single responder, [`Feedback::Discard`] otherwise.
    #[inline]
    pub fn for_pipeline_len(len: usize) -> Self {
        if len == 1 { Self::Carry } else { Self::Discard }
    }
}

/// Why a dialogue stopped without an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ending {
    /// The user typed the exit sentinel.
    Sentinel,
    /// The user's input stream ended.
    InputClosed,
}

/// What a finished dialogue looked like.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Summary {
    /// Number of completed rounds.
    pub rounds: usize,
    /// Why the dialogue stopped.
    pub ending: Ending,
}

/// Hooks for reporting progress around each turn.
///
/// All methods default to doing nothing.
pub trait TurnObserver: Send {
    /// The user responder produced a message that will be relayed.
    fn on_user_input(&mut self, _msg: &Message) {}

    /// A pipeline responder is about to take its turn.
    fn on_turn_started(&mut self, _name: &str) {}

    /// A pipeline responder finished its turn.
    fn on_turn_finished(&mut self, _msg: &Message) {}

    /// A round went through the whole pipeline.
    fn on_round_finished(&mut self, _input: &Message, _outputs: &[Message]) {}

    /// The dialogue is about to stop.
    fn on_terminated(&mut self, _ending: Ending) {}
}

struct SilentObserver;

impl TurnObserver for SilentObserver {}

/// [`DialogueLoop`] builder.
pub struct DialogueLoopBuilder<U> {
    user: U,
    pipeline: Vec<Box<dyn Responder>>,
    feedback: Option<Feedback>,
    observer: Option<Box<dyn TurnObserver>>,
}

impl<U: Responder> DialogueLoopBuilder<U> {
    /// Appends a responder to the pipeline. Responders answer in the
    /// order they are added.
    #[inline]
    pub fn with_responder<R: Responder + 'static>(mut self, responder: R) -> Self {
        self.pipeline.push(Box::new(responder));
        self
    }

    /// Overrides the feedback policy.
    #[inline]
    pub fn with_feedback(mut self, feedback: Feedback) -> Self {
        self.feedback = Some(feedback);
        self
    }

    /// Attaches an observer for progress reporting.
    #[inline]
    pub fn with_observer<O: TurnObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Builds the dialogue loop.
    pub fn build(self) -> DialogueLoop<U> {
        let feedback = self
            .feedback
            .unwrap_or_else(|| Feedback::for_pipeline_len(self.pipeline.len()));
        DialogueLoop {
            user: self.user,
            pipeline: self.pipeline,
            feedback,
            observer: self.observer.unwrap_or_else(|| Box::new(SilentObserver)),
        }
    }
}

/// A strictly sequential dialogue between a user responder and a
/// pipeline of responders.
///
/// Only one responder is ever running. An error from any responder
/// aborts the current round and is returned from [`run`](Self::run);
/// the round is not retried.
pub struct DialogueLoop<U> {
    user: U,
    pipeline: Vec<Box<dyn Responder>>,
    feedback: Feedback,
    observer: Box<dyn TurnObserver>,
}

impl<U: Responder> DialogueLoop<U> {
    /// Starts building a dialogue whose rounds are opened by `user`.
    #[inline]
    pub fn builder(user: U) -> DialogueLoopBuilder<U> {
        DialogueLoopBuilder {
            user,
            pipeline: vec![],
            feedback: None,
            observer: None,
        }
    }

    /// Returns the feedback policy in effect.
    #[inline]
    pub fn feedback(&self) -> Feedback {
        self.feedback
    }

    /// Consumes the loop, returning the user responder.
    #[inline]
    pub fn into_user(self) -> U {
        self.user
    }

    /// Runs rounds until the user types the exit sentinel or their input
    /// ends.
    ///
    /// # Cancel safety
    ///
    /// Dropping the returned future abandons the current turn. The loop
    /// keeps no state between calls, so `run` may be called again.
    pub async fn run(&mut self) -> Result<Summary, Error> {
        let mut rounds = 0;
        let mut carried: Option<Message> = None;

        loop {
            let input = match self.user.respond(carried.take().as_ref()).await {
                Ok(input) => input,
                Err(Error::InputClosed) => {
                    return Ok(self.terminate(rounds, Ending::InputClosed));
                }
                Err(err) => return Err(err),
            };
            if is_exit(&input) {
                return Ok(self.terminate(rounds, Ending::Sentinel));
            }

            let outputs = self.relay(input).await?;
            rounds += 1;
            if self.feedback == Feedback::Carry {
                carried = outputs.into_iter().last();
            }
        }
    }

    /// Relays `input` through the pipeline once, without involving the
    /// user responder. Returns every reply, in pipeline order.
    pub async fn relay(&mut self, input: Message) -> Result<Vec<Message>, Error> {
        self.observer.on_user_input(&input);

        let mut outputs: Vec<Message> = Vec::with_capacity(self.pipeline.len());
        for responder in &mut self.pipeline {
            let incoming = outputs.last().unwrap_or(&input);
            self.observer.on_turn_started(responder.name());
            debug!("turn of {}", responder.name());
            let reply = responder.respond(Some(incoming)).await?;
            self.observer.on_turn_finished(&reply);
            outputs.push(reply);
        }

        self.observer.on_round_finished(&input, &outputs);
        Ok(outputs)
    }

    fn terminate(&mut self, rounds: usize, ending: Ending) -> Summary {
        info!("dialogue ended after {rounds} rounds ({ending:?})");
        self.observer.on_terminated(ending);
        Summary { rounds, ending }
    }
}

/// Returns `true` if `msg` asks to end the dialogue.
#[inline]
pub fn is_exit(msg: &Message) -> bool {
    msg.content() == EXIT_SENTINEL
}
