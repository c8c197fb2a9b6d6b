//! Functions a model-backed responder lets its model call.
//!
//! Tools are collected in a [`Toolkit`] and handed to
//! [`ModelResponderBuilder::with_toolkit`](crate::responder::ModelResponderBuilder::with_toolkit).
//! During a turn the responder advertises every tool to the model and
//! answers each requested call with [`Toolkit::call`] before asking the
//! model again.

mod error;
mod toolkit;

use std::future::ready;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub use error::{Error, ErrorKind};
pub use toolkit::Toolkit;

/// Text produced by a tool, or why it could not produce any.
pub type ToolResult = Result<String, Error>;

type BoxedToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// A function the model may call by name.
///
/// The model only ever sees [`name`](Self::name),
/// [`description`](Self::description) and
/// [`parameter_schema`](Self::parameter_schema); spell out there what the
/// tool returns, e.g. the `current_time` tool names its output format.
pub trait Tool: Send + Sync + 'static {
    /// Arguments, decoded from the JSON object the model sends.
    type Input: DeserializeOwned;

    /// Identifier the model uses to call this tool.
    fn name(&self) -> &str;

    /// Natural-language explanation for the model.
    fn description(&self) -> &str;

    /// JSON schema of [`Input`](Self::Input).
    fn parameter_schema(&self) -> &Value;

    /// Runs the tool.
    ///
    /// The returned future must not borrow `self`; the toolkit may drop
    /// it before completion when the turn is abandoned.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

/// Object-safe view of a [`Tool`], so one toolkit can hold tools with
/// different input types.
pub(crate) trait DynTool: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter_schema(&self) -> &Value;

    fn call(&self, arguments: Value) -> BoxedToolFuture;
}

impl<T: Tool> DynTool for T {
    #[inline]
    fn name(&self) -> &str {
        Tool::name(self)
    }

    #[inline]
    fn description(&self) -> &str {
        Tool::description(self)
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        Tool::parameter_schema(self)
    }

    fn call(&self, arguments: Value) -> BoxedToolFuture {
        match decode_input::<T::Input>(arguments) {
            Ok(input) => Box::pin(self.execute(input)),
            Err(err) => Box::pin(ready(Err(err))),
        }
    }
}

fn decode_input<I: DeserializeOwned>(arguments: Value) -> Result<I, Error> {
    // Parameterless calls often arrive without any arguments at all.
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        arguments => arguments,
    };
    serde_json::from_value(arguments)
        .map_err(|err| Error::invalid_input().with_reason(err.to_string()))
}
