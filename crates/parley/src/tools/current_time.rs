use chrono::Local;
use parley_core::tool::{Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

/// The tool takes no arguments.
#[derive(Deserialize, JsonSchema)]
pub struct CurrentTimeParameters {}

/// A tool for reading the local wall-clock time.
pub struct CurrentTimeTool {
    parameter_schema: Value,
}

impl CurrentTimeTool {
    /// Creates a new current time tool.
    #[inline]
    pub fn new() -> Self {
        CurrentTimeTool {
            parameter_schema: schema_for!(CurrentTimeParameters).to_value(),
        }
    }
}

impl Default for CurrentTimeTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for CurrentTimeTool {
    type Input = CurrentTimeParameters;

    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        r#"
Returns the current local date and time in the format "YYYY-MM-DD HH:MM:SS".
This tool takes no arguments."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        _input: CurrentTimeParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        async move {
            let now = formatted_now();
            debug!("current_time -> {now}");
            Ok(now)
        }
    }
}

#[inline]
fn formatted_now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
