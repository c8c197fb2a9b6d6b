use std::collections::BTreeMap;
use std::fmt::{self, Debug};

use parley_model::{ModelTool, ToolCallRequest, ToolCallResult};
use tracing::Instrument;

use crate::tool::{DynTool, Error, Tool, ToolResult};

/// A named collection of tools that a model-backed responder may call.
#[derive(Default)]
pub struct Toolkit {
    // Ordered, so the model sees the same tool list on every request.
    tools: BTreeMap<String, Box<dyn DynTool>>,
}

impl Toolkit {
    /// Creates an empty toolkit.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. A tool with the same name is replaced.
    pub fn register<T: Tool>(&mut self, tool: T) -> &mut Self {
        let name = Tool::name(&tool).to_owned();
        if self.tools.insert(name.clone(), Box::new(tool)).is_some()
        {
            warn!("tool {name} registered twice, keeping the latest");
        }
        self
    }

    /// Registers a tool, builder style.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.register(tool);
        self
    }

    /// Describes every registered tool for the model.
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools
            .values()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().trim().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Runs one tool call requested by the model.
    ///
    /// Failures are not propagated: the returned result carries either
    /// the tool's output or an `Error: ...` line for the model to read.
    pub async fn call(&self, req: &ToolCallRequest) -> ToolCallResult {
        let content = match self.execute(req).await {
            Ok(output) => output,
            Err(err) => {
                debug!("tool {} failed: {err}", req.name);
                format!("Error: {err}")
            }
        };
        ToolCallResult {
            id: req.id.clone(),
            content,
        }
    }

    async fn execute(&self, req: &ToolCallRequest) -> ToolResult {
        let Some(tool) = self.tools.get(&req.name) else {
            warn!("tool not found: {}", req.name);
            return Err(Error::not_found()
                .with_reason(format!("no tool named `{}`", req.name)));
        };
        trace!("running tool {} ({}) with args: {:?}", req.name, req.id, req.arguments);
        tool.call(req.arguments.clone())
            .instrument(debug_span!("tool call", tool = %req.name))
            .await
    }
}

impl Debug for Toolkit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tools.keys()).finish()
    }
}
