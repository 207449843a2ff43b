use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use aicodegen_model::{ModelTool, ToolCallRequest};
use futures_util::future::join_all;
use tracing::Instrument;

use crate::tool::Tool;
use crate::tool::object::{ToolObject, ToolObjectImpl};

/// The result text sent back for a call to a tool that is not registered.
pub const UNKNOWN_TOOL_RESULT: &str = "Error: unknown tool.";

/// An ordered set of tools that handles tool calls from the model.
///
/// Tools are advertised in the order they were added. Names are unique, and
/// adding a tool with an existing name replaces the old one in place.
#[derive(Default)]
pub struct Registry {
    tools: Vec<Arc<dyn ToolObject>>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool to the registry.
    pub fn add_tool<T: Tool>(&mut self, tool: T) {
        let name = tool.name().to_owned();
        let object: Arc<dyn ToolObject> = Arc::new(ToolObjectImpl(tool));
        match self.index.get(&name) {
            Some(&idx) => {
                debug!("replacing tool: {name}");
                self.tools[idx] = object;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(object);
            }
        }
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tool is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns `true` if a tool with the given name is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the tool definitions to advertise to the model.
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools
            .iter()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Executes a single tool call and returns the text for the model.
    ///
    /// Never fails: tool errors are rendered as `"Error: <error>"`, and
    /// unknown tools produce [`UNKNOWN_TOOL_RESULT`].
    pub fn dispatch(
        &self,
        req: &ToolCallRequest,
    ) -> Pin<Box<dyn Future<Output = String> + Send>> {
        let Some(&idx) = self.index.get(&req.name) else {
            warn!("tool not found: {}", req.name);
            return Box::pin(std::future::ready(UNKNOWN_TOOL_RESULT.to_owned()));
        };

        trace!("dispatching {} ({}) with args: {:?}", req.name, req.id, req.arguments);
        let fut = Arc::clone(&self.tools[idx]).execute(req.arguments.clone());
        Box::pin(async move {
            match fut.await {
                Ok(output) => output,
                Err(err) => {
                    debug!("tool call failed: {err}");
                    format!("Error: {err}")
                }
            }
        })
    }

    /// Executes all calls of a round concurrently.
    ///
    /// The returned results are in the same order as `requests`, no matter
    /// in which order the calls complete.
    pub async fn execute_all(&self, requests: &[ToolCallRequest]) -> Vec<String> {
        let handles: Vec<_> = requests
            .iter()
            .map(|req| tokio::spawn(self.dispatch(req)))
            .collect();

        join_all(handles)
            .instrument(debug_span!("tool round", calls = requests.len()))
            .await
            .into_iter()
            .map(|joined| match joined {
                Ok(output) => output,
                Err(err) => {
                    error!("tool task failed: {err}");
                    format!("Error: {err}")
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use schemars::{JsonSchema, schema_for};
    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::tool::{Error, ToolResult};

    #[derive(Deserialize, JsonSchema)]
    struct EchoParams {
        text: String,
        #[serde(default)]
        delay_ms: u64,
    }

    struct EchoTool {
        name: &'static str,
        parameter_schema: Value,
    }

    impl EchoTool {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                parameter_schema: schema_for!(EchoParams).to_value(),
            }
        }
    }

    impl Tool for EchoTool {
        type Input = EchoParams;

        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Echoes the given text"
        }

        fn parameter_schema(&self) -> &Value {
            &self.parameter_schema
        }

        #[allow(clippy::manual_async_fn)]
        fn execute(
            &self,
            input: Self::Input,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            async move {
                tokio::time::sleep(Duration::from_millis(input.delay_ms)).await;
                if input.text.is_empty() {
                    return Err(Error::execution_error().with_reason("nothing to echo"));
                }
                Ok(input.text)
            }
        }
    }

    fn call(id: &str, name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest {
            id: id.to_owned(),
            name: name.to_owned(),
            arguments,
        }
    }

    #[test]
    fn test_definitions_keep_insertion_order() {
        let mut registry = Registry::new();
        registry.add_tool(EchoTool::new("b_tool"));
        registry.add_tool(EchoTool::new("a_tool"));
        registry.add_tool(EchoTool::new("b_tool"));

        let names: Vec<_> = registry
            .definitions()
            .into_iter()
            .map(|def| def.name)
            .collect();
        assert_eq!(names, ["b_tool", "a_tool"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("a_tool"));
        assert!(!registry.contains("c_tool"));
    }

    #[tokio::test]
    async fn test_dispatch() {
        let mut registry = Registry::new();
        registry.add_tool(EchoTool::new("echo"));

        let output = registry
            .dispatch(&call("1", "echo", json!({ "text": "hi" })))
            .await;
        assert_eq!(output, "hi");

        let output = registry
            .dispatch(&call("2", "echo", json!({ "text": "" })))
            .await;
        assert_eq!(output, "Error: Execution error: nothing to echo");

        let output = registry.dispatch(&call("3", "echo", json!({}))).await;
        assert!(output.starts_with("Error: Invalid input: "), "{output}");

        let output = registry
            .dispatch(&call("4", "shell", json!({ "cmd": "ls" })))
            .await;
        assert_eq!(output, UNKNOWN_TOOL_RESULT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_all_preserves_order() {
        let mut registry = Registry::new();
        registry.add_tool(EchoTool::new("echo"));

        let requests = [
            call("1", "echo", json!({ "text": "slow", "delay_ms": 300 })),
            call("2", "missing", json!({})),
            call("3", "echo", json!({ "text": "fast", "delay_ms": 10 })),
        ];
        let outputs = registry.execute_all(&requests).await;
        assert_eq!(outputs, ["slow", UNKNOWN_TOOL_RESULT, "fast"]);
    }
}
