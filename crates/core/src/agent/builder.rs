use aicodegen_model::{ModelProvider, ToolCallRequest};

use super::{Agent, DEFAULT_SUMMARIZE_THRESHOLD, OnToolCall};
use crate::model_client::ModelClient;
use crate::tool::{Registry, Tool};

/// [`Agent`] builder.
pub struct AgentBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) system_prompt: Option<String>,
    pub(crate) tools: Registry,
    pub(crate) summarize_threshold: usize,
    pub(crate) on_tool_call: Option<OnToolCall>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            system_prompt: None,
            tools: Registry::new(),
            summarize_threshold: DEFAULT_SUMMARIZE_THRESHOLD,
            on_tool_call: None,
        }
    }

    /// Sets the system prompt that opens the conversation.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.add_tool(tool);
        self
    }

    /// Sets the conversation size above which it gets summarized.
    #[inline]
    pub fn with_summarize_threshold(mut self, threshold: usize) -> Self {
        self.summarize_threshold = threshold;
        self
    }

    /// Sets how many extra attempts a rate-limited model request gets.
    #[inline]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.model_client = self.model_client.with_max_retries(max_retries);
        self
    }

    /// Attaches a callback invoked for every tool call before it runs.
    #[inline]
    pub fn on_tool_call(
        mut self,
        on_tool_call: impl Fn(&ToolCallRequest) + Send + Sync + 'static,
    ) -> Self {
        self.on_tool_call = Some(Box::new(on_tool_call));
        self
    }

    /// Returns the client the agent will use, so that tools can make their
    /// own requests to the same backend.
    #[inline]
    pub fn model_client(&self) -> ModelClient {
        self.model_client.clone()
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent::from_builder(self)
    }
}
