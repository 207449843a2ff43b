use aicodegen_core::conversation::Conversation;
use aicodegen_core::{Agent, AgentBuilder, TurnError};
use aicodegen_model::{ModelProvider, ToolCallRequest};

use crate::tools::*;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    agent_builder: AgentBuilder,
    workspace: Workspace,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    ///
    /// Tools work relative to the process working directory unless
    /// [`SessionBuilder::with_workspace`] says otherwise.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let agent_builder = AgentBuilder::with_model_provider(provider);
        Self {
            agent_builder,
            workspace: Workspace::new("."),
        }
    }

    /// Sets the system prompt for the agent.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.agent_builder = self.agent_builder.with_system_prompt(prompt);
        self
    }

    /// Sets the directory that relative tool paths are resolved against.
    #[inline]
    pub fn with_workspace(mut self, workspace: Workspace) -> Self {
        self.workspace = workspace;
        self
    }

    /// Sets the conversation size above which it gets summarized.
    #[inline]
    pub fn with_summarize_threshold(mut self, threshold: usize) -> Self {
        self.agent_builder =
            self.agent_builder.with_summarize_threshold(threshold);
        self
    }

    /// Sets how many extra attempts a rate-limited model request gets.
    #[inline]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.agent_builder = self.agent_builder.with_max_retries(max_retries);
        self
    }

    /// Attaches a callback to be invoked when a tool is about to run.
    #[inline]
    pub fn on_tool_call(
        mut self,
        on_tool_call: impl Fn(&ToolCallRequest) + Send + Sync + 'static,
    ) -> Self {
        self.agent_builder = self.agent_builder.on_tool_call(on_tool_call);
        self
    }

    /// Builds a new session with all file-system tools registered.
    pub fn build(self) -> Session {
        let Self {
            agent_builder,
            workspace,
        } = self;
        let model_client = agent_builder.model_client();

        let agent = agent_builder
            .with_tool(ReadFileTool::new(workspace.clone()))
            .with_tool(SummariseDocTool::new(workspace.clone(), model_client))
            .with_tool(ListFilesTool::new(workspace.clone()))
            .with_tool(FindFilesTool::new(workspace.clone()))
            .with_tool(ListFilesRecursiveTool::new(workspace.clone()))
            .with_tool(EditFileTool::new(workspace.clone()))
            .with_tool(EditFileRegexTool::new(workspace.clone()))
            .with_tool(WriteFileTool::new(workspace.clone()))
            .with_tool(CreateFileTool::new(workspace.clone()))
            .with_tool(CreateDirectoryTool::new(workspace))
            .build();

        Session { agent }
    }
}

/// A chat session, like a window that displays messages and has a input box.
///
/// The session holds a fully configured agent that you can use directly, and it
/// is basically a wrapper around [`Agent`].
pub struct Session {
    agent: Agent,
}

impl Session {
    /// Sends a message and waits for the final answer of the turn.
    #[inline]
    pub async fn send_message(
        &mut self,
        message: &str,
    ) -> Result<String, TurnError> {
        self.agent.send_message(message).await
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        self.agent.conversation()
    }
}
