mod builder;

use std::error::Error as StdError;
use std::fmt::{self, Display};

use aicodegen_model::{
    ModelProviderError, ModelRequest, ToolCallRequest, ToolChoice,
};
use tracing::Instrument;

use crate::conversation::Conversation;
use crate::model_client::{ModelClient, ModelClientResponse};
use crate::summarizer::{SummarizeError, Summarizer};
use crate::tool::Registry;
pub use builder::AgentBuilder;

/// Conversation size (in serialized bytes) above which the conversation is
/// summarized before the next model call.
pub const DEFAULT_SUMMARIZE_THRESHOLD: usize = 200_000;

pub(crate) type OnToolCall = Box<dyn Fn(&ToolCallRequest) + Send + Sync>;

/// Error that aborts a turn.
///
/// Messages appended before the failure stay in the conversation, so the
/// next turn continues from there.
#[derive(Debug)]
pub enum TurnError {
    /// The model backend failed.
    Model(Box<dyn ModelProviderError>),
    /// The conversation had to be summarized but could not be.
    Summarize(SummarizeError),
    /// The model answered with neither text nor tool calls.
    UnexpectedResponse,
}

impl Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::Model(err) => write!(f, "model request failed: {err}"),
            TurnError::Summarize(err) => write!(f, "{err}"),
            TurnError::UnexpectedResponse => {
                write!(f, "unexpected response from the model")
            }
        }
    }
}

impl StdError for TurnError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            TurnError::Model(err) => Some(err.as_ref()),
            TurnError::Summarize(err) => Some(err),
            TurnError::UnexpectedResponse => None,
        }
    }
}

impl From<SummarizeError> for TurnError {
    #[inline]
    fn from(err: SummarizeError) -> Self {
        TurnError::Summarize(err)
    }
}

#[derive(Debug)]
enum Stage {
    AwaitingModel,
    ExecutingTools(ModelClientResponse),
    Final(String),
}

/// An agent instance, which owns a conversation, a model client and a set
/// of tools.
///
/// One agent serves one interactive session. Turns are processed one at a
/// time, which is enforced by [`Agent::send_message`] borrowing the agent
/// mutably.
pub struct Agent {
    model_client: ModelClient,
    summarizer: Summarizer,
    tools: Registry,
    conversation: Conversation,
    summarize_threshold: usize,
    on_tool_call: Option<OnToolCall>,
}

impl Agent {
    fn from_builder(builder: AgentBuilder) -> Self {
        let AgentBuilder {
            model_client,
            system_prompt,
            tools,
            summarize_threshold,
            on_tool_call,
        } = builder;

        let conversation = match system_prompt {
            Some(prompt) => Conversation::with_instructions(prompt),
            None => Conversation::new(),
        };
        Self {
            summarizer: Summarizer::new(model_client.clone()),
            model_client,
            tools,
            conversation,
            summarize_threshold,
            on_tool_call,
        }
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Runs one user turn to completion and returns the final answer.
    ///
    /// On error the failure and the whole conversation are logged, and the
    /// agent stays usable for the next turn.
    pub async fn send_message<S: Into<String>>(
        &mut self,
        input: S,
    ) -> Result<String, TurnError> {
        self.conversation.push_user(input);
        let result = self.run_turn().instrument(debug_span!("turn")).await;
        if let Err(err) = &result {
            error!("turn failed: {err}");
            error!("conversation: {}", self.conversation.to_pretty_json());
        }
        result
    }

    async fn run_turn(&mut self) -> Result<String, TurnError> {
        let mut stage = Stage::AwaitingModel;
        loop {
            stage = match stage {
                Stage::AwaitingModel => {
                    self.compact_if_needed().await?;
                    self.call_model().await?
                }
                Stage::ExecutingTools(resp) => {
                    self.execute_tools(resp).await;
                    Stage::AwaitingModel
                }
                Stage::Final(answer) => {
                    self.conversation.push_assistant(answer.clone());
                    return Ok(answer);
                }
            };
        }
    }

    async fn compact_if_needed(&mut self) -> Result<(), SummarizeError> {
        let size = self.conversation.estimated_size();
        if size <= self.summarize_threshold {
            return Ok(());
        }

        info!(
            "conversation size {size} exceeds {}, summarizing",
            self.summarize_threshold
        );
        let compacted = self.summarizer.summarize(&self.conversation).await?;
        debug!("conversation summarized to {} bytes", compacted.estimated_size());
        self.conversation = compacted;
        Ok(())
    }

    async fn call_model(&mut self) -> Result<Stage, TurnError> {
        let req = ModelRequest {
            messages: self.conversation.messages().to_vec(),
            tools: self.tools.definitions(),
            tool_choice: ToolChoice::Auto,
        };
        let resp = self
            .model_client
            .send_request(req)
            .await
            .map_err(TurnError::Model)?;

        if resp.is_empty() {
            warn!("model response has neither content nor tool calls");
            return Err(TurnError::UnexpectedResponse);
        }
        if !resp.tool_calls.is_empty() {
            debug!("model requested {} tool calls", resp.tool_calls.len());
            return Ok(Stage::ExecutingTools(resp));
        }
        Ok(Stage::Final(resp.content))
    }

    async fn execute_tools(&mut self, resp: ModelClientResponse) {
        let ModelClientResponse {
            content,
            tool_calls,
            ..
        } = resp;

        if let Some(on_tool_call) = &self.on_tool_call {
            for call in &tool_calls {
                on_tool_call(call);
            }
        }
        let outputs = self.tools.execute_all(&tool_calls).await;

        let content = (!content.is_empty()).then_some(content);
        self.conversation
            .push_tool_round(content, tool_calls.into_iter().zip(outputs).collect());
    }
}
