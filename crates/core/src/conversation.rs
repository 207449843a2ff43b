//! Conversation-related types.

use aicodegen_model::{
    AssistantMessage, ModelMessage, ToolCallRequest, ToolCallResult,
};

/// The system message that replaces a conversation after summarization.
pub const COMPACTED_MARKER: &str =
    "This is a summarized version of the previous conversation to reduce size.";

/// An ordered, append-only log of the dialogue.
///
/// Insertion order is the dialogue order. The only way to drop messages
/// is [`Conversation::compacted`], which builds a new value instead of
/// editing this one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Conversation {
    instructions: Option<String>,
    messages: Vec<ModelMessage>,
}

impl Conversation {
    /// Creates an empty conversation without a system prompt.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a conversation that starts with the given system prompt.
    pub fn with_instructions<S: Into<String>>(instructions: S) -> Self {
        let instructions = instructions.into();
        Self {
            messages: vec![ModelMessage::system(instructions.clone())],
            instructions: Some(instructions),
        }
    }

    /// Returns the system prompt this conversation was started with.
    ///
    /// The prompt survives summarization.
    #[inline]
    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// Returns all messages in dialogue order.
    #[inline]
    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if there are no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends a user message.
    #[inline]
    pub fn push_user<S: Into<String>>(&mut self, content: S) {
        self.messages.push(ModelMessage::user(content));
    }

    /// Appends a final assistant answer.
    #[inline]
    pub fn push_assistant<S: Into<String>>(&mut self, content: S) {
        self.messages.push(ModelMessage::assistant(content));
    }

    /// Appends an assistant message that requested tools, followed by
    /// exactly one tool message per call, in the order of `rounds`.
    pub fn push_tool_round(
        &mut self,
        content: Option<String>,
        rounds: Vec<(ToolCallRequest, String)>,
    ) {
        let mut tool_calls = Vec::with_capacity(rounds.len());
        let mut results = Vec::with_capacity(rounds.len());
        for (call, output) in rounds {
            results.push(ModelMessage::Tool(ToolCallResult {
                id: call.id.clone(),
                content: output,
            }));
            tool_calls.push(call);
        }
        self.messages
            .push(ModelMessage::Assistant(AssistantMessage {
                content,
                tool_calls,
            }));
        self.messages.extend(results);
    }

    /// Returns the sum of the serialized sizes of all messages in bytes.
    ///
    /// This is recomputed on every call.
    pub fn estimated_size(&self) -> usize {
        self.messages
            .iter()
            // Messages only hold strings and JSON values, which always
            // serialize.
            .map(|msg| serde_json::to_vec(msg).map_or(0, |bytes| bytes.len()))
            .sum()
    }

    /// Renders the dialogue as plain `role: text` lines.
    pub fn transcript(&self) -> String {
        let mut transcript = String::new();
        for msg in &self.messages {
            if !transcript.is_empty() {
                transcript.push('\n');
            }
            transcript.push_str(msg.role());
            transcript.push_str(": ");
            match msg {
                ModelMessage::Assistant(assistant) => {
                    let mut first = true;
                    if let Some(content) = &assistant.content {
                        transcript.push_str(content);
                        first = false;
                    }
                    for call in &assistant.tool_calls {
                        if !first {
                            transcript.push(' ');
                        }
                        first = false;
                        transcript.push_str(&format!(
                            "[{}({})]",
                            call.name, call.arguments
                        ));
                    }
                }
                _ => transcript.push_str(msg.content().unwrap_or_default()),
            }
        }
        transcript
    }

    /// Builds the two-message conversation that replaces this one once
    /// it has been summarized.
    pub fn compacted<S: Into<String>>(&self, summary: S) -> Conversation {
        let marker = match &self.instructions {
            Some(instructions) => format!("{COMPACTED_MARKER}\n\n{instructions}"),
            None => COMPACTED_MARKER.to_owned(),
        };
        Conversation {
            instructions: self.instructions.clone(),
            messages: vec![
                ModelMessage::system(marker),
                ModelMessage::assistant(summary),
            ],
        }
    }

    /// Pretty-printed JSON of every message, for diagnostics.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.messages)
            .unwrap_or_else(|err| format!("<unserializable: {err}>"))
    }
}
