use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message in the dialogue, tagged by its role.
///
/// Each variant only carries the fields that are legal for its role, so
/// e.g. a tool result can never be created without the id of the call
/// it answers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ModelMessage {
    /// The system instructions.
    System {
        /// Instruction text.
        content: String,
    },
    /// A user input text.
    User {
        /// Input text.
        content: String,
    },
    /// A message produced by the model.
    Assistant(AssistantMessage),
    /// A tool call result.
    Tool(ToolCallResult),
}

impl ModelMessage {
    /// Creates a system message.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Creates a text-only assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::Assistant(AssistantMessage {
            content: Some(content.into()),
            tool_calls: vec![],
        })
    }

    /// Returns the role name used on the wire.
    pub fn role(&self) -> &'static str {
        match self {
            ModelMessage::System { .. } => "system",
            ModelMessage::User { .. } => "user",
            ModelMessage::Assistant(_) => "assistant",
            ModelMessage::Tool(_) => "tool",
        }
    }

    /// Returns the text content of this message, if any.
    pub fn content(&self) -> Option<&str> {
        match self {
            ModelMessage::System { content } | ModelMessage::User { content } => {
                Some(content)
            }
            ModelMessage::Assistant(msg) => msg.content.as_deref(),
            ModelMessage::Tool(result) => Some(&result.content),
        }
    }
}

/// An assistant turn, which either answers the user or asks for tools.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// The text content, absent when the model only requested tools.
    pub content: Option<String>,
    /// Tool calls requested by the model, in the order they were issued.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

/// Describes a tool call request from the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// The unique identifier for the tool call request.
    pub id: String,
    /// The name of the tool to call.
    pub name: String,
    /// The arguments to pass to the tool.
    pub arguments: Value,
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// The unique identifier for the tool call request.
    #[serde(rename = "tool_call_id")]
    pub id: String,
    /// The result of the tool call.
    pub content: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_wire_shape() {
        let msg = ModelMessage::Tool(ToolCallResult {
            id: "call_1".to_owned(),
            content: "done".to_owned(),
        });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "role": "tool", "tool_call_id": "call_1", "content": "done" })
        );

        let msg = ModelMessage::Assistant(AssistantMessage {
            content: None,
            tool_calls: vec![ToolCallRequest {
                id: "call_2".to_owned(),
                name: "list_files".to_owned(),
                arguments: json!({ "path": "." }),
            }],
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert!(value["content"].is_null());
        assert_eq!(value["tool_calls"][0]["name"], "list_files");
    }

    #[test]
    fn test_text_only_assistant_omits_tool_calls() {
        let value = serde_json::to_value(ModelMessage::assistant("hi")).unwrap();
        assert_eq!(value, json!({ "role": "assistant", "content": "hi" }));
        assert_eq!(ModelMessage::assistant("hi").role(), "assistant");
    }
}
