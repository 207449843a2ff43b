use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use aicodegen_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use serde_json::Value;

use crate::Error;
use crate::proto::ChatCompletion;

/// A fully received chat completion, replayed as model events.
#[derive(Debug)]
pub struct OpenAIResponse {
    events: VecDeque<ModelResponseEvent>,
}

impl OpenAIResponse {
    pub fn from_completion(completion: ChatCompletion) -> Result<Self, Error> {
        let Some(choice) = completion.choices.into_iter().next() else {
            return Err(Error::new(
                "response contains no choices",
                ErrorKind::InvalidResponse,
            ));
        };
        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(Error::new(
                "response was blocked by the content filter",
                ErrorKind::Moderated,
            ));
        }

        // The order of events are important. Always emit message delta first,
        // then the tool calls in the order the model issued them, and finally
        // the finish reason.
        let mut events = VecDeque::new();
        if let Some(content) = choice.message.content {
            if !content.is_empty() {
                events.push_back(ModelResponseEvent::MessageDelta(content));
            }
        }

        let tool_calls = choice.message.tool_calls.unwrap_or_default();
        let has_tool_calls = !tool_calls.is_empty();
        for tool_call in tool_calls {
            let arguments = match serde_json::from_str::<Value>(
                &tool_call.function.arguments,
            ) {
                Ok(arguments) => arguments,
                Err(err) => {
                    warn!(
                        "malformed arguments for tool call {}: {err}",
                        tool_call.id
                    );
                    Value::Null
                }
            };
            events.push_back(ModelResponseEvent::ToolCall(ToolCallRequest {
                id: tool_call.id,
                name: tool_call.function.name,
                arguments,
            }));
        }

        let finish_reason = if has_tool_calls
            || choice.finish_reason.as_deref() == Some("tool_calls")
        {
            ModelFinishReason::ToolCalls
        } else {
            ModelFinishReason::Stop
        };
        events.push_back(ModelResponseEvent::Completed(finish_reason));

        trace!("completion {:?} has {} events", completion.id, events.len());
        Ok(Self { events })
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    #[inline]
    fn poll_next_event(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        Poll::Ready(Ok(self.get_mut().events.pop_front()))
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use aicodegen_model::ModelProviderError;
    use serde_json::json;

    use super::*;

    const TOOL_CALL_RESPONSE: &str = r#"{
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [
                    {
                        "id": "call_a",
                        "type": "function",
                        "function": { "name": "list_files", "arguments": "{\"path\":\"./src\"}" }
                    },
                    {
                        "id": "call_b",
                        "type": "function",
                        "function": { "name": "read_file", "arguments": "{not json" }
                    }
                ]
            },
            "finish_reason": "tool_calls"
        }]
    }"#;

    async fn collect(resp: OpenAIResponse) -> Vec<ModelResponseEvent> {
        let mut resp = pin!(resp);
        let mut events = vec![];
        while let Some(event) = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
            .await
            .unwrap()
        {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_tool_call_events() {
        let completion = serde_json::from_str(TOOL_CALL_RESPONSE).unwrap();
        let resp = OpenAIResponse::from_completion(completion).unwrap();
        let events = collect(resp).await;

        assert_eq!(events.len(), 3);
        let ModelResponseEvent::ToolCall(first) = &events[0] else {
            panic!("unexpected event: {:?}", events[0]);
        };
        assert_eq!(first.id, "call_a");
        assert_eq!(first.arguments, json!({ "path": "./src" }));
        let ModelResponseEvent::ToolCall(second) = &events[1] else {
            panic!("unexpected event: {:?}", events[1]);
        };
        assert_eq!(second.arguments, Value::Null);
        assert_eq!(
            events[2],
            ModelResponseEvent::Completed(ModelFinishReason::ToolCalls)
        );
    }

    #[tokio::test]
    async fn test_final_message_events() {
        let completion = serde_json::from_value(json!({
            "id": "chatcmpl-2",
            "choices": [{
                "message": { "role": "assistant", "content": "All done." },
                "finish_reason": "stop"
            }]
        }))
        .unwrap();
        let events =
            collect(OpenAIResponse::from_completion(completion).unwrap()).await;
        assert_eq!(
            events,
            vec![
                ModelResponseEvent::MessageDelta("All done.".to_owned()),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
    }

    #[test]
    fn test_rejected_completions() {
        let completion =
            serde_json::from_value(json!({ "id": "x", "choices": [] })).unwrap();
        let err = OpenAIResponse::from_completion(completion).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);

        let completion = serde_json::from_value(json!({
            "choices": [{
                "message": { "content": "" },
                "finish_reason": "content_filter"
            }]
        }))
        .unwrap();
        let err = OpenAIResponse::from_completion(completion).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Moderated);
    }
}
