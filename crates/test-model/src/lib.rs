//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use aicodegen_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    preset: PresetResponse,
    delay: Duration,
    event_idx: usize,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();

        let Some(timer) = &mut this.sleep else {
            this.sleep = Some(Box::pin(sleep(this.delay)));
            return Pin::new(this).poll_next_event(cx);
        };
        ready!(timer.as_mut().poll(cx));
        this.sleep = None;

        let preset_events = &this.preset.events;
        if this.event_idx < preset_events.len() {
            let event = match &preset_events[this.event_idx] {
                PresetEvent::MessageDelta(msg) => {
                    ModelResponseEvent::MessageDelta(msg.clone())
                }
                PresetEvent::ToolCall(req) => {
                    ModelResponseEvent::ToolCall(req.clone())
                }
            };
            this.event_idx += 1;
            Poll::Ready(Ok(Some(event)))
        } else if this.event_idx == preset_events.len() {
            this.event_idx += 1;
            Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                if this.preset.has_tool_call() {
                    ModelFinishReason::ToolCalls
                } else {
                    ModelFinishReason::Stop
                },
            ))))
        } else {
            // In case this method is called after completion.
            Poll::Ready(Ok(None))
        }
    }
}

#[derive(Default)]
struct ScriptState {
    responses: Vec<PresetResponse>,
    cursor: usize,
    failed_attempts: u64,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is the list
/// of responses the model will give. Every request consumes the next
/// response in order, no matter what it contains, and is recorded so tests
/// can inspect exactly what the agent sent. If there are no enough responses
/// in the script, an error will be returned.
///
/// Clones share the same script.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    state: Arc<Mutex<ScriptState>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        self.lock().responses.push(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far, including failed ones.
    #[inline]
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock().requests.clone()
    }

    /// Returns how many scripted responses have been delivered.
    #[inline]
    pub fn delivered(&self) -> usize {
        self.lock().cursor
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        // A poisoned script only happens after a test already panicked.
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let mut state = self.lock();
        state.requests.push(req.clone());

        let result = 'blk: {
            let Some(preset) = state.responses.get(state.cursor).cloned() else {
                break 'blk Err(Error {
                    message: "no enough responses",
                    kind: ErrorKind::Other,
                });
            };

            if let Some(failures) = preset.failures {
                if failures == 0 || state.failed_attempts < failures {
                    state.failed_attempts += 1;
                    break 'blk Err(Error {
                        message: "scripted failure",
                        kind: ErrorKind::RateLimitExceeded,
                    });
                }
            }

            state.cursor += 1;
            state.failed_attempts = 0;
            Ok(TestModelResponse {
                preset,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                event_idx: 0,
                sleep: None,
            })
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use aicodegen_model::{
        ModelMessage, ModelRequest, ModelTool, ToolCallRequest,
    };
    use serde_json::json;

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> (String, Option<ToolCallRequest>, ModelFinishReason) {
        let mut resp = pin!(resp);
        let mut msg = String::new();
        let mut tool_call = None;
        loop {
            let event = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
                .await
                .unwrap()
                .unwrap();
            match event {
                ModelResponseEvent::Completed(reason) => {
                    return (msg, tool_call, reason);
                }
                ModelResponseEvent::MessageDelta(delta) => {
                    msg.push_str(&delta);
                }
                ModelResponseEvent::ToolCall(req) => tool_call = Some(req),
            }
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Hello, ".to_owned()),
            PresetEvent::MessageDelta("world!".to_owned()),
        ]));
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Sure, let me take a look.".to_owned()),
            PresetEvent::ToolCall(ToolCallRequest {
                id: "tool:1".to_owned(),
                name: "read_file".to_owned(),
                arguments: json!({ "path": "todo.txt" }),
            }),
        ]));

        let mut req = ModelRequest {
            messages: vec![ModelMessage::user("Hi")],
            tools: vec![ModelTool {
                name: "read_file".to_owned(),
                description: "Reads a file".to_owned(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Path to the file"
                        }
                    }
                }),
            }],
            ..Default::default()
        };
        let resp = provider.send_request(&req).await.unwrap();
        let (msg, _, reason) = collect_response(resp).await;
        assert_eq!(msg, "Hello, world!");
        assert_eq!(reason, ModelFinishReason::Stop);

        req.messages.push(ModelMessage::assistant(msg));
        req.messages.push(ModelMessage::user("Check my todo"));
        let resp = provider.send_request(&req).await.unwrap();
        let (msg, tool_call, reason) = collect_response(resp).await;
        assert_eq!(msg, "Sure, let me take a look.");
        assert_eq!(reason, ModelFinishReason::ToolCalls);
        let tool_call = tool_call.unwrap();
        assert_eq!(tool_call.name, "read_file");
        assert_eq!(tool_call.arguments, json!({ "path": "todo.txt" }));

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(provider.delivered(), 2);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::text("ok").with_failures(2));

        let req = ModelRequest::default();
        for _ in 0..2 {
            let err = provider.send_request(&req).await.err().unwrap();
            assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        }
        assert!(provider.send_request(&req).await.is_ok());

        // The script is exhausted now.
        let err = provider.send_request(&req).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert_eq!(provider.requests().len(), 4);
    }
}
