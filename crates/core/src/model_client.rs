//! A type-erased client around a model provider.

use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::time::Duration;

use aicodegen_model::{
    AssistantMessage, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use backoff::ExponentialBackoffBuilder;
use tracing::Instrument;

/// Extra attempts for requests that hit a rate limit.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that collects complete responses
/// and provides a type-erased interface for the other modules.
///
/// Cloning is cheap, and clones share the same provider.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
    max_retries: u32,
}

impl ModelClient {
    /// Creates a client for the given provider.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self {
            handler_fn,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets how many extra attempts a rate-limited request gets.
    #[inline]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sends a request and returns the complete response.
    ///
    /// Rate-limited requests are retried with exponential backoff, any
    /// other error is returned immediately.
    pub async fn send_request(
        &self,
        req: ModelRequest,
    ) -> Result<ModelClientResponse, Box<dyn ModelProviderError>> {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_interval(Duration::from_secs(10))
            .with_max_elapsed_time(None)
            .build();

        let mut attempt = 0;
        backoff::future::retry_notify(
            backoff,
            || {
                attempt += 1;
                let can_retry = attempt <= self.max_retries;
                let fut = (self.handler_fn)(req.clone());
                async move {
                    fut.await.map_err(|err| {
                        if can_retry && err.kind().is_retryable() {
                            backoff::Error::transient(err)
                        } else {
                            backoff::Error::permanent(err)
                        }
                    })
                }
            },
            |err: Box<dyn ModelProviderError>, delay: Duration| {
                warn!("model request failed ({err}), retrying in {delay:?}");
            },
        )
        .await
    }

    /// Sends a one-shot request made of a system prompt and a user prompt,
    /// without tools, and returns the text of the answer.
    pub async fn ask(
        &self,
        instructions: &str,
        prompt: String,
    ) -> Result<String, Box<dyn ModelProviderError>> {
        let req = ModelRequest {
            messages: vec![
                ModelMessage::system(instructions),
                ModelMessage::user(prompt),
            ],
            ..Default::default()
        };
        let resp = self.send_request(req).await?;
        Ok(resp.content)
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug, Default)]
pub struct ModelClientResponse {
    /// Concatenated message text.
    pub content: String,
    /// Tool calls requested by the model, in the order they were issued.
    pub tool_calls: Vec<ToolCallRequest>,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

impl ModelClientResponse {
    /// Returns `true` if the response neither says anything nor requests
    /// a tool.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.tool_calls.is_empty()
    }

    /// Converts the response into an assistant message.
    pub fn into_assistant_message(self) -> AssistantMessage {
        AssistantMessage {
            content: if self.content.is_empty() {
                None
            } else {
                Some(self.content)
            },
            tool_calls: self.tool_calls,
        }
    }
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Box::new(err));
        }
    };

    let mut content = String::new();
    let mut tool_calls = Vec::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(Box::new(err));
            }
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(msg) => {
                content.push_str(&msg);
            }
            ModelResponseEvent::ToolCall(req) => {
                tool_calls.push(req);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(ModelClientResponse {
        content,
        tool_calls,
        finish_reason,
    })
}
