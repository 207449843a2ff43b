use std::error::Error as StdError;
use std::fmt::{self, Display};

use aicodegen_model::ModelProviderError;
use tracing::Instrument;

use crate::conversation::Conversation;
use crate::model_client::ModelClient;

const SUMMARIZER_INSTRUCTIONS: &str = "You are a helpful assistant that \
    summarizes conversations. Summarize the following conversation while \
    retaining all key points and context necessary for continuing the \
    discussion.";

/// Error returned when a conversation could not be summarized.
#[derive(Debug)]
pub enum SummarizeError {
    /// The backend could not be reached or refused the request.
    Model(Box<dyn ModelProviderError>),
    /// The backend answered with an empty summary.
    EmptySummary,
    /// The summarized conversation is not smaller than the original.
    NotSmaller {
        /// Size of the original conversation in bytes.
        before: usize,
        /// Size of the summarized conversation in bytes.
        after: usize,
    },
}

impl Display for SummarizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummarizeError::Model(err) => {
                write!(f, "failed to summarize conversation: {err}")
            }
            SummarizeError::EmptySummary => {
                write!(f, "failed to summarize conversation: empty summary")
            }
            SummarizeError::NotSmaller { before, after } => write!(
                f,
                "failed to summarize conversation: summary is not smaller \
                 ({after} bytes, was {before} bytes)"
            ),
        }
    }
}

impl StdError for SummarizeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SummarizeError::Model(err) => Some(err.as_ref()),
            SummarizeError::EmptySummary
            | SummarizeError::NotSmaller { .. } => None,
        }
    }
}

/// Collapses an oversized conversation into a compact equivalent.
#[derive(Clone)]
pub struct Summarizer {
    model_client: ModelClient,
}

impl Summarizer {
    /// Creates a summarizer that talks to the given client.
    #[inline]
    pub fn new(model_client: ModelClient) -> Self {
        Self { model_client }
    }

    /// Asks the backend for a summary of `conversation` and returns the
    /// conversation that should replace it.
    ///
    /// The input is left untouched; the result always holds exactly a
    /// system marker and an assistant summary, and is strictly smaller than
    /// the input.
    pub async fn summarize(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, SummarizeError> {
        debug!("summarizing {} messages", conversation.len());
        let prompt = format!(
            "Please summarize the following conversation:\n\n{}",
            conversation.transcript()
        );
        let summary = self
            .model_client
            .ask(SUMMARIZER_INSTRUCTIONS, prompt)
            .instrument(debug_span!("summarize"))
            .await
            .map_err(SummarizeError::Model)?;
        if summary.trim().is_empty() {
            return Err(SummarizeError::EmptySummary);
        }

        let compacted = conversation.compacted(summary);
        let before = conversation.estimated_size();
        let after = compacted.estimated_size();
        if after >= before {
            return Err(SummarizeError::NotSmaller { before, after });
        }
        Ok(compacted)
    }
}

#[cfg(test)]
mod tests {
    use aicodegen_model::ModelMessage;
    use aicodegen_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    fn long_conversation() -> Conversation {
        let mut conversation = Conversation::with_instructions("Be helpful.");
        conversation.push_user("Read the whole repo");
        conversation.push_assistant("a".repeat(5000));
        conversation
    }

    #[tokio::test]
    async fn test_summarize() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::text("User wants a repo tour."));
        let summarizer = Summarizer::new(ModelClient::new(provider.clone()));

        let conversation = long_conversation();
        let compacted = summarizer.summarize(&conversation).await.unwrap();
        assert_eq!(compacted.len(), 2);
        assert_eq!(
            compacted.messages()[1],
            ModelMessage::assistant("User wants a repo tour.")
        );
        assert!(compacted.estimated_size() < conversation.estimated_size());

        let request = &provider.requests()[0];
        assert!(request.tools.is_empty());
        let prompt = request.messages[1].content().unwrap();
        assert!(prompt.contains("user: Read the whole repo"));
    }

    #[tokio::test]
    async fn test_summarize_failures() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::text("   "));
        let summarizer = Summarizer::new(ModelClient::new(provider));

        let conversation = long_conversation();
        let err = summarizer.summarize(&conversation).await.unwrap_err();
        assert!(matches!(err, SummarizeError::EmptySummary));

        // The script is exhausted, so the backend fails now.
        let err = summarizer.summarize(&conversation).await.unwrap_err();
        assert!(matches!(err, SummarizeError::Model(_)));
    }

    #[tokio::test]
    async fn test_summary_must_shrink() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::text("b".repeat(200)));
        let summarizer = Summarizer::new(ModelClient::new(provider));

        let mut conversation = Conversation::with_instructions("Be helpful.");
        conversation.push_user("Hi");
        let err = summarizer.summarize(&conversation).await.unwrap_err();
        let SummarizeError::NotSmaller { before, after } = err else {
            panic!("expected NotSmaller, got {err:?}");
        };
        assert_eq!(before, conversation.estimated_size());
        assert!(after >= before);
    }
}
