use aicodegen_core::model_client::ModelClient;
use aicodegen_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use super::read_file::extract_error;
use super::{Workspace, run_blocking};
use crate::extract::extract_text;

const SUMMARISE_INSTRUCTIONS: &str = "You are a helpful assistant that \
    summarizes files. The files are to understand how to integrate with a \
    third party. The summary will be used by AI agents to write code that \
    correctly conforms to the information found in the files. These may be \
    API specs or functional specs (e.g., to help with mapping).";

#[derive(Deserialize, JsonSchema)]
pub struct SummariseDocParameters {
    #[schemars(description = "Path to the file.")]
    path: String,
}

/// A tool that reads a document and asks the model for a summary geared
/// towards writing integration code.
pub struct SummariseDocTool {
    workspace: Workspace,
    model_client: ModelClient,
    parameter_schema: Value,
}

impl SummariseDocTool {
    /// Creates a new tool that summarises with the given client.
    #[inline]
    pub fn new(workspace: Workspace, model_client: ModelClient) -> Self {
        SummariseDocTool {
            workspace,
            model_client,
            parameter_schema: schema_for!(SummariseDocParameters).to_value(),
        }
    }
}

impl Tool for SummariseDocTool {
    type Input = SummariseDocParameters;

    fn name(&self) -> &str {
        "read_and_summarise_documentation"
    }

    fn description(&self) -> &str {
        "Read the contents of a file, and summarise it for use in code generation"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: SummariseDocParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let path = self.workspace.resolve(&input.path);
        let model_client = self.model_client.clone();
        async move {
            info!("summarising file: {}", input.path);
            let content =
                run_blocking(move || extract_text(&path).map_err(extract_error))
                    .await?;
            let prompt = format!(
                "Please summarize the key points relevant for an AI Agent \
                 implementing integration code from the following file \
                 content:\n\n{content}"
            );
            model_client
                .ask(SUMMARISE_INSTRUCTIONS, prompt)
                .await
                .map_err(|err| {
                    ToolError::execution_error()
                        .with_reason(format!("failed to summarise file: {err}"))
                })
        }
    }
}
