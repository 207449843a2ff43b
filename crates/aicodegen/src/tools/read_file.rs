use std::io;

use aicodegen_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use super::{Workspace, run_blocking};
use crate::extract::{ExtractError, extract_text};

#[derive(Deserialize, JsonSchema)]
pub struct ReadFileParameters {
    #[schemars(description = "Path to the file.")]
    path: String,
}

/// A tool for reading the text of a file.
///
/// PDF, DOCX and ODT documents are converted to plain text.
pub struct ReadFileTool {
    workspace: Workspace,
    parameter_schema: Value,
}

impl ReadFileTool {
    /// Creates a new read file tool.
    #[inline]
    pub fn new(workspace: Workspace) -> Self {
        ReadFileTool {
            workspace,
            parameter_schema: schema_for!(ReadFileParameters).to_value(),
        }
    }
}

impl Tool for ReadFileTool {
    type Input = ReadFileParameters;

    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: ReadFileParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let path = self.workspace.resolve(&input.path);
        async move {
            info!("reading file: {}", input.path);
            run_blocking(move || extract_text(&path).map_err(extract_error))
                .await
        }
    }
}

pub(super) fn extract_error(err: ExtractError) -> ToolError {
    let base = match &err {
        ExtractError::Io { source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            ToolError::permission_denied()
        }
        _ => ToolError::execution_error(),
    };
    base.with_reason(err.to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use aicodegen_core::tool::ErrorKind;
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_read_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), "Hello\nworld\n").unwrap();
        let tool = ReadFileTool::new(Workspace::new(dir.path()));

        let content = tool
            .execute(ReadFileParameters {
                path: "hello.txt".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(content, "Hello\nworld\n");

        let err = tool
            .execute(ReadFileParameters {
                path: "missing.txt".to_owned(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
        assert!(err.reason().contains("missing.txt"));
    }
}
