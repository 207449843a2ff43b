use std::fs;

use aicodegen_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use super::{Workspace, io_error, run_blocking};

#[derive(Deserialize, JsonSchema)]
pub struct WriteFileParameters {
    #[schemars(description = "Path to the file.")]
    path: String,
    #[schemars(description = "The full content of the file.")]
    content: String,
}

/// Creates or overwrites a file. Missing parent directories are created.
async fn write(
    workspace: &Workspace,
    input: WriteFileParameters,
) -> Result<(), ToolError> {
    let path = workspace.resolve(&input.path);
    run_blocking(move || {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| io_error(&input.path, err))?;
        }
        fs::write(&path, &input.content)
            .map_err(|err| io_error(&input.path, err))
    })
    .await
}

/// A tool that writes text to a file, replacing what was there.
pub struct WriteFileTool {
    workspace: Workspace,
    parameter_schema: Value,
}

impl WriteFileTool {
    /// Creates a new write file tool.
    #[inline]
    pub fn new(workspace: Workspace) -> Self {
        WriteFileTool {
            workspace,
            parameter_schema: schema_for!(WriteFileParameters).to_value(),
        }
    }
}

impl Tool for WriteFileTool {
    type Input = WriteFileParameters;

    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write text content to a file (creates or overwrites)"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: WriteFileParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let workspace = self.workspace.clone();
        async move {
            info!("writing file: {}", input.path);
            let message = format!(
                "Wrote {} bytes to file {}",
                input.content.len(),
                input.path
            );
            write(&workspace, input).await?;
            Ok(message)
        }
    }
}

/// A tool that creates a file with the given content.
///
/// An existing file is overwritten, which keeps repeated calls idempotent.
pub struct CreateFileTool {
    workspace: Workspace,
    parameter_schema: Value,
}

impl CreateFileTool {
    /// Creates a new create file tool.
    #[inline]
    pub fn new(workspace: Workspace) -> Self {
        CreateFileTool {
            workspace,
            parameter_schema: schema_for!(WriteFileParameters).to_value(),
        }
    }
}

impl Tool for CreateFileTool {
    type Input = WriteFileParameters;

    fn name(&self) -> &str {
        "create_file"
    }

    fn description(&self) -> &str {
        "Creates a new file with the given content"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: WriteFileParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let workspace = self.workspace.clone();
        async move {
            info!("creating file: {}", input.path);
            let message = format!("File created: {}", input.path);
            write(&workspace, input).await?;
            Ok(message)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;
    use crate::tools::ReadFileTool;

    fn params(path: &str, content: &str) -> WriteFileParameters {
        WriteFileParameters {
            path: path.to_owned(),
            content: content.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        let write_tool = WriteFileTool::new(workspace.clone());
        let read_tool = ReadFileTool::new(workspace);

        let content = "fn main() {\n    println!(\"hi\");\n}\n";
        let result = write_tool
            .execute(params("src/main.rs", content))
            .await
            .unwrap();
        assert_eq!(
            result,
            format!("Wrote {} bytes to file src/main.rs", content.len())
        );

        let input = serde_json::from_value(json!({ "path": "src/main.rs" }))
            .unwrap();
        let read_back = read_tool.execute(input).await.unwrap();
        assert_eq!(read_back, content);
    }

    #[tokio::test]
    async fn test_create_file_overwrites() {
        let dir = tempdir().unwrap();
        let tool = CreateFileTool::new(Workspace::new(dir.path()));

        tool.execute(params("notes.txt", "first")).await.unwrap();
        let result = tool.execute(params("notes.txt", "second")).await.unwrap();
        assert_eq!(result, "File created: notes.txt");
        assert_eq!(
            fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
            "second"
        );
    }
}
