use std::fs;

use aicodegen_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use super::{Workspace, io_error, run_blocking};

#[derive(Deserialize, JsonSchema)]
pub struct CreateDirectoryParameters {
    #[schemars(description = "Directory path to create.")]
    path: String,
}

/// A tool that creates a directory along with its missing parents.
pub struct CreateDirectoryTool {
    workspace: Workspace,
    parameter_schema: Value,
}

impl CreateDirectoryTool {
    /// Creates a new create directory tool.
    #[inline]
    pub fn new(workspace: Workspace) -> Self {
        CreateDirectoryTool {
            workspace,
            parameter_schema: schema_for!(CreateDirectoryParameters).to_value(),
        }
    }
}

impl Tool for CreateDirectoryTool {
    type Input = CreateDirectoryParameters;

    fn name(&self) -> &str {
        "create_directory"
    }

    fn description(&self) -> &str {
        "Create a new directory at the specified path"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: CreateDirectoryParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let dir = self.workspace.resolve(&input.path);
        async move {
            info!("creating directory: {}", input.path);
            run_blocking(move || {
                if dir.is_dir() {
                    return Ok(format!(
                        "Directory \"{}\" already exists.",
                        input.path
                    ));
                }
                if dir.exists() {
                    return Err(ToolError::execution_error().with_reason(
                        format!("{} exists and is not a directory", input.path),
                    ));
                }
                fs::create_dir_all(&dir)
                    .map_err(|err| io_error(&input.path, err))?;
                Ok(format!(
                    "Directory \"{}\" created successfully.",
                    input.path
                ))
            })
            .await
        }
    }
}
