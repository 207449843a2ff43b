use aicodegen_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use walkdir::WalkDir;

use super::{Workspace, display_path, io_error, run_blocking};

fn default_path() -> String {
    ".".to_owned()
}

#[derive(Deserialize, JsonSchema)]
pub struct FindFilesParameters {
    #[serde(default = "default_path")]
    #[schemars(description = "Path to run the find from.")]
    path: String,
    #[serde(rename = "filenameSearch")]
    #[schemars(description = "Part of the file name to look for.")]
    filename_search: String,
}

/// A tool that finds files whose name contains a search string.
pub struct FindFilesTool {
    workspace: Workspace,
    parameter_schema: Value,
}

impl FindFilesTool {
    /// Creates a new find files tool.
    #[inline]
    pub fn new(workspace: Workspace) -> Self {
        FindFilesTool {
            workspace,
            parameter_schema: schema_for!(FindFilesParameters).to_value(),
        }
    }
}

impl Tool for FindFilesTool {
    type Input = FindFilesParameters;

    fn name(&self) -> &str {
        "find_files"
    }

    fn description(&self) -> &str {
        "Find files whose name contains the given text, searching all subdirectories"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: FindFilesParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let dir = self.workspace.resolve(&input.path);
        async move {
            info!(
                "finding files like {} in dir: {}",
                input.filename_search, input.path
            );
            run_blocking(move || {
                let mut found = vec![];
                for entry in WalkDir::new(&dir).min_depth(1) {
                    let entry = entry.map_err(|err| match err.into_io_error() {
                        Some(err) => io_error(&input.path, err),
                        None => ToolError::execution_error().with_reason(
                            format!("{}: filesystem loop detected", input.path),
                        ),
                    })?;
                    let matches = entry
                        .file_name()
                        .to_string_lossy()
                        .contains(&input.filename_search);
                    if entry.file_type().is_file() && matches {
                        found.push(display_path(
                            &input.path,
                            &dir,
                            entry.path(),
                        ));
                    }
                }

                if found.is_empty() {
                    return Ok(format!(
                        "No files found matching \"{}\"",
                        input.filename_search
                    ));
                }
                found.sort();
                Ok(format!("Matching files:\n{}", found.join("\n")))
            })
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use aicodegen_core::tool::ErrorKind;
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_find_files() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/config")).unwrap();
        fs::write(dir.path().join("config.json"), "{}").unwrap();
        fs::write(dir.path().join("src/config/app_config.rs"), "").unwrap();
        fs::write(dir.path().join("src/main.rs"), "").unwrap();
        let tool = FindFilesTool::new(Workspace::new(dir.path()));

        // `path` defaults to the workspace root.
        let input = serde_json::from_value(json!({ "filenameSearch": "config" }))
            .unwrap();
        let found = tool.execute(input).await.unwrap();
        assert_eq!(
            found,
            "Matching files:\n./config.json\n./src/config/app_config.rs"
        );

        let input = serde_json::from_value(json!({ "filenameSearch": "xyz" }))
            .unwrap();
        let found = tool.execute(input).await.unwrap();
        assert_eq!(found, "No files found matching \"xyz\"");
    }

    #[tokio::test]
    async fn test_missing_dir() {
        let dir = tempdir().unwrap();
        let tool = FindFilesTool::new(Workspace::new(dir.path()));
        let err = tool
            .execute(FindFilesParameters {
                path: "gone".to_owned(),
                filename_search: "a".to_owned(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
    }
}
