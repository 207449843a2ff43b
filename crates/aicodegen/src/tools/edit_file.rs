use std::fs;
use std::path::Path;

use aicodegen_core::tool::{Error as ToolError, Tool, ToolResult};
use regex::RegexBuilder;
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use super::{Workspace, io_error, run_blocking};

#[derive(Deserialize, JsonSchema)]
pub struct EditFileParameters {
    #[schemars(description = "Path to the file.")]
    path: String,
    #[schemars(description = "Text to find.")]
    find: String,
    #[schemars(description = "Text to replace every occurrence with.")]
    replace: String,
}

/// A tool that replaces every literal occurrence of a string in a file.
pub struct EditFileTool {
    workspace: Workspace,
    parameter_schema: Value,
}

impl EditFileTool {
    /// Creates a new edit file tool.
    #[inline]
    pub fn new(workspace: Workspace) -> Self {
        EditFileTool {
            workspace,
            parameter_schema: schema_for!(EditFileParameters).to_value(),
        }
    }
}

impl Tool for EditFileTool {
    type Input = EditFileParameters;

    fn name(&self) -> &str {
        "edit_file"
    }

    fn description(&self) -> &str {
        "Find and replace a string in a file"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: EditFileParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let path = self.workspace.resolve(&input.path);
        async move {
            info!("editing file: {}", input.path);
            if input.find.is_empty() {
                return Err(ToolError::invalid_input()
                    .with_reason("`find` must not be empty"));
            }
            run_blocking(move || {
                let count = rewrite(&input.path, &path, |content| {
                    let count = content.matches(&input.find).count();
                    (content.replace(&input.find, &input.replace), count)
                })?;
                Ok(format!(
                    "Replaced {count} occurrences of \"{}\" with \"{}\" in {}",
                    input.find, input.replace, input.path
                ))
            })
            .await
        }
    }
}

#[derive(Deserialize, JsonSchema)]
pub struct EditFileRegexParameters {
    #[schemars(description = "Path to the file.")]
    path: String,
    #[schemars(description = "Regex pattern to find.")]
    find: String,
    #[schemars(
        description = "Replacement text. Use $1 or ${name} to refer to capture groups."
    )]
    replace: String,
}

/// A tool that replaces every match of a regular expression in a file.
///
/// Patterns are case-sensitive, and `^`/`$` match at line boundaries.
pub struct EditFileRegexTool {
    workspace: Workspace,
    parameter_schema: Value,
}

impl EditFileRegexTool {
    /// Creates a new regex edit tool.
    #[inline]
    pub fn new(workspace: Workspace) -> Self {
        EditFileRegexTool {
            workspace,
            parameter_schema: schema_for!(EditFileRegexParameters).to_value(),
        }
    }
}

impl Tool for EditFileRegexTool {
    type Input = EditFileRegexParameters;

    fn name(&self) -> &str {
        "edit_file_regex"
    }

    fn description(&self) -> &str {
        "Find and replace a regex in a file - preferred to edit_file for more complex replacements"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: EditFileRegexParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let path = self.workspace.resolve(&input.path);
        async move {
            info!("editing (regex) file: {}", input.path);
            let regex = RegexBuilder::new(&input.find)
                .multi_line(true)
                .build()
                .map_err(|err| {
                    ToolError::invalid_input()
                        .with_reason(format!("invalid regex: {err}"))
                })?;
            run_blocking(move || {
                let count = rewrite(&input.path, &path, |content| {
                    let count = regex.find_iter(content).count();
                    let replaced =
                        regex.replace_all(content, input.replace.as_str());
                    (replaced.into_owned(), count)
                })?;
                Ok(format!(
                    "Replaced {count} matches of \"{}\" with \"{}\" in {}",
                    input.find, input.replace, input.path
                ))
            })
            .await
        }
    }
}

/// Reads `path`, transforms its content and writes it back.
///
/// The file is left untouched when nothing changed.
fn rewrite<F>(display: &str, path: &Path, edit: F) -> Result<usize, ToolError>
where
    F: FnOnce(&str) -> (String, usize),
{
    let content =
        fs::read_to_string(path).map_err(|err| io_error(display, err))?;
    let (new_content, count) = edit(&content);
    if new_content != content {
        fs::write(path, new_content).map_err(|err| io_error(display, err))?;
    }
    Ok(count)
}
