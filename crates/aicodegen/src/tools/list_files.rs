use std::fs;
use std::path::Path;

use aicodegen_core::tool::{Error as ToolError, Tool, ToolResult};
use glob::Pattern;
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use walkdir::WalkDir;

use super::{Workspace, display_path, io_error, run_blocking};

/// Paths skipped by [`ListFilesRecursiveTool`] unless the model passes its
/// own list.
pub const DEFAULT_EXCLUDE_PATHS: &[&str] =
    &["*/bin", "*/lib", "*/obj", "*/node_modules", "*/.git", "*/.svn"];

#[derive(Deserialize, JsonSchema)]
pub struct ListFilesParameters {
    #[schemars(description = "Path to the directory.")]
    path: String,
}

/// A tool that lists the immediate entries of a directory.
pub struct ListFilesTool {
    workspace: Workspace,
    parameter_schema: Value,
}

impl ListFilesTool {
    /// Creates a new list files tool.
    #[inline]
    pub fn new(workspace: Workspace) -> Self {
        ListFilesTool {
            workspace,
            parameter_schema: schema_for!(ListFilesParameters).to_value(),
        }
    }
}

impl Tool for ListFilesTool {
    type Input = ListFilesParameters;

    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List the files in a directory"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: ListFilesParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let dir = self.workspace.resolve(&input.path);
        async move {
            info!("listing dir: {}", input.path);
            run_blocking(move || list_dir(&input.path, &dir)).await
        }
    }
}

fn list_dir(display: &str, dir: &Path) -> ToolResult {
    let mut names = vec![];
    for entry in fs::read_dir(dir).map_err(|err| io_error(display, err))? {
        let entry = entry.map_err(|err| io_error(display, err))?;
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().is_ok_and(|ty| ty.is_dir()) {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();

    let mut result = format!("Files in {display}:\n");
    result.push_str(&names.join("\n"));
    Ok(result)
}

#[derive(Deserialize, JsonSchema)]
pub struct ListFilesRecursiveParameters {
    #[schemars(description = "Path to the directory.")]
    path: String,
    #[serde(default, rename = "excludePaths")]
    #[schemars(
        description = "Glob patterns of paths to skip, matched against the full path. Defaults to common build, dependency and version-control directories."
    )]
    exclude_paths: Option<Vec<String>>,
}

/// A tool that lists every file below a directory, skipping excluded paths.
pub struct ListFilesRecursiveTool {
    workspace: Workspace,
    parameter_schema: Value,
}

impl ListFilesRecursiveTool {
    /// Creates a new recursive listing tool.
    #[inline]
    pub fn new(workspace: Workspace) -> Self {
        ListFilesRecursiveTool {
            workspace,
            parameter_schema: schema_for!(ListFilesRecursiveParameters)
                .to_value(),
        }
    }
}

impl Tool for ListFilesRecursiveTool {
    type Input = ListFilesRecursiveParameters;

    fn name(&self) -> &str {
        "list_files_recursive"
    }

    fn description(&self) -> &str {
        "List all files in a directory and its subdirectories, excluding certain paths"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: ListFilesRecursiveParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let dir = self.workspace.resolve(&input.path);
        async move {
            info!("listing files recursively in: {}", input.path);
            let excludes = match &input.exclude_paths {
                Some(paths) => compile_patterns(paths)?,
                None => compile_patterns(DEFAULT_EXCLUDE_PATHS)?,
            };
            run_blocking(move || {
                let files = walk_files(&input.path, &dir, &excludes)?;
                let mut result = format!(
                    "Files in {} (including subdirectories):\n",
                    input.path
                );
                result.push_str(&files.join("\n"));
                Ok(result)
            })
            .await
        }
    }
}

fn compile_patterns<S: AsRef<str>>(
    patterns: &[S],
) -> Result<Vec<Pattern>, ToolError> {
    patterns
        .iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Pattern::new(pattern).map_err(|err| {
                ToolError::invalid_input().with_reason(format!(
                    "bad exclude pattern `{pattern}`: {err}"
                ))
            })
        })
        .collect()
}

/// Returns the sorted paths of all files below `dir`, spelled relative to
/// `display`. Excluded directories are not descended into.
fn walk_files(
    display: &str,
    dir: &Path,
    excludes: &[Pattern],
) -> Result<Vec<String>, ToolError> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| {
            !excludes
                .iter()
                .any(|pattern| pattern.matches_path(entry.path()))
        });

    let mut files = vec![];
    for entry in walker {
        let entry = entry.map_err(|err| match err.into_io_error() {
            Some(err) => io_error(display, err),
            None => ToolError::execution_error()
                .with_reason(format!("{display}: filesystem loop detected")),
        })?;
        if entry.file_type().is_file() {
            files.push(display_path(display, dir, entry.path()));
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_list_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "").unwrap();
        fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        fs::create_dir(dir.path().join("src/tools")).unwrap();
        let tool = ListFilesTool::new(Workspace::new(dir.path()));

        let listing = tool
            .execute(ListFilesParameters {
                path: "./src".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(listing, "Files in ./src:\nlib.rs\nmain.rs\ntools/");

        let err = tool
            .execute(ListFilesParameters {
                path: "nope".to_owned(),
            })
            .await
            .unwrap_err();
        assert!(err.reason().starts_with("nope: "));
    }

    #[tokio::test]
    async fn test_list_files_recursive_excludes() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for sub in ["src/nested", "node_modules/pkg", ".git", "app/bin"] {
            fs::create_dir_all(root.join(sub)).unwrap();
        }
        fs::write(root.join("README.md"), "").unwrap();
        fs::write(root.join("src/nested/mod.rs"), "").unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();
        fs::write(root.join(".git/HEAD"), "").unwrap();
        fs::write(root.join("app/bin/tool"), "").unwrap();
        fs::write(root.join("app/main.c"), "").unwrap();
        let tool = ListFilesRecursiveTool::new(Workspace::new(root));

        let listing = tool
            .execute(ListFilesRecursiveParameters {
                path: ".".to_owned(),
                exclude_paths: None,
            })
            .await
            .unwrap();
        let mut lines = listing.lines();
        assert_eq!(
            lines.next(),
            Some("Files in . (including subdirectories):")
        );
        let files: Vec<_> = lines.collect();
        assert_eq!(files.len(), 3, "{files:?}");
        assert!(files.iter().any(|f| f.ends_with("README.md")));
        assert!(files.iter().any(|f| f.ends_with("src/nested/mod.rs")));
        assert!(files.iter().any(|f| f.ends_with("app/main.c")));

        let listing = tool
            .execute(ListFilesRecursiveParameters {
                path: ".".to_owned(),
                exclude_paths: Some(vec!["*/src".to_owned()]),
            })
            .await
            .unwrap();
        assert!(listing.contains("index.js"));
        assert!(!listing.contains("mod.rs"));
    }
}
