//! The file-system tools the model can call.
//!
//! Every tool resolves relative paths against a shared [`Workspace`], runs
//! its blocking file-system work on the blocking thread pool, and reports
//! failures as tool errors so the dialogue can continue.

mod create_directory;
mod edit_file;
mod find_files;
mod list_files;
mod read_file;
mod summarise_doc;
mod write_file;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{env, io};

use aicodegen_core::tool::Error as ToolError;
use tokio::task::spawn_blocking;

pub use create_directory::CreateDirectoryTool;
pub use edit_file::{EditFileRegexTool, EditFileTool};
pub use find_files::FindFilesTool;
pub use list_files::{
    DEFAULT_EXCLUDE_PATHS, ListFilesRecursiveTool, ListFilesTool,
};
pub use read_file::ReadFileTool;
pub use summarise_doc::SummariseDocTool;
pub use write_file::{CreateFileTool, WriteFileTool};

/// The directory that relative tool paths are resolved against.
///
/// Cloning is cheap, and clones share the same root.
#[derive(Clone, Debug)]
pub struct Workspace {
    root: Arc<PathBuf>,
}

impl Workspace {
    /// Creates a workspace rooted at `root`.
    #[inline]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    /// Creates a workspace rooted at the current working directory.
    pub fn current_dir() -> io::Result<Self> {
        env::current_dir().map(Self::new)
    }

    /// Returns the root directory.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `path` against the root. Absolute paths are kept as-is.
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.root.join(path)
        }
    }
}

/// Runs blocking file-system work off the async runtime.
async fn run_blocking<T, F>(f: F) -> Result<T, ToolError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ToolError> + Send + 'static,
{
    spawn_blocking(f).await.map_err(|err| {
        ToolError::execution_error()
            .with_reason(format!("tool task failed: {err}"))
    })?
}

/// Spells `path`, found below `dir`, the way the model named `dir`.
fn display_path(display: &str, dir: &Path, path: &Path) -> String {
    match path.strip_prefix(dir) {
        Ok(relative) => Path::new(display).join(relative).display().to_string(),
        Err(_) => path.display().to_string(),
    }
}

/// Converts an I/O error into a tool error that names the path involved.
fn io_error(path: &str, err: io::Error) -> ToolError {
    let reason = format!("{path}: {err}");
    ToolError::from(err).with_reason(reason)
}
