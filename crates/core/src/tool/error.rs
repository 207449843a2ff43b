use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::io;

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input provided to the tool was invalid.
    InvalidInput,
    /// Error occurred while executing the tool.
    ExecutionError,
    /// The operating system refused the operation.
    PermissionDenied,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidInput => write!(f, "Invalid input"),
            ErrorKind::ExecutionError => write!(f, "Execution error"),
            ErrorKind::PermissionDenied => write!(f, "Permission denied"),
        }
    }
}

/// Describes a tool call error.
///
/// The rendered form (`"<kind>: <reason>"`) is what the model sees.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Error {
    kind: ErrorKind,
    reason: Option<String>,
}

impl Error {
    /// Creates a new error with the `InvalidInput` kind.
    #[inline]
    pub fn invalid_input() -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            reason: None,
        }
    }

    /// Creates a new error with the `ExecutionError` kind.
    #[inline]
    pub fn execution_error() -> Self {
        Self {
            kind: ErrorKind::ExecutionError,
            reason: None,
        }
    }

    /// Creates a new error with the `PermissionDenied` kind.
    #[inline]
    pub fn permission_denied() -> Self {
        Self {
            kind: ErrorKind::PermissionDenied,
            reason: None,
        }
    }

    /// Attaches a reason to the error.
    #[inline]
    pub fn with_reason<S: Into<String>>(self, reason: S) -> Self {
        Self {
            kind: self.kind,
            reason: Some(reason.into()),
        }
    }

    /// Returns the kind of the error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the reason for the error.
    #[inline]
    pub fn reason(&self) -> Cow<'_, str> {
        match self.reason.as_deref() {
            Some(reason) => Cow::Borrowed(reason),
            None => Cow::Owned(format!("{}", self.kind)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        let base = match err.kind() {
            io::ErrorKind::PermissionDenied => Error::permission_denied(),
            _ => Error::execution_error(),
        };
        base.with_reason(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::invalid_input().with_reason("missing field `path`");
        assert_eq!(err.to_string(), "Invalid input: missing field `path`");
        assert_eq!(Error::execution_error().to_string(), "Execution error");
        assert_eq!(Error::execution_error().reason(), "Execution error");
    }

    #[test]
    fn test_from_io_error() {
        let err: Error =
            io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(err.reason(), "nope");

        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
    }
}
