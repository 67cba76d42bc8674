//! Error types for shellscript.
//!
//! Every helper returns [`Result`], so a script can bubble failures up with `?`
//! or match on the variant it cares about (a missing file, a timed out
//! command, a process that disappeared).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the shellscript library.
#[derive(Debug, Error)]
pub enum ShellError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Path is not a file: {0}")]
    NotAFile(PathBuf),

    #[error("Directory is not empty: {0}")]
    DirectoryNotEmpty(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Path already exists: {0}")]
    AlreadyExists(PathBuf),

    // Process errors
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("Command `{command}` exited with code {code:?}")]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Process not found: {pid}")]
    ProcessNotFound { pid: u32 },

    #[error("Access denied to process {pid}")]
    ProcessAccessDenied { pid: u32 },

    #[error("Process already running: {name}")]
    AlreadyRunning { name: String },

    // System information errors
    #[error("System query failed: {message}")]
    SystemQuery { message: String },

    #[error("Operation not supported on this platform: {operation}")]
    Unsupported { operation: String },

    // Data errors
    #[error("Invalid argument {field}: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("Cannot parse date/time from {input:?}: {message}")]
    DateTimeParse { input: String, message: String },

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Unknown group: {0}")]
    UnknownGroup(String),

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("YAML error: {message}")]
    Yaml {
        message: String,
        #[source]
        source: Option<serde_yaml::Error>,
    },

    #[error("TOML error: {message}")]
    Toml { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for shellscript operations.
pub type Result<T> = std::result::Result<T, ShellError>;

impl From<std::io::Error> for ShellError {
    fn from(err: std::io::Error) -> Self {
        ShellError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for ShellError {
    fn from(err: serde_json::Error) -> Self {
        ShellError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_yaml::Error> for ShellError {
    fn from(err: serde_yaml::Error) -> Self {
        ShellError::Yaml {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<toml::de::Error> for ShellError {
    fn from(err: toml::de::Error) -> Self {
        ShellError::Toml {
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ShellError {
    fn from(err: toml::ser::Error) -> Self {
        ShellError::Toml {
            message: err.to_string(),
        }
    }
}

impl ShellError {
    /// Create an IO error with path context.
    ///
    /// The common OS error kinds are mapped to their dedicated variants so
    /// callers can match on `FileNotFound` instead of digging into `source`.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => ShellError::FileNotFound(path),
            std::io::ErrorKind::PermissionDenied => ShellError::PermissionDenied(path),
            std::io::ErrorKind::AlreadyExists => ShellError::AlreadyExists(path),
            _ => ShellError::Io {
                message: err.to_string(),
                path: Some(path),
                source: Some(err),
            },
        }
    }

    /// Shorthand for an `InvalidArgument` error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ShellError::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an `Unsupported` error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        ShellError::Unsupported {
            operation: operation.into(),
        }
    }

    /// True when the error means "the thing is not there".
    pub fn is_not_found(&self) -> bool {
        match self {
            ShellError::FileNotFound(_) | ShellError::ProcessNotFound { .. } => true,
            ShellError::Io {
                source: Some(source),
                ..
            } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// True when a command hit its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ShellError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShellError::ProcessNotFound { pid: 42 };
        assert_eq!(err.to_string(), "Process not found: 42");

        let err = ShellError::Timeout {
            command: "sleep 5".into(),
            timeout: Duration::from_millis(100),
        };
        assert_eq!(err.to_string(), "Command `sleep 5` timed out after 100ms");
    }

    #[test]
    fn test_io_with_path_maps_kinds() {
        let err = ShellError::io_with_path(
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            "/tmp/missing",
        );
        assert!(matches!(err, ShellError::FileNotFound(ref p) if p == &PathBuf::from("/tmp/missing")));
        assert!(err.is_not_found());

        let err = ShellError::io_with_path(
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no"),
            "/root/secret",
        );
        assert!(matches!(err, ShellError::PermissionDenied(_)));

        let err = ShellError::io_with_path(std::io::Error::other("disk on fire"), "/x");
        assert!(matches!(err, ShellError::Io { path: Some(_), .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_plain_io_not_found() {
        let err: ShellError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.is_not_found());
        assert!(!err.is_timeout());
    }
}
