//! Error types for the LESS to Sass converter

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("IO error on {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory traversal error under {path}: {message}")]
    Traversal { path: String, message: String },

    #[error("Upstream error: {message}")]
    Upstream { message: String },

    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    #[error("Output collision at {path}: written from '{first}' and again from '{second}'")]
    OutputCollision { path: String, first: String, second: String },

    #[error("Version stamp error in {path}: {message}")]
    VersionStamp { path: String, message: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },
}

pub type Result<T> = std::result::Result<T, ConverterError>;

impl ConverterError {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    pub fn git(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Git {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn traversal(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Traversal {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::FileNotFound {
            path: format!("{}: {}", path.into(), cause),
        }
    }

    /// Attach `path` to an IO failure; only a missing file becomes `FileNotFound`
    pub fn io_at(path: impl Into<String>, error: std::io::Error) -> Self {
        let path = path.into();
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path, error),
            _ => Self::FileIo {
                path,
                source: error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_at_classifies_by_kind() {
        let missing = ConverterError::io_at("a.less", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(matches!(missing, ConverterError::FileNotFound { .. }));

        let denied = ConverterError::io_at("a.less", io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(matches!(denied, ConverterError::FileIo { ref path, .. } if path == "a.less"));
        assert_eq!(denied.to_string(), "IO error on a.less: denied");
    }
}
