//! Error taxonomy shared by the index, the tools and the command loop.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("{0}")]
    Validation(String),

    /// Structural extraction failed. Indexing treats this as non-fatal.
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("{tool} not found. Install it for more detailed analysis")]
    ExternalToolUnavailable { tool: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AssistantError {
    pub fn validation(message: impl Into<String>) -> Self {
        AssistantError::Validation(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssistantError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = AssistantError::NotFound {
            path: PathBuf::from("src/missing.py"),
        };
        assert_eq!(err.to_string(), "File not found: src/missing.py");

        let err = AssistantError::io(
            "out.py",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("out.py"));
        assert!(err.to_string().contains("denied"));

        let err = AssistantError::Parse {
            line: 3,
            column: 7,
            message: "unexpected token".into(),
        };
        assert_eq!(
            err.to_string(),
            "Parse error at line 3, column 7: unexpected token"
        );
    }
}
