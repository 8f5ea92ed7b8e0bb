//! Error types for the JSX transform

use serde::{Deserialize, Serialize};

use crate::utils::LineIndex;

/// Malformed JSX or host-language lexical error.
///
/// `line` and `column` are 1-based; `column` counts characters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} ({line}:{column})")]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset into the transformed input
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, source: &str, offset: usize) -> Self {
        let (line, column) = LineIndex::new(source).line_col(offset);
        Self {
            message: message.into(),
            offset,
            line,
            column,
        }
    }
}

/// Errors returned by the transform driver
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransformError {
    #[error("{}", describe(.file_path, .error))]
    Syntax {
        file_path: String,
        /// The source line the error points into
        line_text: String,
        #[source]
        error: SyntaxError,
    },

    #[error("Invalid transform options: {0}")]
    InvalidOptions(String),
}

fn describe(file_path: &str, error: &SyntaxError) -> String {
    let path = if file_path.is_empty() {
        "<input>"
    } else {
        file_path
    };
    format!("{}:{}:{}: {}", path, error.line, error.column, error.message)
}

/// Serializable error payload handed across the WASM boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl TransformError {
    pub(crate) fn syntax(error: SyntaxError, source: &str, file_path: &str) -> Self {
        let line_text = LineIndex::new(source).line_text(error.line).to_string();
        TransformError::Syntax {
            file_path: file_path.to_string(),
            line_text,
            error,
        }
    }

    /// The wrapped syntax error, if any
    pub fn syntax_error(&self) -> Option<&SyntaxError> {
        match self {
            TransformError::Syntax { error, .. } => Some(error),
            TransformError::InvalidOptions(_) => None,
        }
    }

    pub fn info(&self) -> ErrorInfo {
        match self {
            TransformError::Syntax { error, .. } => ErrorInfo {
                message: error.message.clone(),
                line: error.line,
                column: error.column,
            },
            TransformError::InvalidOptions(message) => ErrorInfo {
                message: message.clone(),
                line: 0,
                column: 0,
            },
        }
    }

    /// Render the offending line with a caret under the error column
    pub fn code_frame(&self) -> Option<String> {
        let TransformError::Syntax {
            line_text, error, ..
        } = self
        else {
            return None;
        };
        let gutter = error.line.to_string();
        let padding = " ".repeat(gutter.len());
        let caret_indent: String = line_text
            .chars()
            .take(error.column.saturating_sub(1))
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        Some(format!(
            "{gutter} | {line_text}\n{padding} | {caret_indent}^ {}",
            error.message
        ))
    }
}
