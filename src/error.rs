//! Errors that abort a compilation.

use thiserror::Error;

use crate::reader::{Position, ReadErr};

/// Every error carries the position it was detected at:
/// for syntax errors, the reader's position; otherwise, the start of the
/// top-level form being lowered.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error("{position}: syntax error: {source}")]
    Syntax {
        position: Position,
        #[source]
        source: ReadErr,
    },

    /// Argument count outside of a form's contract.
    #[error("{position}: {form}: {message}")]
    Arity {
        position: Position,
        form: String,
        message: String,
    },

    /// An argument of the wrong kind.
    #[error("{position}: {form}: {message}")]
    Shape {
        position: Position,
        form: String,
        message: String,
    },

    #[error("{position}: macro: {message}")]
    MacroDefinition { position: Position, message: String },

    #[error("{position}: expanding macro {name}: {message}")]
    MacroExpansion {
        position: Position,
        name: String,
        message: String,
    },
}

impl CompileError {
    pub fn position(&self) -> Position {
        match self {
            CompileError::Syntax { position, .. }
            | CompileError::Arity { position, .. }
            | CompileError::Shape { position, .. }
            | CompileError::MacroDefinition { position, .. }
            | CompileError::MacroExpansion { position, .. } => *position,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
