//! Support for reading Liscript expressions from character sources.
//!
//! The [Reader] trait is the only layer with access to raw text.
//! The [Parser] pulls characters from a reader one at a time and produces [Token]s;
//! it never looks at the text directly, so any reader implementation can back it.

use std::fmt;

mod parse;
mod text;
mod token;

pub use parse::{Parser, MAX_NESTING_DEPTH};
pub use text::{CharsReader, TextReader};
pub use token::{format_number, quote_string, Token};

/// A location in the input stream.
///
/// `offset` counts characters from 0; `line` and `column` are 1-indexed, as they are
/// for humans reading diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Position {
    /// The position after stepping over `ch`.
    pub fn step(self, ch: char) -> Self {
        if ch == '\n' {
            Position {
                offset: self.offset + 1,
                line: self.line + 1,
                column: 1,
            }
        } else {
            Position {
                offset: self.offset + 1,
                column: self.column + 1,
                ..self
            }
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A single-character lookahead over some text.
///
/// Absence of a character (end of input) is signaled by `None`, never by an error.
pub trait Reader {
    /// The character at the current position, without advancing.
    fn peek(&self) -> Option<char>;

    /// Move one character forward, and return the new current character.
    /// Returns `None` once there is nothing left to move onto.
    fn advance(&mut self) -> Option<char>;

    /// Return to the start of the input.
    fn reset(&mut self);

    /// The current position.
    fn position(&self) -> Position;

    /// Short human-readable name of the source, for diagnostics.
    fn describe(&self) -> String;
}

/// Error type if a read does not complete.
///
/// A reader may experience a true tokenizing/parsing error, e.g. "())", that no additional input can fix.
/// This is distinct from a reader that gets an unexpected end-of-input, e.g. "(()":
/// it may be that more input will fix the issue.
///
/// Compiling a file treats both as fatal, but the distinction is kept
/// so that an interactive caller could prompt for more input instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadErr {
    Error(String),
    Incomplete(String),
}

impl fmt::Display for ReadErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadErr::Error(e) => write!(f, "error in input: {e}"),
            ReadErr::Incomplete(e) => write!(f, "incomplete input: {e}"),
        }
    }
}

impl std::error::Error for ReadErr {}

impl ReadErr {
    /// Add additional context to an error.
    pub fn annotate(self, more: impl AsRef<str>) -> Self {
        match self {
            ReadErr::Error(e) => ReadErr::Error(format!("{}: {}", more.as_ref(), e)),
            ReadErr::Incomplete(e) => ReadErr::Incomplete(format!("{}: {}", more.as_ref(), e)),
        }
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, ReadErr::Incomplete(_))
    }
}

/// The main result type for this module:
/// a T (token, character, etc), or an error, or incomplete.
pub type ReadResult<T> = Result<T, ReadErr>;
