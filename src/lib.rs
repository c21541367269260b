//! Liscript: an s-expression language compiled to JavaScript source text.
//!

pub mod reader;

pub mod compiler;
pub mod error;

pub mod driver;

pub use compiler::Compiler;
pub use error::{CompileError, CompileResult};
pub use reader::{CharsReader, Parser, Position, ReadErr, Reader, TextReader, Token};
