//! Reader implementations.

use super::{Position, Reader};

/// Reads from text held in memory.
pub struct TextReader {
    text: Vec<char>,
    position: Position,
}

impl TextReader {
    pub fn new(text: impl AsRef<str>) -> Self {
        TextReader {
            text: text.as_ref().chars().collect(),
            position: Position::default(),
        }
    }
}

impl Reader for TextReader {
    fn peek(&self) -> Option<char> {
        self.text.get(self.position.offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let current = self.peek()?;
        self.position = self.position.step(current);
        self.peek()
    }

    fn reset(&mut self) {
        self.position = Position::default();
    }

    fn position(&self) -> Position {
        self.position
    }

    fn describe(&self) -> String {
        format!("<text {} chars>", self.text.len())
    }
}

/// Reads lazily from a character iterator, e.g. a stream being decoded.
///
/// Characters are kept once pulled, so that `reset` can rewind.
pub struct CharsReader<I> {
    source: I,
    buffer: Vec<char>,
    position: Position,
}

impl<I> CharsReader<I>
where
    I: Iterator<Item = char>,
{
    pub fn new(mut source: I) -> Self {
        let buffer = source.next().into_iter().collect();
        CharsReader {
            source,
            buffer,
            position: Position::default(),
        }
    }
}

impl<I> Reader for CharsReader<I>
where
    I: Iterator<Item = char>,
{
    fn peek(&self) -> Option<char> {
        self.buffer.get(self.position.offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let current = self.peek()?;
        self.position = self.position.step(current);
        // Keep the character under the cursor buffered, so `peek` needn't pull.
        if self.position.offset == self.buffer.len() {
            if let Some(ch) = self.source.next() {
                self.buffer.push(ch);
            }
        }
        self.peek()
    }

    fn reset(&mut self) {
        self.position = Position::default();
    }

    fn position(&self) -> Position {
        self.position
    }

    fn describe(&self) -> String {
        format!("<stream, {} chars read>", self.buffer.len())
    }
}
