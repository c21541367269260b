//! Tokenizer: turns a stream of characters into a stream of token trees.

use super::{Position, ReadErr, ReadResult, Reader, Token};

/// Flags allowed after the closing slash of a regex literal.
const REGEX_FLAGS: &str = "dgimsuy";

/// Atom spellings that read as the current line / column instead of a symbol.
const LINE_MARKER: &str = "__LINE";
const COLUMN_MARKER: &str = "__COLUMN";

/// How deep `( )`, `[ ]` and `{ }` may nest.
pub const MAX_NESTING_DEPTH: usize = 100;

mod regex {
    use regex::Regex;
    use std::sync::OnceLock;

    /// Everything that is allowed to be a number, and some things that aren't
    /// (e.g. "-" or "e"); those are weeded out by `number_prefix`.
    pub(super) fn number_shape() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r"\A-?[0-9]*\.?[0-9]*e?[0-9]*\z")
                .expect("could not compile regex for number shape")
        })
    }

    /// The longest prefix that is a valid number.
    pub(super) fn number_prefix() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r"\A-?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:e[0-9]+)?")
                .expect("could not compile regex for number prefix")
        })
    }
}

fn is_space(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\n' | '\r' | '\t' | '\x0C' | '\u{2028}' | '\u{2029}' | '\u{A0}'
    )
}

/// Characters that end an atom.
fn is_terminator(ch: char) -> bool {
    is_space(ch) || matches!(ch, '"' | '\'' | ';' | '(' | ')' | '[' | ']' | '{' | '}')
}

/// Characters after a slash that make it a bare division symbol.
///
/// Only closing brackets count, not opening brackets or quotes:
/// `/(a|b)/` and `/"/` are regex literals.
fn ends_slash(ch: char) -> bool {
    is_space(ch) || matches!(ch, ';' | ')' | ']' | '}')
}

/// Interpret an atom as a number, if it looks like one.
fn parse_number(atom: &str) -> Option<f64> {
    if !regex::number_shape().is_match(atom) {
        return None;
    }
    let prefix = regex::number_prefix().find(atom)?;
    prefix.as_str().parse().ok()
}

/// Reads tokens from a [Reader].
///
/// The reader can be swapped between compilation units.
pub struct Parser {
    reader: Box<dyn Reader>,
    token_start: Position,
    depth: usize,
}

impl Parser {
    pub fn new(reader: impl Reader + 'static) -> Self {
        Parser {
            reader: Box::new(reader),
            token_start: Position::default(),
            depth: 0,
        }
    }

    /// Replace the underlying reader; subsequent reads come from the new one.
    pub fn set_reader(&mut self, reader: impl Reader + 'static) {
        self.reader = Box::new(reader);
        self.token_start = Position::default();
    }

    /// Rewind the current reader to the start of its input.
    pub fn reset(&mut self) {
        self.reader.reset();
        self.token_start = Position::default();
    }

    pub fn position(&self) -> Position {
        self.reader.position()
    }

    /// Short description of the current input, for diagnostics.
    pub fn describe(&self) -> String {
        self.reader.describe()
    }

    /// Where the most recent top-level token started.
    pub fn token_start(&self) -> Position {
        self.token_start
    }

    /// Read the next complete token, or `None` at the end of input.
    pub fn read_token(&mut self) -> ReadResult<Option<Token>> {
        self.skip_insignificant();
        self.token_start = self.position();
        self.depth = 0;
        self.read_token_inner()
            .map_err(|e| e.annotate(self.reader.describe()))
    }

    fn read_token_inner(&mut self) -> ReadResult<Option<Token>> {
        self.skip_insignificant();
        let token = match self.peek() {
            None => return Ok(None),
            Some(quote @ ('"' | '\'')) => Token::Str(self.read_delimited(quote, "string")?),
            Some('/') => self.read_slash()?,
            Some('(') => Token::List(self.read_nested('(', ')')?),
            Some('[') => Token::Array(self.read_nested('[', ']')?),
            Some('{') => Token::Object(self.read_nested('{', '}')?),
            Some(')') => return Err(unexpected_close(')', "parenthesis")),
            Some(']') => return Err(unexpected_close(']', "square bracket")),
            Some('}') => return Err(unexpected_close('}', "curly bracket")),
            Some(_) => self.read_atom(),
        };
        Ok(Some(token))
    }

    /// Skip whitespace and comments.
    fn skip_insignificant(&mut self) {
        loop {
            self.skip_space();
            if self.peek() != Some(';') {
                break;
            }
            self.skip_comment();
        }
    }

    fn peek(&self) -> Option<char> {
        self.reader.peek()
    }

    fn advance(&mut self) -> Option<char> {
        self.reader.advance()
    }

    /// Collect characters while `allow` holds, leaving the first disallowed one unread.
    fn read_while(&mut self, allow: impl Fn(char) -> bool) -> String {
        let mut buf = String::new();
        let mut ch = self.peek();
        while let Some(c) = ch.filter(|&c| allow(c)) {
            buf.push(c);
            ch = self.advance();
        }
        buf
    }

    fn skip_space(&mut self) {
        self.read_while(is_space);
    }

    /// Comments run to the end of the line.
    fn skip_comment(&mut self) {
        self.read_while(|ch| ch != '\n');
    }

    fn expect(&mut self, want: char) -> ReadResult<()> {
        match self.peek() {
            Some(ch) if ch == want => {
                self.advance();
                Ok(())
            }
            Some(ch) => Err(ReadErr::Error(format!("expected `{want}`, found `{ch}`"))),
            None => Err(ReadErr::Incomplete(format!(
                "expected `{want}`, found end of input"
            ))),
        }
    }

    /// Read text up to an unescaped `delimiter`.
    ///
    /// A backslash always escapes the next character. Escapes are kept as written.
    fn read_delimited(&mut self, delimiter: char, what: &str) -> ReadResult<String> {
        self.expect(delimiter)?;
        self.read_delimited_body(delimiter, what, String::new())
    }

    fn read_delimited_body(
        &mut self,
        delimiter: char,
        what: &str,
        mut out: String,
    ) -> ReadResult<String> {
        let mut escaped = false;
        loop {
            let ch = self
                .peek()
                .ok_or_else(|| ReadErr::Incomplete(format!("unterminated {what}")))?;
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == delimiter {
                self.advance();
                return Ok(out);
            }
            out.push(ch);
            self.advance();
        }
    }

    /// A slash is division (`/`, `/=`) when it stands alone; otherwise it opens a regex.
    fn read_slash(&mut self) -> ReadResult<Token> {
        self.expect('/')?;
        let mut pattern = String::new();
        match self.peek() {
            None => return Ok(Token::symbol("/")),
            Some(ch) if ends_slash(ch) => return Ok(Token::symbol("/")),
            Some('=') => {
                pattern.push('=');
                match self.advance() {
                    None => return Ok(Token::symbol("/=")),
                    Some(ch) if ends_slash(ch) => return Ok(Token::symbol("/=")),
                    Some(_) => (),
                }
            }
            Some(_) => (),
        }
        let pattern = self.read_delimited_body('/', "regex", pattern)?;
        let flags = self.read_while(|ch| REGEX_FLAGS.contains(ch));
        Ok(Token::Regex { pattern, flags })
    }

    fn read_nested(&mut self, open: char, close: char) -> ReadResult<Vec<Token>> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ReadErr::Error(format!(
                "forms nested too deeply (more than {MAX_NESTING_DEPTH})"
            )));
        }
        self.depth += 1;
        let result = self.read_nested_items(open, close);
        self.depth -= 1;
        result
    }

    fn read_nested_items(&mut self, open: char, close: char) -> ReadResult<Vec<Token>> {
        self.expect(open)?;
        let mut tokens = Vec::new();
        loop {
            self.skip_insignificant();
            if self.peek() == Some(close) {
                self.advance();
                return Ok(tokens);
            }
            match self.read_token_inner()? {
                Some(token) => tokens.push(token),
                None => {
                    return Err(ReadErr::Incomplete(format!(
                        "unterminated form: expected `{close}`"
                    )))
                }
            }
        }
    }

    fn read_atom(&mut self) -> Token {
        let atom = self.read_while(|ch| !is_terminator(ch));
        if let Some(n) = parse_number(&atom) {
            return Token::Number(n);
        }
        let position = self.position();
        match atom.as_str() {
            LINE_MARKER => Token::Number(position.line as f64),
            COLUMN_MARKER => {
                Token::Number(position.column.saturating_sub(COLUMN_MARKER.len()) as f64)
            }
            _ => Token::Symbol(atom),
        }
    }
}

fn unexpected_close(bracket: char, name: &str) -> ReadErr {
    ReadErr::Error(format!("unexpected `{bracket}`: {name} pair not open"))
}
