//! The token tree produced by the parser.

use std::fmt;

/// A Liscript token.
///
/// Whitespace and comments are never tokens.
/// Nested forms keep the kind of bracket they were written with.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Symbol(String),
    /// The text between the quotes, with escape sequences kept as written.
    Str(String),
    Regex {
        pattern: String,
        flags: String,
    },
    /// `( ... )`: a call or built-in form.
    List(Vec<Token>),
    /// `[ ... ]`: an array literal.
    Array(Vec<Token>),
    /// `{ ... }`: an object literal.
    Object(Vec<Token>),
}

impl Token {
    pub fn symbol(s: impl Into<String>) -> Self {
        Token::Symbol(s.into())
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Token::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Token::Symbol(_))
    }

    /// The elements of a nested form, of any bracket kind.
    pub fn elements(&self) -> Option<&[Token]> {
        match self {
            Token::List(v) | Token::Array(v) | Token::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Name of the token's kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Number(_) => "number",
            Token::Symbol(_) => "symbol",
            Token::Str(_) => "string",
            Token::Regex { .. } => "regex",
            Token::List(_) => "form",
            Token::Array(_) => "array",
            Token::Object(_) => "object",
        }
    }
}

/// Spell a number the way the target language prints it.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_owned()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_owned()
    } else if n == 0.0 {
        // -0 prints as 0.
        "0".to_owned()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

/// Render string contents as a double-quoted literal.
///
/// Escape pairs pass through untouched; bare double quotes and raw line terminators
/// are escaped so the literal stays on one line.
pub fn quote_string(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 2);
    out.push('"');
    let mut chars = content.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push_str("\\\\"),
            },
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: char, items: &[Token], close: char) -> fmt::Result {
    write!(f, "{open}")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}

/// Renders the token in source notation.
///
/// Strings are always written double-quoted, with [quote_string]'s escapes added,
/// so reading the output back need not give an identical `Str`.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", format_number(*n)),
            Token::Symbol(s) => write!(f, "{s}"),
            Token::Str(s) => write!(f, "{}", quote_string(s)),
            Token::Regex { pattern, flags } => write!(f, "/{pattern}/{flags}"),
            Token::List(v) => write_seq(f, '(', v, ')'),
            Token::Array(v) => write_seq(f, '[', v, ']'),
            Token::Object(v) => write_seq(f, '{', v, '}'),
        }
    }
}
