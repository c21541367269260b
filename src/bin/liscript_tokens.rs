//! Render the unlowered token tree of a Liscript program:
//! - source notation on stdout, i.e. a normalized mirror of the input
//! - Debug on stderr, the internal representation from the `liscript` crate.
//!
//! ```ignore
//! <input.lisp liscript_tokens
//! ```

use std::io::Read;

use anyhow::Context;
use liscript::{Parser, TextReader};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_to_string(&mut input)
        .context("could not read input as UTF-8")?;

    let mut parser = Parser::new(TextReader::new(input));
    while let Some(token) = parser
        .read_token()
        .with_context(|| format!("failed to parse input at {}", parser.position()))?
    {
        println!("{token}");
        eprintln!("{token:?}");
    }
    Ok(())
}
