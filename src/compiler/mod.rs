//! Lowering of token trees into target-language text.
//!
//! Each form is looked up, in order:
//! 1.  in the macro registry, whose transformers rewrite the unlowered arguments;
//! 2.  in the built-in table (fixed forms plus the generated infix operators);
//! 3.  otherwise the form is a function call.
//!
//! Macros are registered while compiling, so a macro is visible only to the forms that
//! follow its definition. The registry lives as long as the `Compiler`, across readers.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::{CompileError, CompileResult};
use crate::reader::{Parser, Position, Reader, TextReader, Token};

mod builtins;
mod macros;
mod operators;

#[cfg(test)]
mod builtins_test;

use builtins::{Arity, BuiltinFn, BUILTINS};
pub use macros::{ExpandError, Macro, MacroRegistry};
pub use operators::INFIX_OPERATORS;

/// How deep macro expansions may nest before we assume they recurse forever.
const MAX_EXPANSION_DEPTH: usize = 64;

/// How deep forms may nest while lowering, counting forms produced by macros.
const MAX_LOWERING_DEPTH: usize = 128;

#[derive(Clone, Copy)]
enum Builtin {
    Form(BuiltinFn),
    Infix(&'static str),
}

pub struct Compiler {
    parser: Parser,
    builtins: HashMap<&'static str, Builtin>,
    macros: MacroRegistry,

    /// Start of the top-level form being lowered; errors are reported here.
    form_start: Position,
    expansion_depth: usize,
    lowering_depth: usize,
}

impl Default for Compiler {
    /// A compiler with no input; see [Compiler::set_reader].
    fn default() -> Self {
        Compiler::from_text("")
    }
}

impl Compiler {
    pub fn new(reader: impl Reader + 'static) -> Self {
        let mut builtins: HashMap<&'static str, Builtin> = BUILTINS
            .iter()
            .map(|&(name, f)| (name, Builtin::Form(f)))
            .collect();
        for &(name, op) in INFIX_OPERATORS {
            builtins.insert(name, Builtin::Infix(op));
        }
        Compiler {
            parser: Parser::new(reader),
            builtins,
            macros: MacroRegistry::default(),
            form_start: Position::default(),
            expansion_depth: 0,
            lowering_depth: 0,
        }
    }

    /// Compiler over in-memory text.
    pub fn from_text(text: impl AsRef<str>) -> Self {
        Compiler::new(TextReader::new(text))
    }

    /// Switch to a new input. Macros defined so far stay defined.
    pub fn set_reader(&mut self, reader: impl Reader + 'static) {
        self.parser.set_reader(reader);
        self.form_start = Position::default();
    }

    pub fn macros(&self) -> &MacroRegistry {
        &self.macros
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// Compile everything left in the input.
    pub fn compile_all(&mut self) -> CompileResult<String> {
        let mut out = String::new();
        while let Some(token) = self.read_token()? {
            self.form_start = self.parser.token_start();
            trace!("compiling top-level form at {}: {}", self.form_start, token);
            let compiled = self.compile_token(&token)?;
            if !compiled.is_empty() {
                out.push_str(&compiled);
                out.push(';');
            }
        }
        out.push('\n');
        Ok(out)
    }

    fn read_token(&mut self) -> CompileResult<Option<Token>> {
        self.parser
            .read_token()
            .map_err(|source| CompileError::Syntax {
                position: self.parser.position(),
                source,
            })
    }

    /// Lower a single token.
    pub fn compile_token(&mut self, token: &Token) -> CompileResult<String> {
        if self.lowering_depth >= MAX_LOWERING_DEPTH {
            return Err(self.shape_error(token.kind(), "forms nested too deeply"));
        }
        self.lowering_depth += 1;
        let result = self.lower_token(token);
        self.lowering_depth -= 1;
        result
    }

    fn lower_token(&mut self, token: &Token) -> CompileResult<String> {
        match token {
            Token::Number(_) | Token::Symbol(_) | Token::Str(_) | Token::Regex { .. } => {
                Ok(builtins::atom(token))
            }
            Token::Array(items) => builtins::array(self, items),
            Token::Object(items) => builtins::object(self, items),
            Token::List(items) => self.compile_form(items),
        }
    }

    /// Lower each token and join the results.
    pub(crate) fn compile_seq(&mut self, tokens: &[Token], separator: &str) -> CompileResult<String> {
        let parts = tokens
            .iter()
            .map(|t| self.compile_token(t))
            .collect::<CompileResult<Vec<_>>>()?;
        Ok(parts.join(separator))
    }

    fn compile_form(&mut self, items: &[Token]) -> CompileResult<String> {
        let Some((head, args)) = items.split_first() else {
            return Err(self.shape_error("()", "empty form"));
        };
        if let Some(name) = head.as_symbol() {
            if let Some(expansion) = self.macros.expand(name, args) {
                let expanded = expansion.map_err(|e| CompileError::MacroExpansion {
                    position: self.form_start,
                    name: name.to_owned(),
                    message: e.to_string(),
                })?;
                return self.compile_expansion(name, &expanded);
            }
            match self.builtins.get(name).copied() {
                Some(Builtin::Form(lower)) => return lower(self, args),
                Some(Builtin::Infix(op)) => return builtins::infix(self, name, op, args),
                None => (),
            }
        }
        self.function_call(head, args)
    }

    fn compile_expansion(&mut self, name: &str, expanded: &Token) -> CompileResult<String> {
        if self.expansion_depth >= MAX_EXPANSION_DEPTH {
            return Err(CompileError::MacroExpansion {
                position: self.form_start,
                name: name.to_owned(),
                message: format!("expansion nested more than {MAX_EXPANSION_DEPTH} deep"),
            });
        }
        debug!("expanded macro {name} to {expanded}");
        self.expansion_depth += 1;
        let result = self.compile_token(expanded);
        self.expansion_depth -= 1;
        result
    }

    fn function_call(&mut self, head: &Token, args: &[Token]) -> CompileResult<String> {
        let callee = match head {
            Token::Symbol(s) => s.clone(),
            Token::List(_) => self.compile_token(head)?,
            other => {
                return Err(self.shape_error(
                    "function call",
                    format!("invalid function head: {}", other.kind()),
                ))
            }
        };
        Ok(format!("({callee}({}))", self.compile_seq(args, ",")?))
    }

    /// Check a form's argument count against its contract.
    pub(crate) fn verify_args(&self, form: &str, args: &[Token], arity: Arity) -> CompileResult<()> {
        let n = args.len();
        let message = if arity.max == Some(arity.min) && n != arity.min {
            format!("required exactly {} argument(s)", arity.min)
        } else if n < arity.min {
            "insufficient arguments".to_owned()
        } else if arity.max.is_some_and(|max| n > max) {
            "excessive arguments".to_owned()
        } else if arity.even && n % 2 != 0 {
            "arguments number must be even".to_owned()
        } else {
            return Ok(());
        };
        Err(CompileError::Arity {
            position: self.form_start,
            form: form.to_owned(),
            message,
        })
    }

    pub(crate) fn shape_error(&self, form: &str, message: impl Into<String>) -> CompileError {
        CompileError::Shape {
            position: self.form_start,
            form: form.to_owned(),
            message: message.into(),
        }
    }

    pub(crate) fn define_macro(&mut self, m: Macro) {
        debug!("defining macro {} ({} parameters)", m.name, m.params.len());
        if self.macros.define(m).is_some() {
            debug!("macro redefined");
        }
    }

    pub(crate) fn macro_error(&self, message: impl Into<String>) -> CompileError {
        CompileError::MacroDefinition {
            position: self.form_start,
            message: message.into(),
        }
    }
}
