//! User-defined macros.
//!
//! A macro is a tree rewrite: its parameters bind to the *unlowered* argument tokens of a
//! call site, and its body is evaluated by a small interpreter over tokens to produce the
//! replacement token. The interpreter never runs target-language code.
//!
//! The body language:
//! -   Bound symbols are replaced by their values; other atoms evaluate to themselves.
//! -   `(quote x)` yields `x` untouched.
//! -   `(let name value ...)`, as a non-final body form, binds names for the rest of the body.
//! -   `(fail message ...)` rejects the call site.
//! -   `(if c then [else])` picks a branch if `c` is a constant, and is rebuilt otherwise.
//! -   `symbol?`, `number?`, `string?`, `form?` test the kind of a token.
//! -   `count`, `nth`, `first`, `rest` take forms apart; `list` builds a call form.
//! -   Arithmetic and comparisons fold when all operands are numbers.
//! -   Any other form is rebuilt from its evaluated parts.

use std::collections::HashMap;

use thiserror::Error;

use crate::reader::Token;

/// Why an expansion failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpandError {
    #[error("expected {want} argument(s), got {got}")]
    Arity { want: usize, got: usize },

    #[error("{0}")]
    Shape(String),

    #[error("rejected: {0}")]
    Rejected(String),
}

type Env = HashMap<String, Token>;

#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    pub name: String,
    pub params: Vec<String>,
    /// Never empty; the last form is the result.
    pub body: Vec<Token>,
}

impl Macro {
    /// Rewrite a call site's arguments into the replacement token.
    pub fn expand(&self, args: &[Token]) -> Result<Token, ExpandError> {
        if args.len() != self.params.len() {
            return Err(ExpandError::Arity {
                want: self.params.len(),
                got: args.len(),
            });
        }
        let mut env: Env = self
            .params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();

        let Some((result, statements)) = self.body.split_last() else {
            return Err(ExpandError::Shape("macro has no body".to_owned()));
        };
        for statement in statements {
            match statement {
                Token::List(items) if items.first().and_then(Token::as_symbol) == Some("let") => {
                    bind(&mut env, &items[1..])?;
                }
                _ => {
                    eval(statement, &env)?;
                }
            }
        }
        eval(result, &env)
    }
}

/// Macros registered so far, by name.
#[derive(Debug, Default)]
pub struct MacroRegistry {
    macros: HashMap<String, Macro>,
}

impl MacroRegistry {
    /// Register a macro, replacing (and returning) any previous one of the same name.
    pub fn define(&mut self, m: Macro) -> Option<Macro> {
        self.macros.insert(m.name.clone(), m)
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Expand a call to `name`, if `name` is a macro.
    pub fn expand(&self, name: &str, args: &[Token]) -> Option<Result<Token, ExpandError>> {
        self.get(name).map(|m| m.expand(args))
    }
}

fn bind(env: &mut Env, pairs: &[Token]) -> Result<(), ExpandError> {
    if pairs.is_empty() || pairs.len() % 2 != 0 {
        return Err(ExpandError::Shape(
            "let needs name / value pairs".to_owned(),
        ));
    }
    for pair in pairs.chunks_exact(2) {
        let name = pair[0]
            .as_symbol()
            .ok_or_else(|| ExpandError::Shape(format!("let: cannot bind to {}", pair[0])))?;
        let value = eval(&pair[1], env)?;
        env.insert(name.to_owned(), value);
    }
    Ok(())
}

fn eval_all(tokens: &[Token], env: &Env) -> Result<Vec<Token>, ExpandError> {
    tokens.iter().map(|t| eval(t, env)).collect()
}

fn eval(token: &Token, env: &Env) -> Result<Token, ExpandError> {
    match token {
        Token::Symbol(s) => Ok(env.get(s).cloned().unwrap_or_else(|| token.clone())),
        Token::Number(_) | Token::Str(_) | Token::Regex { .. } => Ok(token.clone()),
        Token::Array(items) => Ok(Token::Array(eval_all(items, env)?)),
        Token::Object(items) => Ok(Token::Object(eval_all(items, env)?)),
        Token::List(items) => eval_form(items, env),
    }
}

fn boolean(b: bool) -> Token {
    Token::symbol(if b { "true" } else { "false" })
}

/// Truth value of a constant; `None` if it can only be known at run time.
fn truthiness(token: &Token) -> Option<bool> {
    match token {
        Token::Number(n) => Some(*n != 0.0 && !n.is_nan()),
        Token::Str(s) => Some(!s.is_empty()),
        Token::Regex { .. } | Token::Array(_) | Token::Object(_) => Some(true),
        Token::Symbol(s) => match s.as_str() {
            "true" => Some(true),
            "false" | "null" | "undefined" | "NaN" => Some(false),
            _ => None,
        },
        Token::List(_) => None,
    }
}

fn want_args(name: &str, args: &[Token], min: usize, max: usize) -> Result<(), ExpandError> {
    if args.len() < min || args.len() > max {
        let want = if min == max {
            format!("{min}")
        } else {
            format!("{min} to {max}")
        };
        return Err(ExpandError::Shape(format!(
            "{name} takes {want} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

fn form_elements<'a>(name: &str, token: &'a Token) -> Result<&'a [Token], ExpandError> {
    token
        .elements()
        .ok_or_else(|| ExpandError::Shape(format!("{name}: {token} is not a form")))
}

fn numbers(tokens: &[Token]) -> Option<Vec<f64>> {
    tokens
        .iter()
        .map(|t| match t {
            Token::Number(n) => Some(*n),
            _ => None,
        })
        .collect()
}

/// Fold an arithmetic or comparison operator over constant operands.
fn fold(op: &str, args: &[Token]) -> Option<Token> {
    if args.len() < 2 {
        return None;
    }
    if let Some(ns) = numbers(args) {
        let arith = |f: fn(f64, f64) -> f64| ns[1..].iter().fold(ns[0], |acc, &n| f(acc, n));
        let compare = |f: fn(&f64, &f64) -> bool| ns.windows(2).all(|w| f(&w[0], &w[1]));
        return Some(match op {
            "+" => Token::Number(arith(|a, b| a + b)),
            "-" => Token::Number(arith(|a, b| a - b)),
            "*" => Token::Number(arith(|a, b| a * b)),
            "/" => Token::Number(arith(|a, b| a / b)),
            "%" => Token::Number(arith(|a, b| a % b)),
            "<" => boolean(compare(f64::lt)),
            ">" => boolean(compare(f64::gt)),
            "<=" => boolean(compare(f64::le)),
            ">=" => boolean(compare(f64::ge)),
            "=" | "same" => boolean(compare(f64::eq)),
            "!=" if ns.len() == 2 => boolean(ns[0] != ns[1]),
            _ => return None,
        });
    }
    match (op, args) {
        ("=" | "same", [Token::Str(a), Token::Str(b)]) => Some(boolean(a == b)),
        ("!=", [Token::Str(a), Token::Str(b)]) => Some(boolean(a != b)),
        _ => None,
    }
}

fn eval_form(items: &[Token], env: &Env) -> Result<Token, ExpandError> {
    let Some((head, args)) = items.split_first() else {
        return Ok(Token::List(Vec::new()));
    };
    let name = match head.as_symbol() {
        Some(name) if !env.contains_key(name) => name,
        _ => return Ok(Token::List(eval_all(items, env)?)),
    };

    match name {
        "quote" => Ok(match args {
            [one] => one.clone(),
            _ => Token::List(args.to_vec()),
        }),
        "fail" => {
            let message: Vec<String> = eval_all(args, env)?
                .into_iter()
                .map(|t| match t {
                    Token::Str(s) => s,
                    t => t.to_string(),
                })
                .collect();
            Err(ExpandError::Rejected(message.join(" ")))
        }
        "if" => {
            want_args(name, args, 2, 3)?;
            let condition = eval(&args[0], env)?;
            match truthiness(&condition) {
                Some(true) => eval(&args[1], env),
                Some(false) => match args.get(2) {
                    Some(otherwise) => eval(otherwise, env),
                    None => Ok(Token::symbol("null")),
                },
                None => {
                    let mut rebuilt = vec![head.clone(), condition];
                    rebuilt.extend(eval_all(&args[1..], env)?);
                    Ok(Token::List(rebuilt))
                }
            }
        }
        "symbol?" | "number?" | "string?" | "form?" => {
            want_args(name, args, 1, 1)?;
            let v = eval(&args[0], env)?;
            Ok(boolean(match name {
                "symbol?" => v.is_symbol(),
                "number?" => matches!(v, Token::Number(_)),
                "string?" => matches!(v, Token::Str(_)),
                _ => v.elements().is_some(),
            }))
        }
        "count" => {
            want_args(name, args, 1, 1)?;
            let v = eval(&args[0], env)?;
            Ok(Token::Number(form_elements(name, &v)?.len() as f64))
        }
        "nth" | "first" => {
            let arity = if name == "nth" { 2 } else { 1 };
            want_args(name, args, arity, arity)?;
            let v = eval(&args[0], env)?;
            let elements = form_elements(name, &v)?;
            let index = match args.get(1).map(|t| eval(t, env)).transpose()? {
                None => 0,
                Some(Token::Number(n)) if n >= 0.0 && n.fract() == 0.0 => n as usize,
                Some(other) => {
                    return Err(ExpandError::Shape(format!(
                        "{name}: index {other} is not a whole number"
                    )))
                }
            };
            elements.get(index).cloned().ok_or_else(|| {
                ExpandError::Shape(format!("{name}: index {index} out of range for {v}"))
            })
        }
        "rest" => {
            want_args(name, args, 1, 1)?;
            let v = eval(&args[0], env)?;
            let tail = form_elements(name, &v)?.get(1..).unwrap_or_default().to_vec();
            Ok(match v {
                Token::Array(_) => Token::Array(tail),
                Token::Object(_) => Token::Object(tail),
                _ => Token::List(tail),
            })
        }
        "list" => Ok(Token::List(eval_all(args, env)?)),
        _ => {
            let args = eval_all(args, env)?;
            if let Some(folded) = fold(name, &args) {
                return Ok(folded);
            }
            let mut rebuilt = Vec::with_capacity(args.len() + 1);
            rebuilt.push(head.clone());
            rebuilt.extend(args);
            Ok(Token::List(rebuilt))
        }
    }
}
