//! Built-in forms.
//!
//! Each built-in receives its argument tokens unlowered, checks its own contract,
//! and lowers the arguments it needs.

use crate::error::CompileResult;
use crate::reader::{format_number, quote_string, Token};

use super::{Compiler, Macro};

/// Lowers a built-in form, given its (unlowered) arguments.
pub type BuiltinFn = fn(&mut Compiler, &[Token]) -> CompileResult<String>;

/// An argument-count contract.
#[derive(Debug, Clone, Copy)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
    pub even: bool,
}

const fn exactly(n: usize) -> Arity {
    between(n, n)
}

const fn between(min: usize, max: usize) -> Arity {
    Arity {
        min,
        max: Some(max),
        even: false,
    }
}

const fn at_least(min: usize) -> Arity {
    Arity {
        min,
        max: None,
        even: false,
    }
}

const fn even_at_least(min: usize) -> Arity {
    Arity {
        min,
        max: None,
        even: true,
    }
}

pub const BUILTINS: &[(&str, BuiltinFn)] = &[
    // Literals.
    ("_str", builtin_str),
    ("_arr", array),
    ("_obj", object),
    ("quote", builtin_quote),
    // Functions.
    ("fun", builtin_fun),
    ("lam", builtin_lam),
    ("closure", builtin_closure),
    ("ret", builtin_ret),
    ("ifret", builtin_ifret),
    ("args", builtin_args),
    ("chain", builtin_chain),
    ("fapply", builtin_fapply),
    // Variables and members.
    ("def", builtin_def),
    ("let", builtin_let),
    ("get", builtin_get),
    ("set", builtin_set),
    (".", builtin_dot),
    ("new", builtin_new),
    ("instanceof", builtin_instanceof),
    // Control flow.
    ("if", builtin_if),
    ("cond", builtin_cond),
    ("switch", builtin_switch),
    ("while", builtin_while),
    ("iter", builtin_iter),
    ("continue", builtin_continue),
    ("break", builtin_break),
    ("block", builtin_block),
    ("nop", builtin_nop),
    // Exceptions.
    ("try", builtin_try),
    ("throw", builtin_throw),
    ("Error", builtin_error),
    ("TypeError", builtin_type_error),
    ("assert", builtin_assert),
    // Operators that aren't simple infix.
    ("xor", builtin_xor),
    ("neg", builtin_neg),
    ("!", builtin_not),
    // Compile-time.
    ("macro", builtin_macro),
];

/// Lower a non-form token.
pub fn atom(token: &Token) -> String {
    match token {
        Token::Number(n) => format_number(*n),
        Token::Symbol(s) => s.clone(),
        Token::Str(s) => quote_string(s),
        Token::Regex { pattern, flags } => format!("/{pattern}/{flags}"),
        other => other.to_string(),
    }
}

/// `(op a b c)` -> `(a op b op c)`
pub fn infix(c: &mut Compiler, name: &str, op: &str, args: &[Token]) -> CompileResult<String> {
    c.verify_args(name, args, at_least(2))?;
    let mut out = format!("({}", c.compile_token(&args[0])?);
    for operand in &args[1..] {
        out.push_str(&adjoin(op, &c.compile_token(operand)?));
    }
    out.push(')');
    Ok(out)
}

/// `op` directly followed by `operand`, unless the two would run together into
/// another operator (`a- -1`, not `a--1`).
fn adjoin(op: &str, operand: &str) -> String {
    match (op.chars().last(), operand.chars().next()) {
        (Some(a), Some(b)) if a == b && matches!(a, '+' | '-') => format!("{op} {operand}"),
        _ => format!("{op}{operand}"),
    }
}

/// `keyword value`, without the space before a parenthesized value.
fn prefixed(keyword: &str, value: &str) -> String {
    if value.starts_with('(') {
        format!("{keyword}{value}")
    } else {
        format!("{keyword} {value}")
    }
}

/// Lower each token as a statement, dropping those that lower to nothing.
fn statements(c: &mut Compiler, tokens: &[Token]) -> CompileResult<String> {
    let mut parts = Vec::with_capacity(tokens.len());
    for token in tokens {
        let part = c.compile_token(token)?;
        if !part.is_empty() {
            parts.push(part);
        }
    }
    Ok(parts.join(";"))
}

/// `[a b]` -> `[a,b]`
pub fn array(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    Ok(format!("[{}]", c.compile_seq(args, ",")?))
}

/// `{k v}` -> `({k:v})`
pub fn object(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("_obj", args, even_at_least(0))?;
    let mut entries = Vec::with_capacity(args.len() / 2);
    for pair in args.chunks_exact(2) {
        if !matches!(pair[0], Token::Symbol(_) | Token::Str(_) | Token::Number(_)) {
            return Err(c.shape_error("_obj", "key must be a symbol, string, or number"));
        }
        entries.push(format!(
            "{}:{}",
            c.compile_token(&pair[0])?,
            c.compile_token(&pair[1])?
        ));
    }
    Ok(format!("({{{}}})", entries.join(",")))
}

fn builtin_str(_c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    let words: Vec<String> = args.iter().map(Token::to_string).collect();
    Ok(quote_string(&words.join(" ")))
}

/// The arguments, in source notation, as a string literal.
fn builtin_quote(_c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    let text: Vec<String> = args.iter().map(Token::to_string).collect();
    let text = text.join(" ");
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out.push('"');
    Ok(out)
}

/// Statements, then `return` of the last form (if it lowers to anything).
fn function_body(c: &mut Compiler, body: &[Token]) -> CompileResult<String> {
    let Some((last, leading)) = body.split_last() else {
        return Ok(String::new());
    };
    let mut out = statements(c, leading)?;
    let result = c.compile_token(last)?;
    if !result.is_empty() {
        if !out.is_empty() {
            out.push(';');
        }
        out.push_str(&prefixed("return", &result));
    }
    Ok(out)
}

fn parameter_names<'a>(c: &Compiler, form: &str, token: &'a Token) -> CompileResult<Vec<&'a str>> {
    let invalid = || c.shape_error(form, "invalid arguments list");
    let Token::List(items) = token else {
        return Err(invalid());
    };
    items
        .iter()
        .map(|t| t.as_symbol().ok_or_else(invalid))
        .collect()
}

/// `(fun (a b) body... result)`
fn builtin_fun(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("fun", args, at_least(2))?;
    let params = parameter_names(c, "fun", &args[0])?.join(",");
    let body = function_body(c, &args[1..])?;
    Ok(format!("(function({params}){{{body}}})"))
}

/// `(lam body... result)`, with the single parameter `_`.
fn builtin_lam(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("lam", args, at_least(1))?;
    let body = function_body(c, args)?;
    Ok(format!("(function(_){{{body}}})"))
}

/// `(closure body... result)`: a function called on the spot, for a private scope.
fn builtin_closure(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("closure", args, at_least(1))?;
    let body = function_body(c, args)?;
    Ok(format!("(function(){{{body}}})()"))
}

fn builtin_ret(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("ret", args, exactly(1))?;
    let value = c.compile_token(&args[0])?;
    Ok(format!("{{{}}}", prefixed("return", &value)))
}

fn builtin_ifret(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("ifret", args, exactly(2))?;
    let condition = c.compile_token(&args[0])?;
    let value = c.compile_token(&args[1])?;
    Ok(format!("{{if({condition}){}}}", prefixed("return", &value)))
}

/// Access to the variadic arguments of the enclosing function.
fn builtin_args(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("args", args, exactly(1))?;
    let index = c.compile_token(&args[0])?;
    Ok(format!(
        "(arguments.length>{index}?arguments[{index}]:undefined)"
    ))
}

/// `(chain f (a) (b c))` -> `(f(a)(b,c))`
fn builtin_chain(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("chain", args, at_least(2))?;
    let mut out = format!("({}", c.compile_token(&args[0])?);
    for group in &args[1..] {
        let items = match group {
            Token::List(items) | Token::Array(items) => items,
            _ => {
                return Err(c.shape_error("chain", "all arguments after first must be lists"))
            }
        };
        out.push('(');
        out.push_str(&c.compile_seq(items, ",")?);
        out.push(')');
    }
    out.push(')');
    Ok(out)
}

/// `(fapply x f g)` -> `(g(f(x)))`
fn builtin_fapply(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("fapply", args, at_least(2))?;
    let mut out = format!("({})", c.compile_token(&args[0])?);
    for f in &args[1..] {
        let functional = match f {
            Token::Symbol(_) => true,
            Token::List(items) => matches!(
                items.first().and_then(Token::as_symbol),
                Some("fun" | "lam")
            ),
            _ => false,
        };
        if !functional {
            return Err(c.shape_error(
                "fapply",
                "all arguments after first must be symbols or function objects",
            ));
        }
        out = format!("({}{out})", c.compile_token(f)?);
    }
    Ok(out)
}

fn assignments(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    let mut parts = Vec::with_capacity(args.len() / 2);
    for pair in args.chunks_exact(2) {
        parts.push(format!(
            "{}={}",
            c.compile_token(&pair[0])?,
            c.compile_token(&pair[1])?
        ));
    }
    Ok(parts.join(","))
}

/// `(def a 1 b 2)` -> `(a=1,b=2)`
fn builtin_def(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("def", args, even_at_least(2))?;
    Ok(format!("({})", assignments(c, args)?))
}

/// `(let a 1 b 2)` -> `{var a=1,b=2}`
fn builtin_let(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("let", args, even_at_least(2))?;
    if args.iter().step_by(2).any(|name| !name.is_symbol()) {
        return Err(c.shape_error("let", "names must be symbols"));
    }
    Ok(format!("{{var {}}}", assignments(c, args)?))
}

fn indices(c: &mut Compiler, keys: &[Token]) -> CompileResult<String> {
    Ok(format!("[{}]", c.compile_seq(keys, "][")?))
}

/// `(get o k1 k2)` -> `(o[k1][k2])`
fn builtin_get(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("get", args, at_least(2))?;
    let target = c.compile_token(&args[0])?;
    Ok(format!("({target}{})", indices(c, &args[1..])?))
}

/// `(set o k1 k2 v)` -> `(o[k1][k2]=v)`
fn builtin_set(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("set", args, at_least(3))?;
    let (value, path) = (&args[args.len() - 1], &args[..args.len() - 1]);
    let target = c.compile_token(&path[0])?;
    let keys = indices(c, &path[1..])?;
    Ok(format!("({target}{keys}={})", c.compile_token(value)?))
}

/// `(. o a (m 1) "k" [i])` -> `(o.a.m(1)["k"][i])`
fn builtin_dot(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args(".", args, at_least(2))?;
    let mut out = format!("({}", c.compile_token(&args[0])?);
    for member in &args[1..] {
        match member {
            Token::Symbol(name) => {
                out.push('.');
                out.push_str(name);
            }
            Token::List(items) => {
                let Some(name) = items.first().and_then(Token::as_symbol) else {
                    return Err(c.shape_error(".", "method call must start with a symbol"));
                };
                out.push('.');
                out.push_str(name);
                out.push('(');
                out.push_str(&c.compile_seq(&items[1..], ",")?);
                out.push(')');
            }
            Token::Str(_) | Token::Number(_) => {
                out.push('[');
                out.push_str(&c.compile_token(member)?);
                out.push(']');
            }
            Token::Array(items) if items.len() == 1 => {
                out.push('[');
                out.push_str(&c.compile_token(&items[0])?);
                out.push(']');
            }
            _ => {
                return Err(c.shape_error(
                    ".",
                    "member must be a symbol, a method call, a string, a number, or [index]",
                ))
            }
        }
    }
    out.push(')');
    Ok(out)
}

fn builtin_new(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("new", args, at_least(1))?;
    let Some(class) = args[0].as_symbol() else {
        return Err(c.shape_error("new", "first argument must be a symbol"));
    };
    Ok(format!("(new {class}({}))", c.compile_seq(&args[1..], ",")?))
}

fn builtin_instanceof(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("instanceof", args, exactly(2))?;
    if !args[1].is_symbol() {
        return Err(c.shape_error("instanceof", "second argument must be a symbol"));
    }
    Ok(format!(
        "({} instanceof {})",
        c.compile_token(&args[0])?,
        c.compile_token(&args[1])?
    ))
}

/// `(if c t [f])` -> `(c?t:f)`
fn builtin_if(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("if", args, between(2, 3))?;
    let condition = c.compile_token(&args[0])?;
    let then = c.compile_token(&args[1])?;
    let otherwise = match args.get(2) {
        Some(f) => c.compile_token(f)?,
        None => "null".to_owned(),
    };
    Ok(format!("({condition}?{then}:{otherwise})"))
}

/// `(cond c1 b1 c2 b2 [default])`
fn builtin_cond(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("cond", args, at_least(2))?;
    let mut out = "(function(){".to_owned();
    let branches = args.chunks_exact(2);
    let default = branches.remainder();
    for (i, branch) in branches.enumerate() {
        out.push_str(if i > 0 { "else if(" } else { "if(" });
        out.push_str(&c.compile_token(&branch[0])?);
        out.push_str("){");
        out.push_str(&c.compile_token(&branch[1])?);
        out.push('}');
    }
    if let [default] = default {
        out.push_str("else{");
        out.push_str(&c.compile_token(default)?);
        out.push('}');
    }
    out.push_str("})()");
    Ok(out)
}

/// `(switch x v1 b1 v2 b2 [default])`
fn builtin_switch(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("switch", args, at_least(3))?;
    let subject = c.compile_token(&args[0])?;
    let cases = args[1..].chunks_exact(2);
    let default = cases.remainder();
    let mut clauses = Vec::with_capacity(args.len() / 2);
    for case in cases {
        let value = c.compile_token(&case[0])?;
        let body = c.compile_token(&case[1])?;
        clauses.push(format!("case {value}:{body};break"));
    }
    if let [default] = default {
        clauses.push(format!("default:{}", c.compile_token(default)?));
    }
    Ok(format!(
        "(function(_){{switch(_){{{}}}}})({subject})",
        clauses.join(";")
    ))
}

/// Split off a leading `label:` symbol.
fn split_label(args: &[Token]) -> (Option<&str>, &[Token]) {
    match args.split_first() {
        Some((Token::Symbol(s), rest)) if s.len() > 1 && s.ends_with(':') => (Some(s), rest),
        _ => (None, args),
    }
}

/// `(while [label:] init cond body [after])`
fn builtin_while(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    let (label, args) = split_label(args);
    c.verify_args("while", args, between(3, 4))?;
    let init = c.compile_token(&args[0])?;
    let condition = c.compile_token(&args[1])?;
    let body = c.compile_token(&args[2])?;
    let after = match args.get(3) {
        Some(after) => c.compile_token(after)?,
        None => String::new(),
    };
    let setup = if init.is_empty() { init } else { init + ";" };
    Ok(format!(
        "(function(){{{setup}{}while({condition}){{{body}}}{after}}})()",
        label.unwrap_or_default()
    ))
}

/// `(iter [label:] obj body [result])`, binding `key` and `val` for each member.
fn builtin_iter(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    let (label, args) = split_label(args);
    c.verify_args("iter", args, between(2, 3))?;
    let object = c.compile_token(&args[0])?;
    let body = c.compile_token(&args[1])?;
    let result = match args.get(2) {
        Some(result) => prefixed("return", &c.compile_token(result)?),
        None => String::new(),
    };
    Ok(format!(
        "(function(obj_){{{}for(var key in obj_){{var val=obj_[key];{body}}}{result}}})({object})",
        label.unwrap_or_default()
    ))
}

fn jump(c: &mut Compiler, keyword: &str, args: &[Token]) -> CompileResult<String> {
    c.verify_args(keyword, args, between(0, 1))?;
    match args.first() {
        None => Ok(format!("{{{keyword}}}")),
        Some(Token::Symbol(label)) => Ok(format!(
            "{{{keyword} {}}}",
            label.strip_suffix(':').unwrap_or(label)
        )),
        Some(_) => Err(c.shape_error(keyword, "label must be a symbol")),
    }
}

fn builtin_continue(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    jump(c, "continue", args)
}

fn builtin_break(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    jump(c, "break", args)
}

fn builtin_block(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("block", args, at_least(1))?;
    Ok(format!("{{{}}}", statements(c, args)?))
}

fn builtin_nop(_c: &mut Compiler, _args: &[Token]) -> CompileResult<String> {
    Ok(String::new())
}

/// `(try body catch [finally])`; the exception is bound to `_` in `catch`.
fn builtin_try(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("try", args, between(2, 3))?;
    let body = c.compile_token(&args[0])?;
    let catch = c.compile_token(&args[1])?;
    let finally = match args.get(2) {
        Some(f) => format!("finally{{{}}}", c.compile_token(f)?),
        None => String::new(),
    };
    Ok(format!(
        "(function(){{try{{{body}}}catch(_){{{catch}}}{finally}}})()"
    ))
}

fn builtin_throw(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("throw", args, exactly(1))?;
    Ok(format!("{{throw {}}}", c.compile_token(&args[0])?))
}

fn throw_constructed(c: &mut Compiler, class: &str, args: &[Token]) -> CompileResult<String> {
    c.verify_args(class, args, between(1, 3))?;
    Ok(format!("{{throw {class}({})}}", c.compile_seq(args, ",")?))
}

fn builtin_error(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    throw_constructed(c, "Error", args)
}

fn builtin_type_error(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    throw_constructed(c, "TypeError", args)
}

fn builtin_assert(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("assert", args, exactly(2))?;
    Ok(format!(
        "{{if(!({}))throw {}}}",
        c.compile_token(&args[0])?,
        c.compile_token(&args[1])?
    ))
}

/// `(xor a b)` -> `((!!a)^(!!b))`
fn builtin_xor(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("xor", args, at_least(2))?;
    let operands = args
        .iter()
        .map(|a| Ok(format!("(!!{})", c.compile_token(a)?)))
        .collect::<CompileResult<Vec<_>>>()?;
    Ok(format!("({})", operands.join("^")))
}

fn builtin_neg(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("neg", args, exactly(1))?;
    Ok(format!("({})", adjoin("-", &c.compile_token(&args[0])?)))
}

fn builtin_not(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    c.verify_args("!", args, exactly(1))?;
    Ok(format!("({})", prefixed("!", &c.compile_token(&args[0])?)))
}

/// `(macro name (params...) body... result)`
///
/// Registers the macro for all following forms; lowers to nothing.
fn builtin_macro(c: &mut Compiler, args: &[Token]) -> CompileResult<String> {
    if args.len() < 3 {
        return Err(c.macro_error("requires a name, a parameter list, and a body"));
    }
    let Some(name) = args[0].as_symbol() else {
        return Err(c.macro_error(format!("name must be a symbol, not {}", args[0].kind())));
    };
    let Token::List(params) = &args[1] else {
        return Err(c.macro_error(format!("{name}: parameters must be a ( ) list")));
    };
    let mut names: Vec<String> = Vec::with_capacity(params.len());
    for param in params {
        let Some(param) = param.as_symbol() else {
            return Err(c.macro_error(format!("{name}: parameter {param} is not a symbol")));
        };
        if names.iter().any(|n| n == param) {
            return Err(c.macro_error(format!("{name}: duplicate parameter {param}")));
        }
        names.push(param.to_owned());
    }
    c.define_macro(Macro {
        name: name.to_owned(),
        params: names,
        body: args[2..].to_vec(),
    });
    Ok(String::new())
}
