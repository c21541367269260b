//! Infix operators: form name to target-language spelling.
//!
//! Each entry becomes a built-in that joins two or more lowered operands with the operator.

pub const INFIX_OPERATORS: &[(&str, &str)] = &[
    // Boolean and equality.
    ("and", "&&"),
    ("or", "||"),
    ("=", "=="),
    ("same", "==="),
    ("!=", "!="),
    // Arithmetic.
    ("+", "+"),
    ("-", "-"),
    ("*", "*"),
    ("/", "/"),
    ("%", "%"),
    // Compound assignment. Only meaningful with two operands.
    ("+=", "+="),
    ("-=", "-="),
    ("*=", "*="),
    ("/=", "/="),
    ("%=", "%="),
    // Comparison.
    ("<", "<"),
    (">", ">"),
    ("<=", "<="),
    (">=", ">="),
    // Bitwise.
    ("<<", "<<"),
    (">>", ">>"),
    (">>>", ">>>"),
    ("&", "&"),
    ("|", "|"),
    ("^", "^"),
    // Sequencing.
    ("do", ","),
];
