//! Tests for the built-in forms and macros.
use super::*;

fn compile(src: &str) -> CompileResult<String> {
    Compiler::from_text(src).compile_all()
}

/// Compile a single form, without the statement separator and trailing newline.
fn lower(src: &str) -> String {
    let out = compile(src).unwrap_or_else(|e| panic!("compiling {src:?}: {e}"));
    out.strip_suffix(";\n")
        .unwrap_or_else(|| panic!("unexpected output for {src:?}: {out:?}"))
        .to_owned()
}

fn arity_error(src: &str) -> String {
    match compile(src) {
        Err(CompileError::Arity { message, .. }) => message,
        v => panic!("expected arity error for {src:?}, got {v:?}"),
    }
}

fn shape_error(src: &str) -> String {
    match compile(src) {
        Err(CompileError::Shape { message, .. }) => message,
        v => panic!("expected shape error for {src:?}, got {v:?}"),
    }
}

#[test]
fn literals() {
    assert_eq!(lower("[1 2 (f x)]"), "[1,2,(f(x))]");
    assert_eq!(lower("[]"), "[]");
    assert_eq!(lower("(_arr 1 2)"), "[1,2]");
    assert_eq!(lower("{a 1 \"b c\" 2 3 [x]}"), "({a:1,\"b c\":2,3:[x]})");
    assert_eq!(lower("{}"), "({})");
    assert_eq!(lower("(_str hello world)"), "\"hello world\"");
    assert_eq!(lower("'single \"quoted\"'"), r#""single \"quoted\"""#);
    assert_eq!(lower(r#""tab\tand \"escapes\"""#), r#""tab\tand \"escapes\"""#);
}

#[test]
fn object_contracts() {
    assert_eq!(arity_error("{a 1 b}"), "arguments number must be even");
    assert_eq!(
        shape_error("{(f) 1}"),
        "key must be a symbol, string, or number"
    );
    assert_eq!(shape_error("{[a] 1}"), "key must be a symbol, string, or number");
}

#[test]
fn quote_serializes_source() {
    assert_eq!(lower("(quote (a b) [1 \"x\"])"), r#""(a b) [1 \"x\"]""#);
    assert_eq!(lower("(quote)"), r#""""#);
    assert_eq!(lower(r#"(quote "a\"b")"#), r#""\"a\\\"b\"""#);
}

#[test]
fn functions() {
    assert_eq!(
        lower("(fun (a b) (+ a b))"),
        "(function(a,b){return(a+b)})"
    );
    assert_eq!(
        lower("(fun () (f) (g) 1)"),
        "(function(){(f());(g());return 1})"
    );
    assert_eq!(lower("(fun (x) (nop))"), "(function(x){})");
    assert_eq!(lower("(lam (* _ 2))"), "(function(_){return(_*2)})");
    assert_eq!(lower("(closure (let a 1) a)"), "(function(){{var a=1};return a})()");
    assert_eq!(shape_error("(fun x 1)"), "invalid arguments list");
    assert_eq!(shape_error("(fun (a 1) 1)"), "invalid arguments list");
    assert_eq!(shape_error("(fun [a] 1)"), "invalid arguments list");
    assert_eq!(arity_error("(fun (a))"), "insufficient arguments");
    assert_eq!(arity_error("(lam)"), "insufficient arguments");
    assert_eq!(arity_error("(closure)"), "insufficient arguments");
}

#[test]
fn returns() {
    assert_eq!(lower("(ret 1)"), "{return 1}");
    assert_eq!(lower("(ifret (< a 0) 0)"), "{if((a<0))return 0}");
    assert_eq!(arity_error("(ret)"), "required exactly 1 argument(s)");
    assert_eq!(arity_error("(ret 1 2)"), "required exactly 1 argument(s)");
    assert_eq!(arity_error("(ifret a)"), "required exactly 2 argument(s)");
}

#[test]
fn conditionals() {
    assert_eq!(
        lower("(if (> a 1) (ret 1) (ret 0))"),
        "((a>1)?{return 1}:{return 0})"
    );
    assert_eq!(lower("(if (> a 1) (ret 1))"), "((a>1)?{return 1}:null)");
    assert_eq!(arity_error("(if a)"), "insufficient arguments");
    assert_eq!(arity_error("(if a b c d)"), "excessive arguments");
}

#[test]
fn cond_chain() {
    assert_eq!(
        lower("(cond (< a 0) (ret -1) (> a 0) (ret 1) (ret 0))"),
        "(function(){if((a<0)){{return -1}}else if((a>0)){{return 1}}else{{return 0}}})()"
    );
    assert_eq!(lower("(cond a (f))"), "(function(){if(a){(f())}})()");
    assert_eq!(arity_error("(cond a)"), "insufficient arguments");
}

#[test]
fn switch_chain() {
    assert_eq!(
        lower("(switch x 1 (f) \"b\" (g) (h))"),
        "(function(_){switch(_){case 1:(f());break;case \"b\":(g());break;default:(h())}})(x)"
    );
    assert_eq!(
        lower("(switch x 1 (f))"),
        "(function(_){switch(_){case 1:(f());break}})(x)"
    );
    assert_eq!(arity_error("(switch x 1)"), "insufficient arguments");
}

#[test]
fn loops() {
    assert_eq!(
        lower("(while (let i 0) (< i 10) (def i (+ i 1)))"),
        "(function(){{var i=0};while((i<10)){(i=(i+1))}})()"
    );
    assert_eq!(
        lower("(while outer: (nop) true (break outer) (f))"),
        "(function(){outer:while(true){{break outer}}(f())})()"
    );
    assert_eq!(
        lower("(iter obj (console.log key val))"),
        "(function(obj_){for(var key in obj_){var val=obj_[key];(console.log(key,val))}})(obj)"
    );
    assert_eq!(
        lower("(iter each: obj (continue each:) 1)"),
        "(function(obj_){each:for(var key in obj_){var val=obj_[key];{continue each}}return 1})(obj)"
    );
    assert_eq!(arity_error("(while a b)"), "insufficient arguments");
    assert_eq!(arity_error("(while l: a b)"), "insufficient arguments");
    assert_eq!(arity_error("(while a b c d e)"), "excessive arguments");
    assert_eq!(arity_error("(iter a)"), "insufficient arguments");
    assert_eq!(arity_error("(iter a b c d)"), "excessive arguments");
}

#[test]
fn jumps() {
    assert_eq!(lower("(break)"), "{break}");
    assert_eq!(lower("(continue)"), "{continue}");
    assert_eq!(lower("(break outer)"), "{break outer}");
    assert_eq!(arity_error("(break a b)"), "excessive arguments");
    assert_eq!(shape_error("(continue 1)"), "label must be a symbol");
}

#[test]
fn variables() {
    assert_eq!(lower("(def a 1)"), "(a=1)");
    assert_eq!(lower("(def a 1 b (+ a 1))"), "(a=1,b=(a+1))");
    assert_eq!(lower("(let a 1 b 2)"), "{var a=1,b=2}");
    assert_eq!(arity_error("(def a)"), "insufficient arguments");
    assert_eq!(arity_error("(def a 1 b)"), "arguments number must be even");
    assert_eq!(arity_error("(let a 1 b)"), "arguments number must be even");
    assert_eq!(shape_error("(let (f) 1)"), "names must be symbols");
}

#[test]
fn indexing() {
    assert_eq!(lower("(get a 1)"), "(a[1])");
    assert_eq!(lower("(get a \"b\" c)"), "(a[\"b\"][c])");
    assert_eq!(lower("(set a \"b\" \"c\" 3)"), "(a[\"b\"][\"c\"]=3)");
    assert_eq!(lower("(set a 0 (f))"), "(a[0]=(f()))");
    assert_eq!(arity_error("(get a)"), "insufficient arguments");
    assert_eq!(arity_error("(set a b)"), "insufficient arguments");
}

#[test]
fn members() {
    assert_eq!(
        lower("(. \"12345\" (replace \"1\" \"9\") (replace \"3\" \"7\"))"),
        "(\"12345\".replace(\"1\",\"9\").replace(\"3\",\"7\"))"
    );
    assert_eq!(lower("(. a b c)"), "(a.b.c)");
    assert_eq!(lower("(. a (get) length)"), "(a.get().length)");
    assert_eq!(lower("(. a 0 \"k\" [(f i)])"), "(a[0][\"k\"][(f(i))])");
    assert_eq!(lower("(. (f) x)"), "((f()).x)");
    assert_eq!(arity_error("(. a)"), "insufficient arguments");
    assert_eq!(
        shape_error("(. a (1 2))"),
        "method call must start with a symbol"
    );
    assert_eq!(
        shape_error("(. a [1 2])"),
        "member must be a symbol, a method call, a string, a number, or [index]"
    );
}

#[test]
fn objects() {
    assert_eq!(lower("(new Date)"), "(new Date())");
    assert_eq!(lower("(new Map [[1 2]])"), "(new Map([[1,2]]))");
    assert_eq!(shape_error("(new \"Date\")"), "first argument must be a symbol");
    assert_eq!(arity_error("(new)"), "insufficient arguments");
    assert_eq!(lower("(instanceof x Array)"), "(x instanceof Array)");
    assert_eq!(
        shape_error("(instanceof x (f))"),
        "second argument must be a symbol"
    );
}

#[test]
fn exceptions() {
    assert_eq!(
        lower("(try (f) (console.log _) (g))"),
        "(function(){try{(f())}catch(_){(console.log(_))}finally{(g())}})()"
    );
    assert_eq!(
        lower("(try (f) (nop))"),
        "(function(){try{(f())}catch(_){}})()"
    );
    assert_eq!(lower("(throw e)"), "{throw e}");
    assert_eq!(lower("(Error \"bad\")"), "{throw Error(\"bad\")}");
    assert_eq!(lower("(TypeError \"bad\" x)"), "{throw TypeError(\"bad\",x)}");
    assert_eq!(
        lower("(assert (> n 0) \"n must be positive\")"),
        "{if(!((n>0)))throw \"n must be positive\"}"
    );
    assert_eq!(arity_error("(try (f))"), "insufficient arguments");
    assert_eq!(arity_error("(throw)"), "required exactly 1 argument(s)");
    assert_eq!(arity_error("(Error)"), "insufficient arguments");
    assert_eq!(arity_error("(Error a b c d)"), "excessive arguments");
    assert_eq!(arity_error("(assert a)"), "required exactly 2 argument(s)");
}

#[test]
fn call_sugar() {
    assert_eq!(lower("(chain f (1 2) [3] (4))"), "(f(1,2)(3)(4))");
    assert_eq!(
        shape_error("(chain f 1)"),
        "all arguments after first must be lists"
    );
    assert_eq!(lower("(fapply x f g)"), "(g(f(x)))");
    assert_eq!(
        lower("(fapply 2 (lam (* _ 2)))"),
        "((function(_){return(_*2)})(2))"
    );
    assert_eq!(
        shape_error("(fapply x (f 1))"),
        "all arguments after first must be symbols or function objects"
    );
    assert_eq!(arity_error("(fapply x)"), "insufficient arguments");
    assert_eq!(
        lower("(args 0)"),
        "(arguments.length>0?arguments[0]:undefined)"
    );
}

#[test]
fn operators() {
    assert_eq!(lower("(+ 1 2 3)"), "(1+2+3)");
    assert_eq!(lower("(and a (or b c))"), "(a&&(b||c))");
    assert_eq!(lower("(= a 1)"), "(a==1)");
    assert_eq!(lower("(same a 1)"), "(a===1)");
    assert_eq!(lower("(+= a 1)"), "(a+=1)");
    assert_eq!(lower("(>>> a 2)"), "(a>>>2)");
    assert_eq!(lower("(do (f) (g))"), "((f()),(g()))");
    assert_eq!(lower("(/ a b)"), "(a/b)");
    assert_eq!(lower("(xor a b)"), "((!!a)^(!!b))");
    assert_eq!(lower("(neg x)"), "(-x)");
    assert_eq!(lower("(! x)"), "(! x)");
    assert_eq!(lower("(! (f))"), "(!(f()))");
    assert_eq!(lower("(block (f) (g))"), "{(f());(g())}");
    for op in ["+", "and", "<=", "do", "xor"] {
        assert_eq!(arity_error(&format!("({op} a)")), "insufficient arguments");
        // Boundary: two operands is fine.
        compile(&format!("({op} a b)")).unwrap();
    }
    assert_eq!(arity_error("(neg)"), "required exactly 1 argument(s)");
    assert_eq!(arity_error("(block)"), "insufficient arguments");
}

#[test]
fn nop_emits_nothing() {
    assert_eq!(compile("(nop) (nop a b)").unwrap(), "\n");
}

#[test]
fn empty_statements_are_dropped() {
    assert_eq!(
        compile("(fun (a) (ret (+ a 1)))").unwrap(),
        "(function(a){return {return(a+1)}});\n"
    );
    assert_eq!(lower("(fun () (nop) (f) (nop) 1)"), "(function(){(f());return 1})");
    assert_eq!(lower("(block (nop) (f) (nop))"), "{(f())}");
    assert_eq!(
        lower("(iter o (f) (+ a 1))"),
        "(function(obj_){for(var key in obj_){var val=obj_[key];(f())}return(a+1)})(o)"
    );
    assert_eq!(lower("(ifret a (f))"), "{if(a)return(f())}");
}

#[test]
fn literals_are_emitted_verbatim() {
    assert_eq!(
        lower(r#"(def s "x {; y ! (z) return (w;}")"#),
        r#"(s="x {; y ! (z) return (w;}")"#
    );
    assert_eq!(lower("(quote (! (f)))"), r#""(! (f))""#);
    assert_eq!(lower(r#"(quote "{;" ";}")"#), r#""\"{;\" \";}\"""#);
    assert_eq!(
        lower("(. s (replace /{;|;}/g \"\"))"),
        "(s.replace(/{;|;}/g,\"\"))"
    );
}

#[test]
fn negative_operands() {
    assert_eq!(lower("(- a -1)"), "(a- -1)");
    assert_eq!(lower("(+ a -1)"), "(a+-1)");
    assert_eq!(lower("(- -1 a)"), "(-1-a)");
    assert_eq!(lower("(-= a -1)"), "(a-=-1)");
    assert_eq!(lower("(neg -1)"), "(- -1)");
    assert_eq!(lower("(neg (neg x))"), "(-(-x))");
    assert_eq!(
        compile("(macro dec (x) (- x 1)) (- a (dec 0))").unwrap(),
        "(a- -1);\n"
    );
}

#[test]
fn arity_boundaries() {
    for (src, message) in [
        ("(args)", "required exactly 1 argument(s)"),
        ("(args 1 2)", "required exactly 1 argument(s)"),
        ("(instanceof x)", "required exactly 2 argument(s)"),
        ("(instanceof x A B)", "required exactly 2 argument(s)"),
        ("(!)", "required exactly 1 argument(s)"),
        ("(! a b)", "required exactly 1 argument(s)"),
        ("(chain f)", "insufficient arguments"),
        ("(try a)", "insufficient arguments"),
        ("(try a b c d)", "excessive arguments"),
        ("(neg a b)", "required exactly 1 argument(s)"),
        ("(assert a b c)", "required exactly 2 argument(s)"),
        ("(continue a b)", "excessive arguments"),
        ("(_obj a)", "arguments number must be even"),
        ("(_obj a 1 b)", "arguments number must be even"),
        ("(TypeError)", "insufficient arguments"),
        ("(TypeError a b c d)", "excessive arguments"),
        ("(ifret a b c)", "required exactly 2 argument(s)"),
        ("(throw a b)", "required exactly 1 argument(s)"),
        ("(switch x)", "insufficient arguments"),
        ("(new)", "insufficient arguments"),
        ("(. a)", "insufficient arguments"),
        ("(let)", "insufficient arguments"),
    ] {
        assert_eq!(arity_error(src), message, "for {src}");
    }

    for src in [
        "(args 0)",
        "(instanceof x A)",
        "(! a)",
        "(chain f (a))",
        "(try a b)",
        "(try a b c)",
        "(neg a)",
        "(assert a b)",
        "(continue)",
        "(continue a)",
        "(break a)",
        "(_obj)",
        "(_obj a 1)",
        "(Error a)",
        "(Error a b c)",
        "(TypeError a b c)",
        "(if a b)",
        "(if a b c)",
        "(cond a b)",
        "(switch x 1 (f))",
        "(while a b c)",
        "(while a b c d)",
        "(while l: a b c d)",
        "(iter a b)",
        "(iter a b c)",
        "(fun () a)",
        "(lam a)",
        "(closure a)",
        "(get a b)",
        "(set a b c)",
        "(def a 1)",
        "(let a 1)",
        "(new A)",
        "(. a b)",
        "(fapply x f)",
        "(xor a b)",
        "(block a)",
        "(nop)",
        "(_str)",
        "(_arr)",
        "(quote)",
        "(macro m () 1)",
    ] {
        if let Err(e) = compile(src) {
            panic!("{src} should compile: {e}");
        }
    }
}

#[test]
fn macro_grown_nesting_is_limited() {
    let src = r#"
        (macro deep (n x)
            (if (> n 0)
                (list (quote deep) (- n 1) (list (quote f) (list (quote f) (list (quote f) x))))
                x))
        (deep 40 1)
    "#;
    assert_eq!(shape_error(src), "forms nested too deeply");
}

#[test]
fn macro_expands_at_compile_time() {
    assert_eq!(
        compile("(macro double (x) (* x 2)) (double 5)").unwrap(),
        "10;\n"
    );
    assert_eq!(
        compile("(macro double (x) (* x 2)) (double y)").unwrap(),
        "(y*2);\n"
    );
}

#[test]
fn macro_used_before_definition_is_a_call() {
    assert_eq!(
        compile("(double 5) (macro double (x) (* x 2)) (double 5)").unwrap(),
        "(double(5));10;\n"
    );
}

#[test]
fn macro_shadows_builtins() {
    assert_eq!(
        compile("(ret 1) (macro ret (x) (list (quote throw) x)) (ret 1)").unwrap(),
        "{return 1};{throw 1};\n"
    );
}

#[test]
fn macro_rewrites_argument_shape() {
    let src = r#"
        (macro unless (c body) (list (quote if) (list (quote !) c) body))
        (macro swap (f) (list (nth f 0) (nth f 2) (nth f 1)))
        (unless ok (swap (- a b)))
    "#;
    assert_eq!(compile(src).unwrap(), "((! ok)?(b-a):null);\n");
}

#[test]
fn macro_expansions_nest() {
    let src = r#"
        (macro inc (x) (+ x 1))
        (macro twice (x) (list (quote inc) (list (quote inc) x)))
        (twice 1) (twice n)
    "#;
    assert_eq!(compile(src).unwrap(), "(2+1);((n+1)+1);\n");
}

#[test]
fn macro_can_reject_call_site() {
    let src = r#"
        (macro only-numbers (x) (if (number? x) x (fail "not a number:" x)))
        (only-numbers 2)
        (only-numbers "two")
    "#;
    match compile(src) {
        Err(CompileError::MacroExpansion { name, message, .. }) => {
            assert_eq!(name, "only-numbers");
            assert_eq!(message, "rejected: not a number: two");
        }
        v => panic!("unexpected result: {v:?}"),
    }
}

#[test]
fn macro_argument_count() {
    match compile("(macro pair (a b) [a b]) (pair 1)") {
        Err(CompileError::MacroExpansion { message, .. }) => {
            assert_eq!(message, "expected 2 argument(s), got 1")
        }
        v => panic!("unexpected result: {v:?}"),
    }
}

#[test]
fn recursive_macro_is_stopped() {
    match compile("(macro forever (x) (list (quote forever) x)) (forever 1)") {
        Err(CompileError::MacroExpansion { message, .. }) => {
            assert!(message.contains("nested"), "{message}")
        }
        v => panic!("unexpected result: {v:?}"),
    }
}

#[test]
fn malformed_macro_definitions() {
    for src in [
        "(macro)",
        "(macro m (x))",
        "(macro 1 (x) x)",
        "(macro m x x)",
        "(macro m [x] x)",
        "(macro m (x 1) x)",
        "(macro m (x x) x)",
    ] {
        match compile(src) {
            Err(CompileError::MacroDefinition { .. }) => (),
            v => panic!("expected macro definition error for {src:?}, got {v:?}"),
        }
    }
}

#[test]
fn macros_are_per_compiler() {
    let mut a = Compiler::from_text("(macro m () 1)");
    a.compile_all().unwrap();
    let mut b = Compiler::from_text("(m)");
    assert_eq!(b.compile_all().unwrap(), "(m());\n");
    a.set_reader(TextReader::new("(m)"));
    assert_eq!(a.compile_all().unwrap(), "1;\n");
}
