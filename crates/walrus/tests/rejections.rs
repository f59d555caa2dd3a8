use walrus::{ConvertConfig, ConvertError, ErrorKind};

/// Assignment expressions in positions the language does not allow.
const INVALID: &[&str] = &[
    "y := 1",
    "y0 = y1 := 2",
    "dict(x = z := 3)",
    "def foo(answer = p := 42): pass",
    "def bar(answer: q := 24 = 5): pass",
    "(lambda: x := 1)",
    "[i := i+1 for i in range(5)]",
    "[[(j := j) for i in range(5)] for j in range(5)]",
    "[i := 0 for i, j in range(5)]",
    "[i+1 for i in (i := range(5))]",
    "[False and (i := 0) for i, j in range(5)]",
    "[i for i, j in range(5) if True or (j := 1)]",
    "[i+1 for i in (j := range(5))]",
    "[i+1 for i in range(2) for j in (k := range(5))]",
    "[i+1 for i in [j for j in (k := range(5))]]",
    "[i+1 for i in (lambda: (j := range(5)))()]",
    "class Example:\n    [(j := i) for i in range(5)]",
    "(a[i] := x)",
    "(a.b := c)",
    "(a(b) := c)",
    "(await a := x)",
    "(p: int := 1)",
    "(a, b, *c := (1, 2, 3))",
];

#[test]
fn invalid_positions_are_syntax_errors() {
    let config = ConvertConfig::default();
    for source in INVALID {
        match walrus::convert(source, &config) {
            Err(err) => assert_eq!(err.kind(), ErrorKind::SyntaxError, "{source:?} failed with {err}"),
            Ok(output) => panic!("{source:?} should be rejected, converted to:\n{output}"),
        }
    }
}

#[test]
fn syntax_errors_carry_a_location() {
    let err = walrus::convert("x = 1\nprint(y := )\n", &ConvertConfig::default()).unwrap_err();
    let location = err.location().expect("syntax errors have a location");
    assert_eq!(location.line, 2, "{err}");
    assert!(err.to_string().starts_with("SyntaxError at 2:"), "{err}");
}

#[test]
fn legality_errors_name_the_variable() {
    let err = walrus::convert("[i := 0 for i, j in range(5)]\n", &ConvertConfig::default()).unwrap_err();
    let ConvertError::Syntax { msg, location } = err else {
        panic!("expected a syntax error");
    };
    assert_eq!(msg, "assignment expression cannot rebind comprehension iteration variable 'i'");
    assert_eq!((location.line, location.column), (1, 2));
}

#[test]
fn lambdas_reading_comprehension_variables_are_refused() {
    let config = ConvertConfig::default();
    let err = walrus::convert("fs = [lambda: (y := i) for i in range(3)]\n", &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedError, "{err}");
    assert_eq!(err.location().map(|l| (l.line, l.column)), Some((1, 7)));

    let output = walrus::convert("fs = [lambda i: (y := i) for i in range(3)]\n", &config).unwrap();
    assert!(output.contains("fs = [_walrus_wrapper_lambda_"), "{output}");
}
