use pretty_assertions::assert_eq;
use walrus::{
    ConvertConfig, ConvertError, Converter, ErrorKind, Indentation, LineSeparator, RecordingTracer, SourceVersion,
    TraceEvent, UidGenerator, scope::ScopeKeyword,
};

fn convert_with(source: &str, config: ConvertConfig) -> String {
    Converter::new(config)
        .with_uids(UidGenerator::sequential())
        .convert(source)
        .unwrap()
}

fn convert(source: &str) -> String {
    convert_with(source, ConvertConfig::default())
}

#[test]
fn source_without_assignment_expressions_is_unchanged() {
    let source = "import os\r\n\nx = [y for y in range(3)]  # comment\nclass A:\n    def f(self): return f'{self}'\n";
    let config = ConvertConfig::default();
    assert_eq!(walrus::convert(source, &config).unwrap(), source);
    assert_eq!(walrus::convert("", &config).unwrap(), "");
}

#[test]
fn class_body_statement_keeps_its_position() {
    assert_eq!(
        convert("class A: print(x := 1)\n"),
        "class A: print((__import__('builtins').locals().__setitem__('x', 1), x)[1])\n"
    );
}

#[test]
fn class_members_share_one_slot() {
    let source = "class A:\n    a = (__x := 1)\n    b = (__x := 2)\n";
    let mut converter = Converter::new(ConvertConfig::default())
        .with_uids(UidGenerator::sequential())
        .with_tracer(RecordingTracer::new());
    let output = converter.convert(source).unwrap();
    assert!(output.contains("__setitem__('_A__x', 1)"), "{output}");
    assert!(output.contains("__setitem__('_A__x', 2)"), "{output}");
    let slots: Vec<_> = converter
        .tracer()
        .events()
        .iter()
        .filter(|event| matches!(event, TraceEvent::ClassSlot { .. }))
        .collect();
    assert_eq!(
        slots,
        [&TraceEvent::ClassSlot {
            class_name: "A".to_owned(),
            name: "_A__x".to_owned(),
            uid: "0".to_owned(),
        }],
        "a member name gets a single slot"
    );
}

#[test]
fn methods_bind_in_their_own_scope() {
    let output = convert("class A:\n    def m(self):\n        return (v := self.x)\n");
    assert!(output.contains("            nonlocal v\n"), "{output}");
    assert!(output.contains("        if False:\n            v = NotImplemented\n"), "{output}");
    assert!(!output.contains("__setitem__"), "method bodies do not use class storage:\n{output}");
}

#[test]
fn wrappers_sorted_by_name() {
    let output = convert("print((b := 1), (a := 2), (c := 3))\n");
    let a = output.find("def _walrus_wrapper_a_1").unwrap();
    let b = output.find("def _walrus_wrapper_b_0").unwrap();
    let c = output.find("def _walrus_wrapper_c_2").unwrap();
    assert!(a < b && b < c, "{output}");
    assert!(output.starts_with("if False:\n    b = NotImplemented\n    a = NotImplemented\n    c = NotImplemented\n"));
}

#[test]
fn repeated_name_binds_once() {
    let output = convert("while (n := n - 1) and (n := n):\n    pass\n");
    assert_eq!(output.matches("n = NotImplemented").count(), 1, "{output}");
    assert!(output.contains("def _walrus_wrapper_n_0(expr)"));
    assert!(output.contains("def _walrus_wrapper_n_1(expr)"));
}

#[test]
fn wrapper_parameter_avoids_target_name() {
    let output = convert("print(expr := 1)\n");
    assert!(output.contains("def _walrus_wrapper_expr_0(value):\n"), "{output}");
    assert!(output.contains("    expr = value\n"), "{output}");
}

#[test]
fn random_identifiers_are_unique() {
    let mut converter = Converter::new(ConvertConfig::default());
    let output = converter.convert("print((x := 1), (x := 2), (y := 3))\n").unwrap();
    let mut names: Vec<&str> = output
        .lines()
        .filter_map(|line| line.strip_prefix("def "))
        .map(|line| line.split('(').next().unwrap())
        .collect();
    assert_eq!(names.len(), 3);
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), 3, "wrapper names must not repeat: {names:?}");
}

#[test]
fn crlf_and_tab_layout() {
    let config = ConvertConfig::new()
        .linesep(LineSeparator::CrLf)
        .indentation(Indentation::tab());
    assert_eq!(
        convert_with("x = 1\r\nprint(y := x)\r\n", config),
        "x = 1\r\n\
         if False:\r\n\
         \ty = NotImplemented\r\n\
         \r\n\
         \r\n\
         def _walrus_wrapper_y_0(expr):\r\n\
         \t\"\"\"Wrapper function for assignment expression.\"\"\"\r\n\
         \tglobal y\r\n\
         \ty = expr\r\n\
         \treturn y\r\n\
         \r\n\
         \r\n\
         print(_walrus_wrapper_y_0(x))\r\n"
    );
}

#[test]
fn pep8_padding_can_be_disabled() {
    let config = ConvertConfig::new().pep8(false);
    assert_eq!(
        convert_with("while (chunk := source.read(2)):\n    use(chunk)\n", config),
        "if False:\n    chunk = NotImplemented\n\
         def _walrus_wrapper_chunk_0(expr):\n\
         \x20   \"\"\"Wrapper function for assignment expression.\"\"\"\n\
         \x20   global chunk\n\
         \x20   chunk = expr\n\
         \x20   return chunk\n\
         while (_walrus_wrapper_chunk_0(source.read(2))):\n    use(chunk)\n"
    );
}

#[test]
fn lambda_in_function_uses_nonlocal() {
    let output = convert("def make():\n    return lambda: (hits := 1)\n");
    assert!(output.contains("    def _walrus_wrapper_lambda_0():\n"), "{output}");
    assert!(output.contains("            nonlocal hits\n"), "{output}");
    assert!(output.contains("        return _walrus_wrapper_hits_1(1)\n"), "{output}");
    assert!(output.ends_with("    return _walrus_wrapper_lambda_0\n"), "{output}");
}

#[test]
fn nested_fstring_in_function() {
    let output = convert("def show(items):\n    return f'{(count := len(items))!r:>4} items, {count}'\n");
    assert!(
        output.contains("    return '{!r:>4} items, {}'.format((_walrus_wrapper_count_0(len(items))), (count))\n"),
        "{output}"
    );
    assert!(output.contains("        nonlocal count\n"), "{output}");
}

#[test]
fn same_line_nonlocal_precedes_binding() {
    let output = convert(
        "def outer():\n    x = 0\n    def inner():\n        nonlocal x; return (x := x + 1)\n    return inner\n",
    );
    assert!(
        output.contains("        nonlocal x\n        if False:\n            x = NotImplemented\n"),
        "{output}"
    );
    assert!(output.contains("        return (_walrus_wrapper_x_0(x + 1))\n"), "{output}");
}

#[test]
fn inline_body_with_declaration_moves_off_header() {
    assert_eq!(
        convert("if flag: global y; print(y := 2)\n"),
        "if flag:\n\
         \x20   global y\n\
         \x20   if False:\n\
         \x20       y = NotImplemented\n\
         \n\
         \x20   def _walrus_wrapper_y_0(expr):\n\
         \x20       \"\"\"Wrapper function for assignment expression.\"\"\"\n\
         \x20       global y\n\
         \x20       y = expr\n\
         \x20       return y\n\
         \n\
         \x20   print(_walrus_wrapper_y_0(2))\n"
    );
}

#[test]
fn class_nonlocal_goes_through_wrapper() {
    let source = "def outer():\n    count = 0\n    class Counter:\n        nonlocal count\n        first = (count := 1)\n\
                  \x20   return count\n";
    let output = convert(source);
    assert!(
        output.contains("            nonlocal count\n            count = expr\n"),
        "{output}"
    );
    assert!(output.contains("        first = (_walrus_wrapper_count_0(1))\n"), "{output}");
    assert!(!output.contains("__setitem__"), "{output}");
}

#[test]
fn each_run_is_reproducible() {
    let mut converter = Converter::new(ConvertConfig::default()).with_uids(UidGenerator::sequential());
    let first = converter.convert("print(a := 1)\n").unwrap();
    let second = converter.convert("print(a := 1)\n").unwrap();
    assert_eq!(first, second);
    assert!(second.contains("_walrus_wrapper_a_0(1)"), "{second}");
}

#[test]
fn tracer_reports_emission() {
    let mut converter = Converter::new(ConvertConfig::default())
        .with_uids(UidGenerator::sequential())
        .with_tracer(RecordingTracer::new());
    converter.convert("while (chunk := source.read(2)):\n    use(chunk)\n").unwrap();
    assert_eq!(
        converter.into_tracer().into_events(),
        [
            TraceEvent::EnterContext { kind: "block", level: 0 },
            TraceEvent::Wrapper {
                name: "chunk".to_owned(),
                uid: "0".to_owned(),
                keyword: ScopeKeyword::Global,
            },
            TraceEvent::Emit {
                bindings: 1,
                functions: 1,
                lambdas: 0,
            },
        ]
    );
}

#[test]
fn invalid_configuration_is_rejected_before_parsing() {
    let mut config = ConvertConfig::default();
    config.version = SourceVersion::new(4, 0);
    let err = walrus::convert("x = (", &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
    assert!(matches!(err, ConvertError::Configuration(_)));
}

#[test]
fn older_grammar_rejects_the_construct() {
    let config = ConvertConfig::new().version(SourceVersion::new(3, 7));
    let err = walrus::convert("print(x := 1)\n", &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyntaxError, "{err}");
}
