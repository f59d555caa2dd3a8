//! Text of the code the converter synthesizes.

use crate::scope::ScopeKeyword;

const WRAPPER_PREFIX: &str = "_walrus_wrapper";
const WRAPPER_DOCSTRING: &str = "\"\"\"Wrapper function for assignment expression.\"\"\"";
const LAMBDA_DOCSTRING: &str = "\"\"\"Wrapper function for lambda definitions.\"\"\"";

/// Indentation and newline used for one block of inserted code.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout<'a> {
    /// Indentation of the block the code is inserted into.
    pub indent: &'a str,
    /// One indentation level, for function bodies.
    pub unit: &'a str,
    pub linesep: &'a str,
}

pub(crate) fn wrapper_name(name: &str, uid: &str) -> String {
    format!("{WRAPPER_PREFIX}_{name}_{uid}")
}

pub(crate) fn lambda_name(uid: &str) -> String {
    format!("{WRAPPER_PREFIX}_lambda_{uid}")
}

/// Call replacing `name := expr`.
pub(crate) fn wrapper_call(name: &str, uid: &str, expr: &str) -> String {
    format!("{}({expr})", wrapper_name(name, uid))
}

/// Expression replacing `name := expr` directly in a class body. The class
/// namespace itself stores the value, so the binding happens at the original
/// position in the body.
pub(crate) fn class_storage(key: &str, name: &str, expr: &str) -> String {
    format!("(__import__('builtins').locals().__setitem__('{key}', {expr}), {name})[1]")
}

/// `if False:` block binding every name, so static tools see them as assigned.
pub(crate) fn hidden_bindings<'n>(layout: Layout<'_>, names: impl IntoIterator<Item = &'n str>) -> String {
    let Layout { indent, unit, linesep } = layout;
    let mut out = format!("{indent}if False:{linesep}");
    for name in names {
        out.push_str(&format!("{indent}{unit}{name} = NotImplemented{linesep}"));
    }
    out
}

/// Wrapper function binding `name` through `keyword` and returning it.
pub(crate) fn wrapper_function(layout: Layout<'_>, name: &str, uid: &str, keyword: ScopeKeyword) -> String {
    let Layout { indent, unit, linesep } = layout;
    let param = if name == "expr" { "value" } else { "expr" };
    let function = wrapper_name(name, uid);
    format!(
        "{indent}def {function}({param}):{linesep}\
         {indent}{unit}{WRAPPER_DOCSTRING}{linesep}\
         {indent}{unit}{keyword} {name}{linesep}\
         {indent}{unit}{name} = {param}{linesep}\
         {indent}{unit}return {name}{linesep}"
    )
}

/// Auxiliary function replacing a lambda. `body` is already indented one
/// level deeper than `layout.indent`.
pub(crate) fn lambda_function(layout: Layout<'_>, uid: &str, parameters: &str, body: &str) -> String {
    let Layout { indent, unit, linesep } = layout;
    let function = lambda_name(uid);
    format!("{indent}def {function}({parameters}):{linesep}{indent}{unit}{LAMBDA_DOCSTRING}{linesep}{body}")
}
