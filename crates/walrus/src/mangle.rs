//! Private name mangling for identifiers used inside class bodies.

use std::borrow::Cow;

/// Returns true if `name` is mangled when used inside a class body.
///
/// Python mangles names that:
/// - start with `__`
/// - do NOT end with `__`
///
/// Names made only of underscores end with `__` and are never mangled.
#[must_use]
pub fn is_mangling_candidate(name: &str) -> bool {
    name.starts_with("__") && !name.ends_with("__")
}

/// Mangles `name` as the compiler would inside the body of `class_name`.
///
/// The class name loses its leading underscores first; a class named only
/// with underscores disables mangling.
#[must_use]
pub fn mangle<'a>(name: &'a str, class_name: &str) -> Cow<'a, str> {
    if !is_mangling_candidate(name) {
        return Cow::Borrowed(name);
    }
    let stripped = class_name.trim_start_matches('_');
    if stripped.is_empty() {
        return Cow::Borrowed(name);
    }
    let mut mangled = String::with_capacity(1 + stripped.len() + name.len());
    mangled.push('_');
    mangled.push_str(stripped);
    mangled.push_str(name);
    Cow::Owned(mangled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_names_are_prefixed() {
        assert_eq!(mangle("__x", "Spam"), "_Spam__x");
        assert_eq!(mangle("__x", "__Spam"), "_Spam__x");
        assert_eq!(mangle("__x_", "Spam"), "_Spam__x_");
    }

    #[test]
    fn other_names_pass_through() {
        assert_eq!(mangle("x", "Spam"), "x");
        assert_eq!(mangle("_x", "Spam"), "_x");
        assert_eq!(mangle("__init__", "Spam"), "__init__");
        assert_eq!(mangle("____", "Spam"), "____");
        assert_eq!(mangle("__x", "___"), "__x");
    }
}
