//! Which declaration keyword a synthesized wrapper needs to reach the scope
//! that owns a name.

/// A scope on the chain from the module down to the code being converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ScopeKind {
    Module,
    Function,
    Lambda,
    Class,
}

/// Declaration placed inside a wrapper function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ScopeKeyword {
    Global,
    Nonlocal,
}

/// Resolves the keyword for a binding made in the innermost scope of `scopes`.
///
/// Class scopes are skipped: code nested in a class body cannot see the class
/// namespace, so the binding lands in the nearest enclosing function (or the
/// module when there is none).
#[must_use]
pub fn resolve(scopes: &[ScopeKind]) -> ScopeKeyword {
    scopes
        .iter()
        .rev()
        .find_map(|scope| match scope {
            ScopeKind::Class => None,
            ScopeKind::Function | ScopeKind::Lambda => Some(ScopeKeyword::Nonlocal),
            ScopeKind::Module => Some(ScopeKeyword::Global),
        })
        .unwrap_or(ScopeKeyword::Global)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_level_is_global() {
        assert_eq!(resolve(&[ScopeKind::Module]), ScopeKeyword::Global);
        assert_eq!(resolve(&[]), ScopeKeyword::Global);
    }

    #[test]
    fn function_and_lambda_are_nonlocal() {
        assert_eq!(resolve(&[ScopeKind::Module, ScopeKind::Function]), ScopeKeyword::Nonlocal);
        assert_eq!(resolve(&[ScopeKind::Module, ScopeKind::Lambda]), ScopeKeyword::Nonlocal);
    }

    #[test]
    fn class_scopes_are_transparent() {
        assert_eq!(resolve(&[ScopeKind::Module, ScopeKind::Class]), ScopeKeyword::Global);
        assert_eq!(
            resolve(&[ScopeKind::Module, ScopeKind::Function, ScopeKind::Class]),
            ScopeKeyword::Nonlocal
        );
    }

    #[test]
    fn keyword_spelling() {
        assert_eq!(ScopeKeyword::Global.to_string(), "global");
        assert_eq!(ScopeKeyword::Nonlocal.to_string(), "nonlocal");
    }
}
