//! Checks on assignment expressions that the parser accepts but the language
//! rejects at compile time.
//!
//! Inside comprehensions an assignment expression binds in the enclosing
//! scope, so it may not appear in an iterable expression, may not rebind an
//! iteration variable of any comprehension it is nested in, and may not be
//! used when that enclosing scope is a class body.
//!
//! One valid construct is refused as well: a lambda that has to be lifted
//! out of a comprehension while reading the comprehension's iteration
//! variables, which the lifted function could not see.

use ahash::AHashSet;
use ruff_python_ast::{
    self as ast, Expr, Stmt,
    visitor::{self, Visitor},
};
use ruff_text_size::Ranged;

use crate::{error::ConvertError, scope::ScopeKind};

/// Checks every assignment expression in a module.
pub(crate) fn check_module(module: &ast::ModModule, source: &str) -> Result<(), ConvertError> {
    let mut checker = LegalityChecker::new(source);
    checker.visit_body(&module.body);
    checker.finish()
}

/// Checks every assignment expression in a standalone expression.
pub(crate) fn check_expression(expr: &Expr, source: &str) -> Result<(), ConvertError> {
    let mut checker = LegalityChecker::new(source);
    checker.visit_expr(expr);
    checker.finish()
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    /// Iteration variables of the comprehensions currently open in this scope,
    /// innermost last.
    comprehensions: Vec<Vec<String>>,
}

impl Scope {
    fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            comprehensions: Vec::new(),
        }
    }
}

struct LegalityChecker<'s> {
    source: &'s str,
    scopes: Vec<Scope>,
    /// Number of comprehension iterable expressions being visited.
    iterable_depth: usize,
    error: Option<ConvertError>,
}

impl<'s> LegalityChecker<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            scopes: vec![Scope::new(ScopeKind::Module)],
            iterable_depth: 0,
            error: None,
        }
    }

    fn finish(self) -> Result<(), ConvertError> {
        self.error.map_or(Ok(()), Err)
    }

    fn fail(&mut self, msg: String, node: &impl Ranged) {
        let err = ConvertError::syntax(msg, self.source, node.range());
        self.reject(err);
    }

    fn reject(&mut self, err: ConvertError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Refuses a lambda that would be lifted out of a comprehension while
    /// reading one of its iteration variables.
    fn check_lifted_lambda(&mut self, lambda: &ast::ExprLambda) {
        let Some(scope) = self.scopes.last() else {
            return;
        };
        if scope.comprehensions.is_empty() {
            return;
        }
        let mut body = NameUses::default();
        body.visit_expr(&lambda.body);
        if !body.binds {
            return;
        }
        let mut defaults = NameUses::default();
        if let Some(parameters) = &lambda.parameters {
            defaults.visit_parameters(parameters);
        }
        let is_parameter = |name: &str| lambda.parameters.as_ref().is_some_and(|p| p.includes(name));
        let captured = scope
            .comprehensions
            .iter()
            .flatten()
            .find(|bound| {
                defaults.loads.contains(bound.as_str())
                    || (body.loads.contains(bound.as_str()) && !is_parameter(bound))
            })
            .cloned();
        if let Some(name) = captured {
            let err = ConvertError::unsupported(
                format!("lambda binding a name cannot be lifted out of the comprehension that defines '{name}'"),
                self.source,
                lambda.range(),
            );
            self.reject(err);
        }
    }

    fn scoped(&mut self, kind: ScopeKind, visit: impl FnOnce(&mut Self)) {
        self.scopes.push(Scope::new(kind));
        visit(self);
        self.scopes.pop();
    }

    fn check_named(&mut self, named: &ast::ExprNamed) {
        let Expr::Name(target) = &*named.target else {
            return;
        };
        let name = target.id.as_str();
        if self.iterable_depth > 0 {
            self.fail(
                "assignment expression cannot be used in a comprehension iterable expression".to_owned(),
                named,
            );
            return;
        }
        let Some(scope) = self.scopes.last() else {
            return;
        };
        if scope.comprehensions.is_empty() {
            return;
        }
        let rebinds = scope.comprehensions.iter().flatten().any(|bound| bound == name);
        let in_class = scope.kind == ScopeKind::Class;
        if rebinds {
            self.fail(
                format!("assignment expression cannot rebind comprehension iteration variable '{name}'"),
                named,
            );
        } else if in_class {
            self.fail(
                "assignment expression within a comprehension cannot be used in a class body".to_owned(),
                named,
            );
        }
    }

    fn comprehension<'a>(&mut self, elements: &[&'a Expr], generators: &'a [ast::Comprehension]) {
        let mut bound = Vec::new();
        for generator in generators {
            self.iterable_depth += 1;
            self.visit_expr(&generator.iter);
            self.iterable_depth -= 1;
            collect_names(&generator.target, &mut bound);
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.comprehensions.push(bound);
        }
        for generator in generators {
            for condition in &generator.ifs {
                self.visit_expr(condition);
            }
        }
        for element in elements {
            self.visit_expr(element);
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.comprehensions.pop();
        }
    }
}

fn collect_names(target: &Expr, names: &mut Vec<String>) {
    match target {
        Expr::Name(name) => names.push(name.id.as_str().to_owned()),
        Expr::Tuple(ast::ExprTuple { elts, .. }) | Expr::List(ast::ExprList { elts, .. }) => {
            for elt in elts {
                collect_names(elt, names);
            }
        }
        Expr::Starred(ast::ExprStarred { value, .. }) => collect_names(value, names),
        _ => {}
    }
}

/// Names read by an expression, and whether it contains an assignment expression.
#[derive(Debug, Default)]
struct NameUses<'a> {
    loads: AHashSet<&'a str>,
    binds: bool,
}

impl<'a> Visitor<'a> for NameUses<'a> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Name(name) if name.ctx == ast::ExprContext::Load => {
                self.loads.insert(name.id.as_str());
            }
            Expr::Named(_) => {
                self.binds = true;
                visitor::walk_expr(self, expr);
            }
            _ => visitor::walk_expr(self, expr),
        }
    }
}

impl<'a> Visitor<'a> for LegalityChecker<'_> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::FunctionDef(function) => {
                for decorator in &function.decorator_list {
                    self.visit_decorator(decorator);
                }
                self.visit_parameters(&function.parameters);
                if let Some(returns) = &function.returns {
                    self.visit_annotation(returns);
                }
                self.scoped(ScopeKind::Function, |checker| checker.visit_body(&function.body));
            }
            Stmt::ClassDef(class) => {
                for decorator in &class.decorator_list {
                    self.visit_decorator(decorator);
                }
                if let Some(arguments) = &class.arguments {
                    self.visit_arguments(arguments);
                }
                self.scoped(ScopeKind::Class, |checker| checker.visit_body(&class.body));
            }
            _ => visitor::walk_stmt(self, stmt),
        }
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Named(named) => {
                self.check_named(named);
                visitor::walk_expr(self, expr);
            }
            Expr::Lambda(lambda) => {
                self.check_lifted_lambda(lambda);
                if let Some(parameters) = &lambda.parameters {
                    self.visit_parameters(parameters);
                }
                self.scoped(ScopeKind::Lambda, |checker| checker.visit_expr(&lambda.body));
            }
            Expr::ListComp(ast::ExprListComp { elt, generators, .. })
            | Expr::SetComp(ast::ExprSetComp { elt, generators, .. })
            | Expr::Generator(ast::ExprGenerator { elt, generators, .. }) => self.comprehension(&[&**elt], generators),
            Expr::DictComp(ast::ExprDictComp {
                key, value, generators, ..
            }) => self.comprehension(&[&**key, &**value], generators),
            _ => visitor::walk_expr(self, expr),
        }
    }
}
