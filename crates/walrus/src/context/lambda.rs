use indexmap::IndexSet;

use super::{Context, ContextKind, LambdaFunction, Placement, Shape};
use crate::{
    error::ConvertError,
    scope::ScopeKind,
    syntax::{NodeKind, SyntaxNode},
    template,
    tracer::ConvertTracer,
};

impl<Tr: ConvertTracer> Context<'_, Tr> {
    /// Lifts a lambda whose body binds a name into an auxiliary function.
    ///
    /// The lambda's parameter list, defaults included, moves to the `def`;
    /// the lambda itself is replaced by the function's name.
    pub(super) fn render_lambda(&mut self, node: &SyntaxNode) -> Result<String, ConvertError> {
        let body = node
            .children()
            .iter()
            .rfind(|child| !child.is_token())
            .ok_or_else(|| ConvertError::context("lambda has no body"))?;
        if !body.has_named_expr() {
            // only the defaults bind, and they are evaluated in this scope
            return self.render_children(node);
        }

        let uid = self.converter.uids.next();
        let parameters = match node
            .children()
            .iter()
            .find(|child| *child.kind() == NodeKind::Parameters)
        {
            Some(parameters) => self.render(parameters)?,
            None => String::new(),
        };
        let mut scopes = self.scopes.clone();
        scopes.push(ScopeKind::Lambda);
        let placement = Placement {
            scopes,
            indent_level: self.indent_level + 1,
            indent: self.deeper_indent(),
            seen_globals: IndexSet::new(),
            shape: Shape::LambdaBody,
        };
        let converted = Context::convert(&mut *self.converter, self.source, body, ContextKind::Lambda, placement)?;
        self.converter.tracer.on_lambda(&uid);
        let name = template::lambda_name(&uid);
        self.pending.lambdas.push(LambdaFunction {
            uid,
            parameters: parameters.trim().to_owned(),
            body: converted.text,
        });
        Ok(name)
    }
}
