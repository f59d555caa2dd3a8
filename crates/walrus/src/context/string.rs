use super::{Context, Placement, Shape};
use crate::{
    error::ConvertError,
    syntax::{SourceTree, SyntaxNode},
    tracer::ConvertTracer,
    whitespace::extract_whitespaces,
};

impl<Tr: ConvertTracer> Context<'_, Tr> {
    /// Lowers a formatted string literal and converts the resulting
    /// expression in place. Declarations it needs join this context's.
    pub(super) fn render_string(&mut self, node: &SyntaxNode) -> Result<String, ConvertError> {
        let text = node.text(self.source);
        let (leading, trailing) = extract_whitespaces(text);
        self.converter.tracer.on_literal_rewrite(text.len());
        let lowered = self.converter.rewriter.rewrite(text.trim())?;
        let tree = SourceTree::parse_expression(&lowered)?;

        let placement = Placement {
            scopes: self.scopes.clone(),
            indent_level: self.indent_level,
            indent: self.indent.clone(),
            seen_globals: self.seen_globals.clone(),
            shape: Shape::Raw,
        };
        let converted = Context::convert(
            &mut *self.converter,
            tree.source(),
            tree.root(),
            self.kind.reborrow(),
            placement,
        )?;
        self.pending.absorb(converted.pending);
        self.seen_globals.extend(converted.globals);
        Ok(format!("{leading}{}{trailing}", converted.text))
    }
}
