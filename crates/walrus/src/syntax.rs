//! Owned syntax tree walked by the conversion contexts.
//!
//! The tree is built from ruff's AST plus its token stream. Every interior
//! node's children tile the node's source range exactly: the text between two
//! AST children becomes a [`NodeKind::Token`] leaf. Rendering the children of
//! an untouched node therefore reproduces its source byte for byte, and the
//! contexts only ever replace the spans they rewrite.
//!
//! Statement bodies are split into *units*: one compound statement, or all
//! simple statements sharing a logical line. A unit owns the blank lines,
//! comment lines and indentation before it and the newline that ends it.

use ruff_python_ast::{
    self as ast, Expr, Stmt,
    visitor::source_order::{self, SourceOrderVisitor},
};
use ruff_python_parser::{Mode, ParseOptions, TokenKind};
use ruff_text_size::{Ranged, TextRange, TextSize};

use crate::{config::SourceVersion, error::ConvertError, legality, whitespace::line_indent};

/// How a compound statement's body is laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuiteLayout {
    /// Body written on the header line, as in `if x: y = 1`.
    Inline,
    /// Body on its own lines, with the indentation of its first statement.
    Indented(String),
}

/// Compound statements whose bodies share the enclosing code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CompoundKind {
    If,
    While,
    For,
    With,
    Try,
    Match,
}

#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
pub enum NodeKind {
    Module,
    Suite(SuiteLayout),
    /// Simple statements sharing one logical line.
    SimpleLine,
    SimpleStatement,
    FunctionDef,
    ClassDef {
        name: String,
    },
    Compound(CompoundKind),
    Global {
        names: Vec<String>,
    },
    Nonlocal {
        names: Vec<String>,
    },
    Lambda,
    Parameters,
    NamedExpr {
        target: String,
    },
    /// A formatted string literal, possibly implicitly concatenated with others.
    StringLiteral,
    Expression,
    /// Source text between AST children.
    Token,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    kind: NodeKind,
    range: TextRange,
    children: Vec<SyntaxNode>,
    has_named_expr: bool,
}

impl SyntaxNode {
    fn token(range: TextRange) -> Self {
        Self {
            kind: NodeKind::Token,
            range,
            children: Vec::new(),
            has_named_expr: false,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub fn range(&self) -> TextRange {
        self.range
    }

    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Whether an assignment expression occurs anywhere in this subtree.
    #[must_use]
    pub fn has_named_expr(&self) -> bool {
        self.has_named_expr
    }

    #[must_use]
    pub fn is_token(&self) -> bool {
        self.kind == NodeKind::Token
    }

    /// True for function and class definitions, which PEP 8 surrounds with blank lines.
    #[must_use]
    pub fn is_definition(&self) -> bool {
        matches!(self.kind, NodeKind::FunctionDef | NodeKind::ClassDef { .. })
    }

    #[must_use]
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.range]
    }
}

/// A parsed source text together with its syntax tree.
#[derive(Debug)]
pub struct SourceTree<'s> {
    source: &'s str,
    root: SyntaxNode,
}

impl<'s> SourceTree<'s> {
    /// Parses a module with the grammar of `version`.
    ///
    /// Fails on parser errors, on syntax `version` does not support, and on
    /// assignment expressions in positions the language forbids but the parser
    /// accepts.
    pub fn parse(source: &'s str, version: SourceVersion) -> Result<Self, ConvertError> {
        let options = ParseOptions::from(Mode::Module).with_target_version(version.to_python_version());
        let parsed = ruff_python_parser::parse(source, options)
            .map_err(|err| ConvertError::syntax(err.error.to_string(), source, err.location))?;
        if let Some(err) = parsed.unsupported_syntax_errors().first() {
            return Err(ConvertError::syntax(err.to_string(), source, err.range));
        }
        let tokens = collect_tokens(parsed.tokens());
        let parsed = parsed
            .try_into_module()
            .ok_or_else(|| ConvertError::context("module parse produced a non-module tree"))?;
        let module = parsed.syntax();
        legality::check_module(module, source)?;

        let mut builder = TreeBuilder::new(source, tokens, NodeKind::Module);
        builder.units(&module.body, TextSize::new(0));
        Ok(Self {
            source,
            root: builder.finish(),
        })
    }

    /// Parses a standalone expression, such as a lowered string literal.
    pub fn parse_expression(source: &'s str) -> Result<Self, ConvertError> {
        let parsed = ruff_python_parser::parse_expression(source)
            .map_err(|err| ConvertError::syntax(err.error.to_string(), source, err.location))?;
        let tokens = collect_tokens(parsed.tokens());
        let expression = parsed.syntax();
        legality::check_expression(&expression.body, source)?;

        let mut builder = TreeBuilder::new(source, tokens, NodeKind::Expression);
        builder.visit_expr(&expression.body);
        Ok(Self {
            source,
            root: builder.finish(),
        })
    }

    #[must_use]
    pub fn source(&self) -> &'s str {
        self.source
    }

    #[must_use]
    pub fn root(&self) -> &SyntaxNode {
        &self.root
    }
}

fn collect_tokens(tokens: &ruff_python_parser::Tokens) -> Vec<(TokenKind, TextRange)> {
    tokens.iter().map(|token| (token.kind(), token.range())).collect()
}

fn compound_kind(stmt: &Stmt) -> Option<NodeKind> {
    let kind = match stmt {
        Stmt::FunctionDef(_) => NodeKind::FunctionDef,
        Stmt::ClassDef(class) => NodeKind::ClassDef {
            name: class.name.as_str().to_owned(),
        },
        Stmt::If(_) => NodeKind::Compound(CompoundKind::If),
        Stmt::While(_) => NodeKind::Compound(CompoundKind::While),
        Stmt::For(_) => NodeKind::Compound(CompoundKind::For),
        Stmt::With(_) => NodeKind::Compound(CompoundKind::With),
        Stmt::Try(_) => NodeKind::Compound(CompoundKind::Try),
        Stmt::Match(_) => NodeKind::Compound(CompoundKind::Match),
        _ => return None,
    };
    Some(kind)
}

/// A node under construction.
#[derive(Debug)]
struct Frame {
    kind: NodeKind,
    start: TextSize,
    children: Vec<SyntaxNode>,
}

impl Frame {
    fn new(kind: NodeKind, start: TextSize) -> Self {
        Self {
            kind,
            start,
            children: Vec::new(),
        }
    }

    /// Closes the frame at `end`, filling gaps between children with tokens.
    fn finish(self, end: TextSize) -> SyntaxNode {
        let mut children = Vec::with_capacity(self.children.len() * 2 + 1);
        let mut has_named_expr = matches!(self.kind, NodeKind::NamedExpr { .. });
        let mut cursor = self.start;
        for child in self.children {
            if child.range.start() > cursor {
                children.push(SyntaxNode::token(TextRange::new(cursor, child.range.start())));
            }
            cursor = cursor.max(child.range.end());
            has_named_expr |= child.has_named_expr;
            children.push(child);
        }
        let end = end.max(cursor);
        if end > cursor {
            children.push(SyntaxNode::token(TextRange::new(cursor, end)));
        }
        SyntaxNode {
            kind: self.kind,
            range: TextRange::new(self.start, end),
            children,
            has_named_expr,
        }
    }
}

struct TreeBuilder<'s> {
    source: &'s str,
    tokens: Vec<(TokenKind, TextRange)>,
    root: Frame,
    stack: Vec<Frame>,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str, tokens: Vec<(TokenKind, TextRange)>, root: NodeKind) -> Self {
        Self {
            source,
            tokens,
            root: Frame::new(root, TextSize::new(0)),
            stack: Vec::new(),
        }
    }

    fn finish(self) -> SyntaxNode {
        self.root.finish(TextSize::of(self.source))
    }

    fn current(&mut self) -> &mut Frame {
        self.stack.last_mut().unwrap_or(&mut self.root)
    }

    fn open(&mut self, kind: NodeKind, start: TextSize) {
        self.stack.push(Frame::new(kind, start));
    }

    fn close(&mut self, end: TextSize) {
        if let Some(frame) = self.stack.pop() {
            let node = frame.finish(end);
            self.current().children.push(node);
        }
    }

    /// End of the last child added to the open node, or its start.
    fn last_end(&self) -> TextSize {
        let frame = self.stack.last().unwrap_or(&self.root);
        frame.children.last().map_or(frame.start, |child| child.range.end())
    }

    /// Tokens starting at or after `offset`.
    fn tokens_from(&self, offset: TextSize) -> &[(TokenKind, TextRange)] {
        let index = self.tokens.partition_point(|(_, range)| range.start() < offset);
        &self.tokens[index..]
    }

    /// End of the logical line a statement ending at `offset` sits on, and
    /// whether another statement follows on the same line.
    fn line_end(&self, offset: TextSize) -> (TextSize, bool) {
        let mut end = offset;
        for &(kind, range) in self.tokens_from(offset) {
            match kind {
                TokenKind::Semi | TokenKind::Comment => end = range.end(),
                TokenKind::Newline | TokenKind::NonLogicalNewline => return (range.end(), false),
                TokenKind::EndOfFile | TokenKind::Dedent | TokenKind::Indent => return (end, false),
                _ => return (end, true),
            }
        }
        (end, false)
    }

    /// End of the header colon that precedes a body starting at `body_start`.
    fn colon_end(&self, from: TextSize, body_start: TextSize) -> TextSize {
        self.tokens_from(from)
            .iter()
            .take_while(|(_, range)| range.start() < body_start)
            .filter(|(kind, _)| *kind == TokenKind::Colon)
            .last()
            .map_or(from, |(_, range)| range.end())
    }

    /// Adds the units of `body` to the open node, starting at `cursor`.
    /// Returns the end of the last unit.
    fn units(&mut self, body: &[Stmt], mut cursor: TextSize) -> TextSize {
        let mut index = 0;
        while let Some(stmt) = body.get(index) {
            if let Some(kind) = compound_kind(stmt) {
                let (end, _) = self.line_end(stmt.end());
                self.open(kind, cursor);
                source_order::walk_stmt(self, stmt);
                self.close(end);
                cursor = end;
                index += 1;
                continue;
            }
            self.open(NodeKind::SimpleLine, cursor);
            while let Some(stmt) = body.get(index) {
                self.simple_statement(stmt);
                index += 1;
                let (end, continues) = self.line_end(stmt.end());
                cursor = end;
                if !continues || body.get(index).is_none_or(|next| compound_kind(next).is_some()) {
                    break;
                }
            }
            self.close(cursor);
        }
        cursor
    }

    fn simple_statement(&mut self, stmt: &Stmt) {
        let kind = match stmt {
            Stmt::Global(global) => NodeKind::Global {
                names: global.names.iter().map(|name| name.as_str().to_owned()).collect(),
            },
            Stmt::Nonlocal(nonlocal) => NodeKind::Nonlocal {
                names: nonlocal.names.iter().map(|name| name.as_str().to_owned()).collect(),
            },
            _ => NodeKind::SimpleStatement,
        };
        self.open(kind, stmt.start());
        source_order::walk_stmt(self, stmt);
        self.close(stmt.end());
    }
}

impl<'a> SourceOrderVisitor<'a> for TreeBuilder<'_> {
    fn visit_body(&mut self, body: &'a [Stmt]) {
        let Some(first) = body.first() else {
            return;
        };
        let start = self.colon_end(self.last_end(), first.start());
        let between = &self.source[TextRange::new(start, first.start())];
        let layout = if between.contains(['\n', '\r']) {
            SuiteLayout::Indented(line_indent(self.source, first.start().to_usize()).to_owned())
        } else {
            SuiteLayout::Inline
        };
        self.open(NodeKind::Suite(layout), start);
        let end = self.units(body, start);
        self.close(end);
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Named(named) => {
                let target = match &*named.target {
                    Expr::Name(name) => name.id.as_str().to_owned(),
                    other => self.source[other.range()].to_owned(),
                };
                self.open(NodeKind::NamedExpr { target }, expr.start());
                self.visit_expr(&named.value);
                self.close(expr.end());
            }
            Expr::Lambda(_) => self.nested(NodeKind::Lambda, expr),
            Expr::FString(_) => self.nested(NodeKind::StringLiteral, expr),
            _ => self.nested(NodeKind::Expression, expr),
        }
    }

    fn visit_parameters(&mut self, parameters: &'a ast::Parameters) {
        self.open(NodeKind::Parameters, parameters.start());
        source_order::walk_parameters(self, parameters);
        self.close(parameters.end());
    }
}

impl TreeBuilder<'_> {
    fn nested(&mut self, kind: NodeKind, expr: &Expr) {
        self.open(kind, expr.start());
        source_order::walk_expr(self, expr);
        self.close(expr.end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SourceTree<'_> {
        SourceTree::parse(source, SourceVersion::default()).unwrap()
    }

    fn render(node: &SyntaxNode, source: &str) -> String {
        if node.children().is_empty() {
            node.text(source).to_owned()
        } else {
            node.children().iter().map(|child| render(child, source)).collect()
        }
    }

    fn kinds(node: &SyntaxNode) -> Vec<&'static str> {
        node.children()
            .iter()
            .map(|child| <&'static str>::from(child.kind()))
            .collect()
    }

    #[test]
    fn children_tile_the_source() {
        let source = "import os  # c\n\nx = 1; y = 2\nif x:\n    # note\n    z = (w := 3)\nelse: pass\n# tail\n";
        let tree = parse(source);
        assert_eq!(render(tree.root(), source), source);
        assert!(tree.root().has_named_expr());
    }

    #[test]
    fn units_group_logical_lines() {
        let source = "a = 1; b = 2\ndef f():\n    return 1\n\nc = 3\n";
        let tree = parse(source);
        assert_eq!(kinds(tree.root()), ["SimpleLine", "FunctionDef", "SimpleLine"]);
        let line = &tree.root().children()[0];
        assert_eq!(line.text(source), "a = 1; b = 2\n");
        assert_eq!(tree.root().children()[2].text(source), "\nc = 3\n");
    }

    #[test]
    fn suite_starts_after_header_colon() {
        let source = "while x:  # loop: forever\n    y = 1\n";
        let tree = parse(source);
        let compound = &tree.root().children()[0];
        let suite = compound
            .children()
            .iter()
            .find(|child| matches!(child.kind(), NodeKind::Suite(_)))
            .unwrap();
        assert_eq!(suite.kind(), &NodeKind::Suite(SuiteLayout::Indented("    ".to_owned())));
        assert_eq!(suite.text(source), "  # loop: forever\n    y = 1\n");
    }

    #[test]
    fn inline_suite_layout() {
        let source = "if x: y = 1\n";
        let tree = parse(source);
        let suite = tree.root().children()[0].children().last().unwrap();
        assert_eq!(suite.kind(), &NodeKind::Suite(SuiteLayout::Inline));
        assert_eq!(suite.text(source), " y = 1\n");
    }

    #[test]
    fn named_expression_keeps_target() {
        let source = "print((total := 1 + 2))";
        let tree = parse(source);
        assert_eq!(render(tree.root(), source), source);
        let line = &tree.root().children()[0];
        let statement = &line.children()[0];
        let call = &statement.children()[0];
        let named = call
            .children()
            .iter()
            .find(|node| matches!(node.kind(), NodeKind::NamedExpr { .. }))
            .unwrap();
        assert_eq!(
            named.kind(),
            &NodeKind::NamedExpr {
                target: "total".to_owned()
            }
        );
        assert_eq!(named.text(source), "total := 1 + 2");
    }

    #[test]
    fn global_names_recorded() {
        let source = "global a, b\n";
        let tree = parse(source);
        let statement = &tree.root().children()[0].children()[0];
        assert_eq!(
            statement.kind(),
            &NodeKind::Global {
                names: vec!["a".to_owned(), "b".to_owned()]
            }
        );
    }

    #[test]
    fn expression_tree_covers_whole_text() {
        let source = "'{}'.format((x := 1))";
        let tree = SourceTree::parse_expression(source).unwrap();
        assert_eq!(render(tree.root(), source), source);
        assert!(tree.root().has_named_expr());
    }
}
