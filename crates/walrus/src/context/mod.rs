//! Conversion contexts.
//!
//! A context converts one code block: the module, an indented or inline body,
//! a lambda body, or an expression produced by lowering a string literal. It
//! renders its children in order, replacing every assignment expression, and
//! collects the declarations those replacements need: hidden bindings,
//! wrapper functions and lifted lambdas. A standalone context inserts them
//! into its own text just before the first statement that needs them; a raw
//! context hands them to the context that created it.

mod class;
mod emit;
mod lambda;
mod string;

use indexmap::IndexSet;

pub(crate) use self::class::ClassState;
use crate::{
    converter::Converter,
    error::ConvertError,
    scope::{self, ScopeKeyword, ScopeKind},
    syntax::{NodeKind, SuiteLayout, SyntaxNode},
    template,
    tracer::ConvertTracer,
    whitespace::extract_whitespaces,
};

/// What a context is converting, beyond its position in the scope chain.
#[derive(Debug)]
pub(crate) enum ContextKind<'a> {
    Plain,
    /// Body of a class statement; the state is shared with nested block bodies.
    Class(&'a mut ClassState),
    Lambda,
}

impl ContextKind<'_> {
    fn reborrow(&mut self) -> ContextKind<'_> {
        match self {
            Self::Plain => ContextKind::Plain,
            Self::Class(state) => ContextKind::Class(&mut **state),
            Self::Lambda => ContextKind::Lambda,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Plain => "block",
            Self::Class(_) => "class",
            Self::Lambda => "lambda",
        }
    }

    fn record_override(&mut self, name: &str, keyword: ScopeKeyword) {
        if let Self::Class(state) = self {
            state.record_override(name, keyword);
        }
    }
}

/// Where a context's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// Module or indented body.
    Block,
    /// Body written on its header line; moved onto its own lines when
    /// declarations have to precede it.
    Inline,
    /// Lambda body, emitted as the body of an auxiliary function.
    LambdaBody,
    /// Expression spliced back into the caller, which receives its declarations.
    Raw,
}

/// Position of a new context in the code being converted.
#[derive(Debug)]
pub(crate) struct Placement {
    pub scopes: Vec<ScopeKind>,
    pub indent_level: usize,
    pub indent: String,
    /// Names declared `global` by statements already seen in this code block.
    pub seen_globals: IndexSet<String>,
    pub shape: Shape,
}

impl Placement {
    pub(crate) fn module() -> Self {
        Self {
            scopes: vec![ScopeKind::Module],
            indent_level: 0,
            indent: String::new(),
            seen_globals: IndexSet::new(),
            shape: Shape::Block,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct WrapperFunction {
    pub name: String,
    pub uid: String,
    pub keyword: ScopeKeyword,
}

#[derive(Debug, Clone)]
pub(crate) struct LambdaFunction {
    pub uid: String,
    pub parameters: String,
    /// Converted body, already indented and ending in a `return` line.
    pub body: String,
}

/// Declarations waiting to be emitted.
#[derive(Debug, Default)]
pub(crate) struct Pending {
    pub bindings: IndexSet<String>,
    pub functions: Vec<WrapperFunction>,
    /// Wrappers for names a class body declares `global` or `nonlocal`.
    pub external_functions: Vec<WrapperFunction>,
    pub lambdas: Vec<LambdaFunction>,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.bindings.is_empty()
            && self.functions.is_empty()
            && self.external_functions.is_empty()
            && self.lambdas.is_empty()
    }

    fn absorb(&mut self, other: Self) {
        self.bindings.extend(other.bindings);
        self.functions.extend(other.functions);
        self.external_functions.extend(other.external_functions);
        self.lambdas.extend(other.lambdas);
    }
}

/// Result of converting one context.
#[derive(Debug)]
pub(crate) struct Converted {
    pub text: String,
    /// Declarations left for the caller; always empty for standalone contexts.
    pub pending: Pending,
    pub globals: IndexSet<String>,
}

/// Owner of a statement body, which decides the scope the body runs in.
#[derive(Debug, Clone, Copy)]
enum Owner<'n> {
    Block,
    Function,
    Class(&'n str),
}

pub(crate) struct Context<'a, Tr: ConvertTracer> {
    converter: &'a mut Converter<Tr>,
    source: &'a str,
    kind: ContextKind<'a>,
    shape: Shape,
    scopes: Vec<ScopeKind>,
    scope_keyword: ScopeKeyword,
    indent_level: usize,
    indent: String,
    seen_globals: IndexSet<String>,
    /// Text before the insertion point.
    prefix: String,
    /// Text from the insertion point on.
    suffix: String,
    /// Last child rendered before the insertion point.
    marker: Option<&'a SyntaxNode>,
    /// First child containing an assignment expression.
    insertion: Option<&'a SyntaxNode>,
    pending: Pending,
}

impl<'a, Tr: ConvertTracer> Context<'a, Tr> {
    /// Converts `root` and finalizes the result.
    pub(crate) fn convert(
        converter: &'a mut Converter<Tr>,
        source: &'a str,
        root: &'a SyntaxNode,
        kind: ContextKind<'a>,
        placement: Placement,
    ) -> Result<Converted, ConvertError> {
        let Placement {
            scopes,
            indent_level,
            indent,
            seen_globals,
            shape,
        } = placement;
        converter.tracer.on_enter_context(kind.label(), indent_level);
        let mut context = Self {
            converter,
            source,
            kind,
            shape,
            scope_keyword: scope::resolve(&scopes),
            scopes,
            indent_level,
            indent,
            seen_globals,
            prefix: String::new(),
            suffix: String::new(),
            marker: None,
            insertion: None,
            pending: Pending::default(),
        };
        context.visit_root(root)?;
        Ok(context.finalize())
    }

    fn visit_root(&mut self, root: &'a SyntaxNode) -> Result<(), ConvertError> {
        if !matches!(root.kind(), NodeKind::Module | NodeKind::Suite(_)) {
            self.insertion = Some(root);
            self.suffix = self.render(root)?;
            return Ok(());
        }
        for child in root.children() {
            if self.insertion.is_none() && child.has_named_expr() {
                self.insertion = Some(child);
                if let Some((head, tail)) = split_after_declarations(child) {
                    self.split_line(child, head, tail)?;
                    continue;
                }
            }
            let text = self.render(child)?;
            if self.insertion.is_some() {
                self.suffix.push_str(&text);
            } else {
                self.prefix.push_str(&text);
                self.marker = Some(child);
            }
        }
        Ok(())
    }

    /// Breaks `global x; print(x := 1)` after its declarations so the
    /// inserted bindings follow them.
    fn split_line(
        &mut self,
        line: &'a SyntaxNode,
        head: &[SyntaxNode],
        tail: &[SyntaxNode],
    ) -> Result<(), ConvertError> {
        let head = self.render_all(head)?;
        let linesep = self.converter.config.linesep.as_str();
        if self.shape == Shape::Inline {
            // emission puts the line break after the declarations
            self.prefix.push_str(linesep);
            self.prefix.push_str(&self.indent);
            self.prefix.push_str(head.trim_start());
        } else {
            self.prefix.push_str(&head);
            self.prefix.push_str(linesep);
            self.suffix.push_str(&self.indent);
        }
        self.marker = Some(line);
        let tail = self.render_all(tail)?;
        self.suffix.push_str(&tail);
        Ok(())
    }

    fn render(&mut self, node: &SyntaxNode) -> Result<String, ConvertError> {
        if !node.has_named_expr() {
            self.record_declarations(node);
            return Ok(node.text(self.source).to_owned());
        }
        match node.kind() {
            NodeKind::SimpleLine | NodeKind::SimpleStatement | NodeKind::Expression | NodeKind::Parameters => {
                self.render_children(node)
            }
            NodeKind::Compound(_) => self.render_compound(node, Owner::Block),
            NodeKind::FunctionDef => self.render_compound(node, Owner::Function),
            NodeKind::ClassDef { name } => self.render_compound(node, Owner::Class(name)),
            NodeKind::NamedExpr { target } => self.render_named(node, target),
            NodeKind::Lambda => self.render_lambda(node),
            NodeKind::StringLiteral => self.render_string(node),
            kind @ (NodeKind::Module
            | NodeKind::Suite(_)
            | NodeKind::Global { .. }
            | NodeKind::Nonlocal { .. }
            | NodeKind::Token) => Err(ConvertError::context(format!(
                "{} node reached outside its block",
                <&'static str>::from(kind)
            ))),
        }
    }

    fn render_children(&mut self, node: &SyntaxNode) -> Result<String, ConvertError> {
        self.render_all(node.children())
    }

    fn render_all(&mut self, nodes: &[SyntaxNode]) -> Result<String, ConvertError> {
        nodes.iter().map(|child| self.render(child)).collect()
    }

    /// Notes `global` and `nonlocal` statements of the current code block.
    fn record_declarations(&mut self, node: &SyntaxNode) {
        match node.kind() {
            NodeKind::Global { names } => {
                for name in names {
                    self.seen_globals.insert(name.clone());
                    self.kind.record_override(name, ScopeKeyword::Global);
                }
            }
            NodeKind::Nonlocal { names } => {
                for name in names {
                    self.kind.record_override(name, ScopeKeyword::Nonlocal);
                }
            }
            NodeKind::SimpleLine | NodeKind::Compound(_) | NodeKind::Suite(_) => {
                for child in node.children() {
                    self.record_declarations(child);
                }
            }
            _ => {}
        }
    }

    /// Renders a compound statement: headers in this context, bodies in their own.
    fn render_compound(&mut self, node: &SyntaxNode, owner: Owner<'_>) -> Result<String, ConvertError> {
        let mut out = String::with_capacity(node.range().len().to_usize());
        for child in node.children() {
            let text = match child.kind() {
                NodeKind::Suite(layout) => self.render_suite(child, layout, owner)?,
                _ => self.render(child)?,
            };
            out.push_str(&text);
        }
        Ok(out)
    }

    fn render_suite(
        &mut self,
        suite: &SyntaxNode,
        layout: &SuiteLayout,
        owner: Owner<'_>,
    ) -> Result<String, ConvertError> {
        if !suite.has_named_expr() {
            if matches!(owner, Owner::Block) {
                self.record_declarations(suite);
            }
            return Ok(suite.text(self.source).to_owned());
        }
        let (indent, shape) = match layout {
            SuiteLayout::Indented(indent) => (indent.clone(), Shape::Block),
            SuiteLayout::Inline => (self.deeper_indent(), Shape::Inline),
        };
        let mut scopes = self.scopes.clone();
        let seen_globals = match owner {
            Owner::Block => self.seen_globals.clone(),
            Owner::Function => {
                scopes.push(ScopeKind::Function);
                IndexSet::new()
            }
            Owner::Class(_) => {
                scopes.push(ScopeKind::Class);
                IndexSet::new()
            }
        };
        let placement = Placement {
            scopes,
            indent_level: self.indent_level + 1,
            indent,
            seen_globals,
            shape,
        };
        let converted = match owner {
            Owner::Block => Context::convert(
                &mut *self.converter,
                self.source,
                suite,
                self.kind.reborrow(),
                placement,
            )?,
            Owner::Function => {
                Context::convert(&mut *self.converter, self.source, suite, ContextKind::Plain, placement)?
            }
            Owner::Class(name) => {
                let mut state = ClassState::new(name);
                Context::convert(
                    &mut *self.converter,
                    self.source,
                    suite,
                    ContextKind::Class(&mut state),
                    placement,
                )?
            }
        };
        if matches!(owner, Owner::Block) {
            self.seen_globals.extend(converted.globals);
        }
        self.pending.absorb(converted.pending);
        Ok(converted.text)
    }

    /// Replaces `name := value` with a wrapper call, or with class storage
    /// when the name belongs to the class body being converted.
    fn render_named(&mut self, node: &SyntaxNode, target: &str) -> Result<String, ConvertError> {
        let uid = self.converter.uids.next();
        // everything after `:=`, so parentheses and comments around the value survive
        let mut value_text = String::new();
        let mut after_operator = false;
        for child in node.children() {
            if after_operator {
                value_text.push_str(&self.render(child)?);
            } else if child.is_token()
                && let Some((_, rest)) = child.text(self.source).split_once(":=")
            {
                after_operator = true;
                value_text.push_str(rest);
            }
        }
        if !after_operator {
            return Err(ConvertError::context(format!(
                "assignment expression to '{target}' has no operator"
            )));
        }
        let expr = value_text.trim();
        let (leading, trailing) = extract_whitespaces(node.text(self.source));

        if let ContextKind::Class(state) = &mut self.kind
            && !state.is_overridden(target)
        {
            let key = state.slot(target, &uid, &mut self.converter.tracer);
            return Ok(format!(
                "{leading}{}{trailing}",
                template::class_storage(&key, target, expr)
            ));
        }

        let external = match &self.kind {
            ContextKind::Class(state) => state.override_keyword(target),
            _ => None,
        };
        let keyword = if self.seen_globals.contains(target) {
            ScopeKeyword::Global
        } else {
            external.unwrap_or(self.scope_keyword)
        };
        self.converter.tracer.on_wrapper(target, &uid, keyword);
        self.pending.bindings.insert(target.to_owned());
        let call = template::wrapper_call(target, &uid, expr);
        let function = WrapperFunction {
            name: target.to_owned(),
            uid,
            keyword,
        };
        if external.is_some() {
            self.pending.external_functions.push(function);
        } else {
            self.pending.functions.push(function);
        }
        Ok(format!("{leading}{call}{trailing}"))
    }

    fn deeper_indent(&self) -> String {
        format!("{}{}", self.indent, self.converter.config.indentation.as_str())
    }
}

/// Splits a logical line whose first assignment expression follows a
/// `global` or `nonlocal` statement on the same line. Returns the children up
/// to the last such declaration and the children from the next statement on;
/// the separator between them is dropped.
fn split_after_declarations(line: &SyntaxNode) -> Option<(&[SyntaxNode], &[SyntaxNode])> {
    if *line.kind() != NodeKind::SimpleLine {
        return None;
    }
    let children = line.children();
    let first_use = children.iter().position(SyntaxNode::has_named_expr)?;
    let last_declaration = children[..first_use]
        .iter()
        .rposition(|child| matches!(child.kind(), NodeKind::Global { .. } | NodeKind::Nonlocal { .. }))?;
    let resume = last_declaration + 1 + children[last_declaration + 1..].iter().position(|child| !child.is_token())?;
    Some((&children[..=last_declaration], &children[resume..]))
}
