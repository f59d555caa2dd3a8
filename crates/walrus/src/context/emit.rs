use std::borrow::Cow;

use super::{Context, Converted, Pending, Shape};
use crate::{
    syntax::SyntaxNode,
    template::{self, Layout},
    tracer::ConvertTracer,
    whitespace::{missing_newlines, split_comments},
};

/// One inserted declaration.
#[derive(Debug)]
struct Block {
    text: String,
    is_function: bool,
}

impl<Tr: ConvertTracer> Context<'_, Tr> {
    /// Assembles the context's output.
    ///
    /// Raw contexts return their text unchanged and leave their declarations
    /// to the caller. Standalone contexts insert the declarations in front of
    /// the first statement that needs them, after any comment lines leading
    /// up to it.
    pub(super) fn finalize(mut self) -> Converted {
        if self.shape == Shape::Raw {
            return Converted {
                text: self.prefix + &self.suffix,
                pending: self.pending,
                globals: self.seen_globals,
            };
        }
        let text = if self.pending.is_empty() && self.shape != Shape::LambdaBody {
            format!("{}{}", self.prefix, self.suffix)
        } else {
            self.pending.functions.sort_by(|a, b| a.name.cmp(&b.name));
            self.pending.external_functions.sort_by(|a, b| a.name.cmp(&b.name));
            self.converter.tracer.on_emit(
                self.pending.bindings.len(),
                self.pending.functions.len() + self.pending.external_functions.len(),
                self.pending.lambdas.len(),
            );
            let blocks = self.blocks();
            if self.shape == Shape::LambdaBody {
                self.lambda_body(&blocks)
            } else {
                self.insert_blocks(&blocks)
            }
        };
        Converted {
            text,
            pending: Pending::default(),
            globals: self.seen_globals,
        }
    }

    fn layout(&self) -> Layout<'_> {
        let config = &self.converter.config;
        Layout {
            indent: &self.indent,
            unit: config.indentation.as_str(),
            linesep: config.linesep.as_str(),
        }
    }

    fn blocks(&self) -> Vec<Block> {
        let layout = self.layout();
        let pending = &self.pending;
        let mut blocks = Vec::with_capacity(1 + pending.functions.len() + pending.lambdas.len());
        if !pending.bindings.is_empty() {
            blocks.push(Block {
                text: template::hidden_bindings(layout, pending.bindings.iter().map(String::as_str)),
                is_function: false,
            });
        }
        for function in pending.functions.iter().chain(&pending.external_functions) {
            blocks.push(Block {
                text: template::wrapper_function(layout, &function.name, &function.uid, function.keyword),
                is_function: true,
            });
        }
        for lambda in &pending.lambdas {
            blocks.push(Block {
                text: template::lambda_function(layout, &lambda.uid, &lambda.parameters, &lambda.body),
                is_function: true,
            });
        }
        blocks
    }

    fn insert_blocks(&self, blocks: &[Block]) -> String {
        let linesep = self.converter.config.linesep.as_str();
        let pep8 = self.converter.config.pep8;
        let expected = if self.indent_level == 0 { 2 } else { 1 };

        let (comments, code) = split_comments(&self.suffix);
        let mut out = self.prefix.clone();
        let code: Cow<'_, str> = if self.shape == Shape::Inline {
            // the body leaves the header line so the declarations can precede it
            out.push_str(linesep);
            Cow::Owned(format!("{}{}", self.indent, code.trim_start()))
        } else {
            out.push_str(comments);
            Cow::Borrowed(code)
        };

        for (index, block) in blocks.iter().enumerate() {
            // no padding at the top of a block
            if pep8 && (index > 0 || self.marker.is_some()) {
                let after_definition = index == 0 && self.marker.is_some_and(SyntaxNode::is_definition);
                let wanted = if block.is_function || after_definition { expected } else { 0 };
                pad(&mut out, &block.text, wanted, linesep);
            }
            out.push_str(&block.text);
        }
        if pep8 {
            let last_is_function = blocks.last().is_some_and(|block| block.is_function);
            let before_definition = self.insertion.is_some_and(SyntaxNode::is_definition);
            let wanted = if last_is_function || before_definition { expected } else { 0 };
            pad(&mut out, &code, wanted, linesep);
        }
        out.push_str(&code);
        out
    }

    /// Body of a lifted lambda: its declarations, then `return <body>`.
    fn lambda_body(&self, blocks: &[Block]) -> String {
        let linesep = self.converter.config.linesep.as_str();
        let pep8 = self.converter.config.pep8;

        let body = format!("{}{}", self.prefix, self.suffix);
        let body = body.trim();
        let body: Cow<'_, str> = if body.contains(['\n', '\r']) {
            Cow::Owned(format!("({body})"))
        } else {
            Cow::Borrowed(body)
        };
        let statement = format!("{}return {body}{linesep}", self.indent);

        let mut out = String::new();
        for (index, block) in blocks.iter().enumerate() {
            if pep8 && index > 0 && block.is_function {
                pad(&mut out, &block.text, 1, linesep);
            }
            out.push_str(&block.text);
        }
        if pep8 && blocks.last().is_some_and(|block| block.is_function) {
            pad(&mut out, &statement, 1, linesep);
        }
        out.push_str(&statement);
        out
    }
}

fn pad(out: &mut String, next: &str, wanted: usize, linesep: &str) {
    for _ in 0..missing_newlines(out, next, wanted) {
        out.push_str(linesep);
    }
}
