//! Lowering of formatted string literals into `str.format` calls.
//!
//! Assignment expressions nested inside f-string replacement fields are
//! rewritten only after the literal has been lowered: once every field is an
//! ordinary call argument, replacing a span cannot disturb the literal's
//! quoting or braces.

use std::fmt;

use ruff_python_ast::{self as ast, ConversionFlag, Expr, FStringPart, InterpolatedStringElement};
use ruff_text_size::{Ranged, TextRange, TextSize};

use crate::error::ConvertError;

/// Rewrites a formatted string literal into an equivalent expression without
/// replacement fields.
pub trait LiteralRewriter: fmt::Debug {
    /// `literal` is the source text of one string expression, which may be an
    /// implicit concatenation of several parts.
    fn rewrite(&self, literal: &str) -> Result<String, ConvertError>;
}

/// Default rewriter: every f-string part becomes `'...'.format(...)`.
///
/// ```
/// use walrus::{FormatLowering, LiteralRewriter};
///
/// let lowered = FormatLowering.rewrite(r#"f"{a!r:>{width}} and {b=}""#).unwrap();
/// assert_eq!(lowered, r#""{!r:>{}} and b={!r}".format((a), (width), (b))"#);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatLowering;

impl LiteralRewriter for FormatLowering {
    fn rewrite(&self, literal: &str) -> Result<String, ConvertError> {
        // parts of a parenthesized concatenation may sit on separate lines
        let source = format!("({literal})");
        let parsed = ruff_python_parser::parse_expression(&source)
            .map_err(|err| ConvertError::syntax(err.error.to_string(), literal, unwrapped(err.location)))?;
        let Expr::FString(fstring) = &*parsed.syntax().body else {
            return Err(ConvertError::syntax(
                "expected a formatted string literal",
                literal,
                unwrapped(parsed.syntax().range()),
            ));
        };

        let mut out = String::with_capacity(source.len());
        let mut previous_end = None;
        for part in fstring.value.iter() {
            if let Some(end) = previous_end {
                // the text between parts keeps its line breaks and comments
                let gap = &source[TextRange::new(end, part.start())];
                out.push_str(" +");
                out.push_str(if gap.is_empty() { " " } else { gap });
            }
            match part {
                FStringPart::Literal(string) => out.push_str(&source[string.range()]),
                FStringPart::FString(fstring) => out.push_str(&lower_part(&source, fstring)),
            }
            previous_end = Some(part.end());
        }
        Ok(if fstring.value.iter().nth(1).is_some() {
            format!("({out})")
        } else {
            out
        })
    }
}

/// Maps a range in the parenthesized text back onto the literal.
fn unwrapped(range: TextRange) -> TextRange {
    range.checked_sub(TextSize::new(1)).unwrap_or_default()
}

fn lower_part(source: &str, fstring: &ast::FString) -> String {
    let text = &source[fstring.range()];
    let quote_start = text.find(['\'', '"']).unwrap_or(0);
    let prefix: String = text[..quote_start]
        .chars()
        .filter(|c| !matches!(c, 'f' | 'F'))
        .collect();
    let body = &text[quote_start..];
    let quote = if body.starts_with("'''") || body.starts_with("\"\"\"") {
        &body[..3]
    } else {
        &body[..1]
    };

    let mut format = String::new();
    let mut args = Vec::new();
    lower_elements(source, &fstring.elements, quote, &mut format, &mut args);
    format!("{prefix}{quote}{format}{quote}.format({})", args.join(", "))
}

fn lower_elements(
    source: &str,
    elements: &ast::InterpolatedStringElements,
    quote: &str,
    format: &mut String,
    args: &mut Vec<String>,
) {
    for element in elements.iter() {
        match element {
            InterpolatedStringElement::Literal(literal) => format.push_str(&source[literal.range()]),
            InterpolatedStringElement::Interpolation(interpolation) => {
                let expression = &source[interpolation.expression.range()];
                let mut conversion = interpolation.conversion;
                if let Some(debug) = &interpolation.debug_text {
                    let shown = format!("{}{expression}{}", debug.leading, debug.trailing);
                    if shown.contains(['\\', '\n', '\r']) || shown.contains(&quote[..1]) {
                        // not representable inside this literal; passed as an argument
                        format.push_str("{}");
                        args.push(string_literal(&shown));
                    } else {
                        format.push_str(&escape_braces(&shown));
                    }
                    if conversion == ConversionFlag::None && interpolation.format_spec.is_none() {
                        conversion = ConversionFlag::Repr;
                    }
                }
                format.push('{');
                format.push_str(match conversion {
                    ConversionFlag::None => "",
                    ConversionFlag::Str => "!s",
                    ConversionFlag::Repr => "!r",
                    ConversionFlag::Ascii => "!a",
                });
                args.push(format!("({expression})"));
                if let Some(spec) = &interpolation.format_spec {
                    format.push(':');
                    lower_elements(source, &spec.elements, quote, format, args);
                }
                format.push('}');
            }
        }
    }
}

fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

/// Single-quoted Python string literal whose value is `text`.
fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}
