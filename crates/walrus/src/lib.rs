#![doc = include_str!("../../../README.md")]

mod config;
mod context;
mod converter;
mod error;
mod legality;
mod literal;
pub mod mangle;
pub mod scope;
mod syntax;
mod template;
pub mod tracer;
mod uid;
pub mod whitespace;

pub use crate::{
    config::{ConfigError, ConvertConfig, Indentation, LineSeparator, SourceVersion},
    converter::{Converter, convert},
    error::{ConvertError, ErrorKind, SourceLocation},
    literal::{FormatLowering, LiteralRewriter},
    syntax::{CompoundKind, NodeKind, SourceTree, SuiteLayout, SyntaxNode},
    tracer::{ConvertTracer, NoopTracer, RecordingTracer, StderrTracer, TraceEvent},
    uid::UidGenerator,
};
