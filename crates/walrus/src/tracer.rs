//! Conversion tracing.
//!
//! The converter is generic over a [`ConvertTracer`], so the default
//! [`NoopTracer`] compiles away entirely while [`StderrTracer`] and
//! [`RecordingTracer`] report what a run synthesized.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | No-op (library default) |
//! | [`StderrTracer`] | Human-readable log on stderr |
//! | [`RecordingTracer`] | Event list for tests and post-mortems |
//!
//! ```
//! use walrus::{ConvertConfig, Converter, RecordingTracer, TraceEvent, UidGenerator};
//!
//! let mut converter = Converter::new(ConvertConfig::default())
//!     .with_uids(UidGenerator::sequential())
//!     .with_tracer(RecordingTracer::new());
//! converter.convert("print(x := 1)\n").unwrap();
//! assert!(converter.tracer().events().iter().any(|e| matches!(e, TraceEvent::Wrapper { .. })));
//! ```

use crate::scope::ScopeKeyword;

/// Event captured by [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A conversion context started.
    EnterContext {
        /// Which kind of body the context converts.
        kind: &'static str,
        /// Nesting depth of the context.
        level: usize,
    },
    /// An assignment expression was replaced by a wrapper call.
    Wrapper {
        name: String,
        uid: String,
        keyword: ScopeKeyword,
    },
    /// An assignment expression in a class body was routed to the class namespace.
    ClassSlot {
        class_name: String,
        /// Mangled member name used as the namespace key.
        name: String,
        uid: String,
    },
    /// A lambda was lifted into an auxiliary function.
    Lambda { uid: String },
    /// A formatted string literal was lowered before conversion.
    LiteralRewrite {
        /// Length of the original literal in bytes.
        len: usize,
    },
    /// A context emitted its declarations.
    Emit {
        bindings: usize,
        functions: usize,
        lambdas: usize,
    },
}

/// Hooks called while a conversion runs.
///
/// All methods default to no-ops; implementations override the ones they need.
pub trait ConvertTracer: std::fmt::Debug {
    /// Called when a context starts converting a body.
    #[inline(always)]
    fn on_enter_context(&mut self, _kind: &'static str, _level: usize) {}

    /// Called for every wrapper function scheduled for emission.
    #[inline(always)]
    fn on_wrapper(&mut self, _name: &str, _uid: &str, _keyword: ScopeKeyword) {}

    /// Called the first time a class body stores a member through its namespace.
    #[inline(always)]
    fn on_class_slot(&mut self, _class_name: &str, _name: &str, _uid: &str) {}

    /// Called when a lambda is lifted into an auxiliary function.
    #[inline(always)]
    fn on_lambda(&mut self, _uid: &str) {}

    /// Called before a formatted string literal is handed to the literal rewriter.
    #[inline(always)]
    fn on_literal_rewrite(&mut self, _len: usize) {}

    /// Called when a standalone context inserts its declarations.
    #[inline(always)]
    fn on_emit(&mut self, _bindings: usize, _functions: usize, _lambdas: usize) {}
}

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl ConvertTracer for NoopTracer {}

/// Tracer that prints a human-readable log to stderr.
///
/// Output format:
/// ```text
/// [walrus] context block level=0
/// [walrus]   wrapper chunk uid=0 (global)
/// [walrus]   emit bindings=1 functions=1 lambdas=0
/// ```
#[derive(Debug)]
pub struct StderrTracer {
    /// Maximum number of lines to print. None = unlimited.
    limit: Option<usize>,
    count: usize,
}

impl StderrTracer {
    #[must_use]
    pub fn new() -> Self {
        Self { limit: None, count: 0 }
    }

    /// Creates a tracer that stops printing after `limit` lines.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            count: 0,
        }
    }

    fn line(&mut self, message: std::fmt::Arguments<'_>) {
        if self.limit.is_some_and(|limit| self.count >= limit) {
            return;
        }
        eprintln!("[walrus] {message}");
        self.count += 1;
        if let Some(limit) = self.limit
            && self.count == limit
        {
            eprintln!("[walrus] --- trace limit reached ({limit} lines) ---");
        }
    }
}

impl Default for StderrTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertTracer for StderrTracer {
    fn on_enter_context(&mut self, kind: &'static str, level: usize) {
        self.line(format_args!("context {kind} level={level}"));
    }

    fn on_wrapper(&mut self, name: &str, uid: &str, keyword: ScopeKeyword) {
        self.line(format_args!("  wrapper {name} uid={uid} ({keyword})"));
    }

    fn on_class_slot(&mut self, class_name: &str, name: &str, uid: &str) {
        self.line(format_args!("  class slot {class_name}.{name} uid={uid}"));
    }

    fn on_lambda(&mut self, uid: &str) {
        self.line(format_args!("  lambda uid={uid}"));
    }

    fn on_literal_rewrite(&mut self, len: usize) {
        self.line(format_args!("  literal rewrite len={len}"));
    }

    fn on_emit(&mut self, bindings: usize, functions: usize, lambdas: usize) {
        self.line(format_args!(
            "  emit bindings={bindings} functions={functions} lambdas={lambdas}"
        ));
    }
}

/// Tracer that records every event in memory.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }
}

impl ConvertTracer for RecordingTracer {
    fn on_enter_context(&mut self, kind: &'static str, level: usize) {
        self.events.push(TraceEvent::EnterContext { kind, level });
    }

    fn on_wrapper(&mut self, name: &str, uid: &str, keyword: ScopeKeyword) {
        self.events.push(TraceEvent::Wrapper {
            name: name.to_owned(),
            uid: uid.to_owned(),
            keyword,
        });
    }

    fn on_class_slot(&mut self, class_name: &str, name: &str, uid: &str) {
        self.events.push(TraceEvent::ClassSlot {
            class_name: class_name.to_owned(),
            name: name.to_owned(),
            uid: uid.to_owned(),
        });
    }

    fn on_lambda(&mut self, uid: &str) {
        self.events.push(TraceEvent::Lambda { uid: uid.to_owned() });
    }

    fn on_literal_rewrite(&mut self, len: usize) {
        self.events.push(TraceEvent::LiteralRewrite { len });
    }

    fn on_emit(&mut self, bindings: usize, functions: usize, lambdas: usize) {
        self.events.push(TraceEvent::Emit {
            bindings,
            functions,
            lambdas,
        });
    }
}
