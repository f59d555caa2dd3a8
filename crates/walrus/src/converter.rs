//! Public conversion entry points.

use crate::{
    config::ConvertConfig,
    context::{Context, ContextKind, Placement},
    error::ConvertError,
    literal::{FormatLowering, LiteralRewriter},
    syntax::SourceTree,
    tracer::{ConvertTracer, NoopTracer},
    uid::UidGenerator,
};

/// Rewrites assignment expressions out of Python source.
///
/// A converter owns the configuration, the uid generator, the tracer and
/// the literal rewriter. Every call to [`Converter::convert`] is one run and
/// restarts the uid generator, so a module converts to the same text no
/// matter what was converted before it.
///
/// ```
/// use walrus::{ConvertConfig, Converter, UidGenerator};
///
/// let mut converter = Converter::new(ConvertConfig::default()).with_uids(UidGenerator::sequential());
/// let output = converter.convert("if (n := len(items)) > 10:\n    print(n)\n").unwrap();
/// assert!(output.contains("if (_walrus_wrapper_n_0(len(items))) > 10:\n    print(n)\n"));
/// assert!(output.contains("    global n\n"));
/// ```
#[derive(Debug)]
pub struct Converter<Tr: ConvertTracer = NoopTracer> {
    pub(crate) config: ConvertConfig,
    pub(crate) uids: UidGenerator,
    pub(crate) tracer: Tr,
    pub(crate) rewriter: Box<dyn LiteralRewriter>,
}

impl Converter<NoopTracer> {
    #[must_use]
    pub fn new(config: ConvertConfig) -> Self {
        Self {
            config,
            uids: UidGenerator::default(),
            tracer: NoopTracer,
            rewriter: Box::new(FormatLowering),
        }
    }
}

impl<Tr: ConvertTracer> Converter<Tr> {
    /// Replaces the tracer, keeping everything else.
    #[must_use]
    pub fn with_tracer<T: ConvertTracer>(self, tracer: T) -> Converter<T> {
        Converter {
            config: self.config,
            uids: self.uids,
            tracer,
            rewriter: self.rewriter,
        }
    }

    #[must_use]
    pub fn with_uids(mut self, uids: UidGenerator) -> Self {
        self.uids = uids;
        self
    }

    #[must_use]
    pub fn with_rewriter(mut self, rewriter: impl LiteralRewriter + 'static) -> Self {
        self.rewriter = Box::new(rewriter);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    #[must_use]
    pub fn tracer(&self) -> &Tr {
        &self.tracer
    }

    #[must_use]
    pub fn into_tracer(self) -> Tr {
        self.tracer
    }

    /// Converts one module.
    ///
    /// Text without assignment expressions comes back unchanged. On error
    /// nothing is returned; the caller keeps its original text.
    pub fn convert(&mut self, source: &str) -> Result<String, ConvertError> {
        self.config.validate()?;
        self.uids.reset();
        let tree = SourceTree::parse(source, self.config.version)?;
        if !tree.root().has_named_expr() {
            return Ok(source.to_owned());
        }
        let converted = Context::convert(self, source, tree.root(), ContextKind::Plain, Placement::module())?;
        Ok(converted.text)
    }
}

/// Converts `source` with a fresh [`Converter`].
///
/// ```
/// let config = walrus::ConvertConfig::default();
/// assert_eq!(walrus::convert("x = 1\n", &config).unwrap(), "x = 1\n");
/// ```
pub fn convert(source: &str, config: &ConvertConfig) -> Result<String, ConvertError> {
    Converter::new(config.clone()).convert(source)
}
