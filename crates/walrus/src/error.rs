//! Errors raised by a conversion run.
//!
//! A run either yields a complete replacement text or fails with one of the
//! variants below; there is no partial output.

use std::{borrow::Cow, fmt};

use ruff_text_size::TextRange;

use crate::config::ConfigError;

/// One-based line and column of a position in the source being converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    /// Converts a byte offset into a line/column pair.
    ///
    /// Columns count characters, not bytes, so non-ASCII identifiers before
    /// the offset do not skew the reported position.
    #[must_use]
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let before = source.get(..offset).unwrap_or(source);
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        Self {
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Category of a [`ConvertError`], used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
pub enum ErrorKind {
    SyntaxError,
    UnsupportedError,
    ContextError,
    ConfigurationError,
}

/// Errors that can abort a conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The source does not conform to the selected grammar revision, or an
    /// assignment expression appears where the language forbids it.
    Syntax {
        msg: Cow<'static, str>,
        location: SourceLocation,
    },
    /// Valid source whose meaning the rewritten code cannot reproduce.
    Unsupported {
        msg: Cow<'static, str>,
        location: SourceLocation,
    },
    /// A traversal invariant was violated. Always a bug in the converter.
    Context { msg: Cow<'static, str> },
    /// A configuration value was rejected before traversal started.
    Configuration(ConfigError),
}

impl ConvertError {
    pub(crate) fn syntax(msg: impl Into<Cow<'static, str>>, source: &str, range: TextRange) -> Self {
        Self::Syntax {
            msg: msg.into(),
            location: SourceLocation::from_offset(source, range.start().to_usize()),
        }
    }

    pub(crate) fn unsupported(msg: impl Into<Cow<'static, str>>, source: &str, range: TextRange) -> Self {
        Self::Unsupported {
            msg: msg.into(),
            location: SourceLocation::from_offset(source, range.start().to_usize()),
        }
    }

    pub(crate) fn context(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Context { msg: msg.into() }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax { .. } => ErrorKind::SyntaxError,
            Self::Unsupported { .. } => ErrorKind::UnsupportedError,
            Self::Context { .. } => ErrorKind::ContextError,
            Self::Configuration(_) => ErrorKind::ConfigurationError,
        }
    }

    /// Source position of a syntax or unsupported-construct error, `None`
    /// for the other kinds.
    #[must_use]
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::Syntax { location, .. } | Self::Unsupported { location, .. } => Some(*location),
            _ => None,
        }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { msg, location } | Self::Unsupported { msg, location } => {
                write!(f, "{} at {location}: {msg}", self.kind())
            }
            Self::Context { msg } => write!(f, "{}: {msg}", self.kind()),
            Self::Configuration(err) => write!(f, "{}: {err}", self.kind()),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Configuration(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for ConvertError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_counts_lines_and_characters() {
        let source = "a = 1\nb = 'é' + (c := 2)\n";
        let offset = source.find("(c").unwrap();
        assert_eq!(SourceLocation::from_offset(source, offset), SourceLocation { line: 2, column: 11 });
        assert_eq!(SourceLocation::from_offset(source, 0), SourceLocation { line: 1, column: 1 });
    }

    #[test]
    fn display_includes_kind() {
        let err = ConvertError::context("suite visited outside a compound statement");
        assert_eq!(err.to_string(), "ContextError: suite visited outside a compound statement");
        assert_eq!(err.kind(), ErrorKind::ContextError);
        assert_eq!(err.location(), None);
    }
}
