//! Conversion configuration.
//!
//! The newline sequence and indentation unit are resolved by the caller (the
//! CLI detects them per file) before a run starts; the converter only checks
//! that the values it receives are usable.

use std::{fmt, str::FromStr};

use ruff_python_ast::PythonVersion;

/// Newline sequence used for every line the converter inserts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, serde::Serialize, serde::Deserialize)]
pub enum LineSeparator {
    #[default]
    #[strum(serialize = "LF")]
    Lf,
    #[strum(serialize = "CRLF")]
    CrLf,
    #[strum(serialize = "CR")]
    Cr,
}

impl LineSeparator {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }
}

impl FromStr for LineSeparator {
    type Err = ConfigError;

    /// Accepts the names `LF`, `CRLF` and `CR` in any case, or the literal sequences.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "\n" => return Ok(Self::Lf),
            "\r\n" => return Ok(Self::CrLf),
            "\r" => return Ok(Self::Cr),
            _ => {}
        }
        match s.to_ascii_uppercase().as_str() {
            "LF" => Ok(Self::Lf),
            "CRLF" => Ok(Self::CrLf),
            "CR" => Ok(Self::Cr),
            _ => Err(ConfigError::LineSeparator(s.to_owned())),
        }
    }
}

/// One level of indentation: a run of spaces or a single tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Indentation(String);

impl Indentation {
    pub fn new(unit: impl Into<String>) -> Result<Self, ConfigError> {
        let unit = unit.into();
        let valid = unit == "\t" || (!unit.is_empty() && unit.bytes().all(|b| b == b' '));
        if valid {
            Ok(Self(unit))
        } else {
            Err(ConfigError::Indentation(unit))
        }
    }

    #[must_use]
    pub fn spaces(width: usize) -> Self {
        Self(" ".repeat(width.max(1)))
    }

    #[must_use]
    pub fn tab() -> Self {
        Self("\t".to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(&self) -> Result<(), ConfigError> {
        Self::new(self.0.clone()).map(drop)
    }
}

impl Default for Indentation {
    fn default() -> Self {
        Self::spaces(4)
    }
}

impl FromStr for Indentation {
    type Err = ConfigError;

    /// Accepts `t`/`tab`/a literal tab, a positive number of spaces, or a raw
    /// string of spaces.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "t" | "tab" | "\t" => return Ok(Self::tab()),
            _ => {}
        }
        if let Ok(width) = s.parse::<usize>() {
            return if width == 0 {
                Err(ConfigError::Indentation(s.to_owned()))
            } else {
                Ok(Self::spaces(width))
            };
        }
        Self::new(s)
    }
}

impl fmt::Display for Indentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == "\t" {
            f.write_str("tab")
        } else {
            write!(f, "{} spaces", self.0.len())
        }
    }
}

/// Grammar revision the input is parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct SourceVersion {
    pub major: u8,
    pub minor: u8,
}

impl SourceVersion {
    /// Oldest revision with assignment expressions.
    pub const PY38: Self = Self { major: 3, minor: 8 };
    /// Newest revision the parser knows about.
    pub const LATEST: Self = Self { major: 3, minor: 14 };

    #[must_use]
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    fn validate(self) -> Result<(), ConfigError> {
        if self.major == 3 && self.minor <= Self::LATEST.minor {
            Ok(())
        } else {
            Err(ConfigError::Version(self.to_string()))
        }
    }

    pub(crate) fn to_python_version(self) -> PythonVersion {
        PythonVersion {
            major: self.major,
            minor: self.minor,
        }
    }
}

impl Default for SourceVersion {
    fn default() -> Self {
        Self::new(3, 13)
    }
}

impl FromStr for SourceVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ConfigError::Version(s.to_owned());
        let (major, minor) = s.trim().split_once('.').ok_or_else(err)?;
        let version = Self::new(major.parse().map_err(|_| err())?, minor.parse().map_err(|_| err())?);
        version.validate()?;
        Ok(version)
    }
}

impl fmt::Display for SourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Settings for a conversion run.
///
/// Built with the chained setters:
///
/// ```
/// use walrus::{ConvertConfig, Indentation, LineSeparator};
///
/// let config = ConvertConfig::new()
///     .linesep(LineSeparator::CrLf)
///     .indentation(Indentation::tab())
///     .pep8(false);
/// assert_eq!(config.linesep.as_str(), "\r\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConvertConfig {
    /// Newline sequence for inserted lines.
    pub linesep: LineSeparator,
    /// Indentation unit for bodies of inserted functions.
    pub indentation: Indentation,
    /// Grammar revision used to parse the input.
    pub version: SourceVersion,
    /// Pad inserted blocks with the blank lines PEP 8 asks for.
    pub pep8: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            linesep: LineSeparator::default(),
            indentation: Indentation::default(),
            version: SourceVersion::default(),
            pep8: true,
        }
    }
}

impl ConvertConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn linesep(mut self, linesep: LineSeparator) -> Self {
        self.linesep = linesep;
        self
    }

    #[must_use]
    pub fn indentation(mut self, indentation: Indentation) -> Self {
        self.indentation = indentation;
        self
    }

    #[must_use]
    pub fn version(mut self, version: SourceVersion) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn pep8(mut self, pep8: bool) -> Self {
        self.pep8 = pep8;
        self
    }

    /// Re-checks values that may have bypassed the parsing constructors,
    /// e.g. after deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indentation.validate()?;
        self.version.validate()
    }
}

/// A configuration value the converter cannot use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    LineSeparator(String),
    Indentation(String),
    Version(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LineSeparator(value) => {
                write!(f, "invalid line separator {value:?}, expected one of LF, CRLF or CR")
            }
            Self::Indentation(value) => write!(
                f,
                "invalid indentation {value:?}, expected 't', 'tab', a positive number or a string of spaces"
            ),
            Self::Version(value) => write!(f, "unsupported Python version {value:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_separator_names_and_literals() {
        assert_eq!("lf".parse::<LineSeparator>(), Ok(LineSeparator::Lf));
        assert_eq!("CRLF".parse::<LineSeparator>(), Ok(LineSeparator::CrLf));
        assert_eq!("\r".parse::<LineSeparator>(), Ok(LineSeparator::Cr));
        assert_eq!(
            "NL".parse::<LineSeparator>(),
            Err(ConfigError::LineSeparator("NL".to_owned()))
        );
        assert_eq!(LineSeparator::CrLf.to_string(), "CRLF");
    }

    #[test]
    fn indentation_forms() {
        assert_eq!("t".parse::<Indentation>().unwrap().as_str(), "\t");
        assert_eq!("TAB".parse::<Indentation>().unwrap().as_str(), "\t");
        assert_eq!("2".parse::<Indentation>().unwrap().as_str(), "  ");
        assert_eq!("   ".parse::<Indentation>().unwrap().as_str(), "   ");
        assert!("0".parse::<Indentation>().is_err());
        assert!(" \t".parse::<Indentation>().is_err());
        assert!("".parse::<Indentation>().is_err());
    }

    #[test]
    fn version_parsing() {
        assert_eq!("3.8".parse::<SourceVersion>(), Ok(SourceVersion::PY38));
        assert_eq!("3.7".parse::<SourceVersion>(), Ok(SourceVersion::new(3, 7)));
        assert!("2.7".parse::<SourceVersion>().is_err());
        assert!("3.99".parse::<SourceVersion>().is_err());
        assert!("three".parse::<SourceVersion>().is_err());
    }

    #[test]
    fn validate_catches_deserialized_values() {
        let config = ConvertConfig {
            indentation: Indentation("x".to_owned()),
            ..ConvertConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Indentation("x".to_owned())));
        assert_eq!(ConvertConfig::default().validate(), Ok(()));
    }
}
