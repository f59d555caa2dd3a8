use std::{fmt, num::NonZeroUsize, path::PathBuf, thread};

use walrus::{ConfigError, Indentation, LineSeparator, SourceVersion};

pub const USAGE: &str = "\
usage: walrus [options] <python source files and folders...>

Back-port compiler for Python assignment expressions.

options:
  -h, --help                show this help message and exit
  -V, --version             show program's version number and exit
  -q, --quiet               run in quiet mode (WALRUS_QUIET)
  -j, --jobs N              number of files converted in parallel (CPU count)

archive options:
  -na, --no-archive         do not archive original files
  -p, --archive-path PATH   path to archive original files (./archive)

convert options:
  -v, --python VERSION      convert against Python version (WALRUS_VERSION, 3.13)
  -s, --linesep SEP         line separator, LF, CRLF or CR (WALRUS_LINESEP, detected)
  -t, --indentation INDENT  indentation unit, 't'/'tab' or a number of spaces
                            (WALRUS_INDENTATION, detected)
  -nl, --no-linting         do not pad inserted code with PEP 8 blank lines (WALRUS_LINTING)

Set WALRUS_TRACE to log every rewrite on stderr.";

const DEFAULT_ARCHIVE: &str = "archive";

/// What the command line asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Version,
    Convert(Options),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub quiet: bool,
    /// Directory receiving copies of the originals; `None` disables archiving.
    pub archive: Option<PathBuf>,
    pub version: SourceVersion,
    /// Forced newline sequence; detected per file when unset.
    pub linesep: Option<LineSeparator>,
    /// Forced indentation unit; detected per file when unset.
    pub indentation: Option<Indentation>,
    pub pep8: bool,
    pub jobs: NonZeroUsize,
    pub trace: bool,
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum OptionsError {
    MissingValue(String),
    UnknownOption(String),
    InvalidJobs(String),
    Config(ConfigError),
    NoPaths,
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingValue(option) => write!(f, "option {option} expects a value"),
            Self::UnknownOption(option) => write!(f, "unrecognized option {option}"),
            Self::InvalidJobs(value) => write!(f, "invalid job count {value:?}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::NoPaths => write!(f, "no source files or folders given"),
        }
    }
}

impl From<ConfigError> for OptionsError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Interprets an environment flag; unset or empty variables give `None`.
fn env_flag(value: Option<String>) -> Option<bool> {
    let value = value?;
    match value.trim().to_ascii_lowercase().as_str() {
        "" => None,
        "0" | "false" | "no" | "off" => Some(false),
        _ => Some(true),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

impl Command {
    /// Parses `args` (without the program name). `env` looks up environment
    /// variables, which supply defaults for options not given on the line.
    pub fn parse(args: &[String], env: impl Fn(&str) -> Option<String>) -> Result<Self, OptionsError> {
        let mut quiet = env_flag(env("WALRUS_QUIET")).unwrap_or(false);
        let mut archive = Some(PathBuf::from(DEFAULT_ARCHIVE));
        let mut archive_path = None;
        let mut version = non_empty(env("WALRUS_VERSION"));
        let mut linesep = non_empty(env("WALRUS_LINESEP"));
        let mut indentation = non_empty(env("WALRUS_INDENTATION"));
        let mut pep8 = env_flag(env("WALRUS_LINTING")).unwrap_or(true);
        let mut jobs = None;
        let mut paths = Vec::new();

        let mut args = args.iter();
        while let Some(arg) = args.next() {
            let mut value = |option: &str| {
                args.next()
                    .cloned()
                    .ok_or_else(|| OptionsError::MissingValue(option.to_owned()))
            };
            match arg.as_str() {
                "-h" | "--help" => return Ok(Self::Help),
                "-V" | "--version" => return Ok(Self::Version),
                "-q" | "--quiet" => quiet = true,
                "-na" | "--no-archive" => archive = None,
                "-p" | "--archive-path" => archive_path = Some(PathBuf::from(value(arg)?)),
                "-v" | "--python" => version = Some(value(arg)?),
                "-s" | "--linesep" => linesep = Some(value(arg)?),
                "-t" | "--indentation" => indentation = Some(value(arg)?),
                "-nl" | "--no-linting" => pep8 = false,
                "-j" | "--jobs" => jobs = Some(value(arg)?),
                "--" => paths.extend(args.by_ref().map(PathBuf::from)),
                option if option.starts_with('-') && option.len() > 1 => {
                    return Err(OptionsError::UnknownOption(option.to_owned()));
                }
                path => paths.push(PathBuf::from(path)),
            }
        }

        if paths.is_empty() {
            return Err(OptionsError::NoPaths);
        }
        let jobs = match jobs {
            Some(value) => value
                .parse::<NonZeroUsize>()
                .map_err(|_| OptionsError::InvalidJobs(value))?,
            None => thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
        };
        let options = Options {
            quiet,
            archive: archive.map(|default| archive_path.unwrap_or(default)),
            version: version.map_or(Ok(SourceVersion::default()), |value| value.parse())?,
            linesep: linesep.map(|value| value.parse()).transpose()?,
            indentation: indentation.map(|value| value.parse()).transpose()?,
            pep8,
            jobs,
            trace: env_flag(env("WALRUS_TRACE")).unwrap_or(false),
            paths,
        };
        Ok(Self::Convert(options))
    }
}
