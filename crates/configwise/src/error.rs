//! Configuration error types.
//!
//! Every public operation reports failures as a [`ConfigError`]: the
//! operation that failed ([`Op`]) plus what went wrong ([`ErrorKind`]).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::decode::DecodeError;
use crate::flag::FlagError;

/// Public operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Building a [`Configurer`](crate::Configurer).
    New,
    /// [`Configurer::unmarshal_key`](crate::Configurer::unmarshal_key).
    UnmarshalKey,
    /// [`Configurer::unmarshal`](crate::Configurer::unmarshal).
    Unmarshal,
    /// [`Configurer::overwrite`](crate::Configurer::overwrite).
    Overwrite,
}

impl Op {
    /// Short tag used in error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::UnmarshalKey => "unmarshal key",
            Self::Unmarshal => "unmarshal",
            Self::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong.
#[derive(Error, Debug)]
pub enum ErrorKind {
    /// No environment prefix was configured for a file-backed configurer.
    #[error("prefix should be set")]
    MissingPrefix,

    /// Raw configuration bytes were supplied without a format tag.
    #[error("raw configuration supplied without a format")]
    MissingFormat,

    /// The format tag or file extension is not one we can parse.
    #[error("unsupported configuration format: {format}")]
    UnsupportedFormat {
        /// The rejected format tag or extension.
        format: String,
    },

    /// No configuration source was found.
    #[error("configuration file not found (searched: {})", display_paths(.searched))]
    SourceNotFound {
        /// Every location that was tried.
        searched: Vec<PathBuf>,
    },

    /// The configuration file exists but could not be read.
    #[error("failed to read configuration file: {}", .path.display())]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration source is not valid for its format.
    #[error("failed to parse {format} configuration: {message}")]
    Parse {
        /// Format the source was parsed as.
        format: &'static str,
        /// Parser message.
        message: String,
    },

    /// The running executable could not be located for the default search.
    #[error("failed to locate the running executable: {0}")]
    Executable(#[source] std::io::Error),

    /// A `key=value` override could not be parsed.
    #[error(transparent)]
    Flag(#[from] FlagError),

    /// Decoding into the target type failed.
    #[error(transparent)]
    Decode(DecodeError),

    /// A value selected for UUID conversion is not a valid UUID.
    #[error("invalid identifier: {0}")]
    Identifier(DecodeError),

    /// A key path cannot address a node in the tree.
    #[error("invalid key `{key}`")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },
}

impl From<DecodeError> for ErrorKind {
    fn from(err: DecodeError) -> Self {
        if err.is_identifier() {
            Self::Identifier(err)
        } else {
            Self::Decode(err)
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error returned by every fallible [`Configurer`](crate::Configurer) operation.
///
/// The message already includes the [`ErrorKind`], so the error chain
/// continues at the kind's own cause.
#[derive(Debug)]
pub struct ConfigError {
    op: Op,
    kind: ErrorKind,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configurer: {} -> {}", self.op, self.kind)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl ConfigError {
    /// Wrap `kind` with the operation tag `op`.
    pub fn new(op: Op, kind: impl Into<ErrorKind>) -> Self {
        Self {
            op,
            kind: kind.into(),
        }
    }

    /// The operation that failed.
    pub fn op(&self) -> Op {
        self.op
    }

    /// The underlying failure.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Consume the error, returning the underlying failure.
    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    pub(crate) fn missing_prefix() -> Self {
        Self::new(Op::New, ErrorKind::MissingPrefix)
    }

    pub(crate) fn missing_format() -> Self {
        Self::new(Op::New, ErrorKind::MissingFormat)
    }

    pub(crate) fn source_not_found(searched: Vec<PathBuf>) -> Self {
        Self::new(Op::New, ErrorKind::SourceNotFound { searched })
    }

    pub(crate) fn invalid_key(key: impl Into<String>) -> Self {
        Self::new(Op::Overwrite, ErrorKind::InvalidKey { key: key.into() })
    }
}
