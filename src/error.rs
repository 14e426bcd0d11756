//! Error type shared by the library and both binaries.
//!
//! Every variant maps onto one of the `sysexits(3)` codes so the binaries can
//! report failures the way `fmt`-style tools traditionally do.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Command line usage error.
pub const EX_USAGE: u8 = 64;
/// Input file could not be opened.
pub const EX_NOINPUT: u8 = 66;
/// Operating system error (thread spawn, worker panic).
pub const EX_OSERR: u8 = 71;
/// Output file could not be created.
pub const EX_CANTCREAT: u8 = 73;
/// Read or write failure.
pub const EX_IOERR: u8 = 74;
/// Malformed configuration.
pub const EX_CONFIG: u8 = 78;

/// Failures reported by `wrap` and `wrapc`.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad flag or argument.
    #[error("usage: {0}")]
    Usage(String),

    /// Malformed alias file.
    #[error("{}:{line}:{column}: {message}", path.display())]
    Config {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// Input file missing or unreadable.
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Output file could not be created.
    #[error("cannot create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Short read or write on a stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Thread spawn failure or a panicking task.
    #[error("OS error: {0}")]
    Os(String),

    /// Malformed control frame on an internal pipe.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A pipeline task exited with an error.
    #[error("{task} failed: {source}")]
    Child {
        task: &'static str,
        #[source]
        source: Box<Error>,
    },
}

/// Result type alias for `wrap` operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Process exit status for this error.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => EX_USAGE,
            Self::Config { .. } => EX_CONFIG,
            Self::Open { .. } => EX_NOINPUT,
            Self::Create { .. } => EX_CANTCREAT,
            Self::Io(_) | Self::Protocol(_) => EX_IOERR,
            Self::Os(_) => EX_OSERR,
            Self::Child { source, .. } => source.exit_code(),
        }
    }

    /// Pick the error with the highest exit status.
    ///
    /// Returns `None` when `errors` is empty.
    pub fn worst<I>(errors: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        errors.into_iter().max_by_key(Error::exit_code)
    }

    pub(crate) fn config(
        path: impl Into<PathBuf>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Config {
            path: path.into(),
            line,
            column,
            message: message.into(),
        }
    }
}
