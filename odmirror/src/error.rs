use std::{error, fmt, io, string::FromUtf8Error};

use camino::{FromPathBufError, Utf8PathBuf};

/// Kind of a node on either side of a type conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Directory => f.write_str("directory"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Error {
    Utf8(String),
    Io(String),
    Auth(String),
    Api(String),
    Config(String),
    /// A download could not complete. The partial destination was removed.
    Transfer {
        path: Utf8PathBuf,
        reason: String,
    },
    /// The same path is a file on one side and a directory on the other.
    /// The local path was deleted and the run must stop.
    TypeConflict {
        path: Utf8PathBuf,
        local: NodeKind,
        remote: NodeKind,
    },
    Other(String),
}

impl Error {
    pub fn is_type_conflict(&self) -> bool {
        matches!(self, Self::TypeConflict { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8(msg) => write!(f, "Non UTF-8 string: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
            Self::Auth(msg) => write!(f, "Authorization error: {msg}"),
            Self::Api(msg) => write!(f, "API error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Transfer { path, reason } => write!(f, "Download of {path} failed: {reason}"),
            Self::TypeConflict {
                path,
                local,
                remote,
            } => write!(
                f,
                "Entry type changed at {path}: local {local} is now a remote {remote}"
            ),
            Self::Other(msg) => f.write_str(msg),
        }
    }
}

impl error::Error for Error {}

impl From<FromUtf8Error> for Error {
    fn from(value: FromUtf8Error) -> Self {
        Self::Utf8(String::from_utf8_lossy(&value.into_bytes()).to_string())
    }
}

impl From<FromPathBufError> for Error {
    fn from(value: FromPathBufError) -> Self {
        Self::Utf8(value.as_path().as_os_str().to_string_lossy().to_string())
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Api(value.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(format!("{value:#}"))
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Other(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[macro_export]
macro_rules! io_bail {
    ($($t:tt)*) => {
        return ::core::result::Result::Err($crate::Error::Io(format!($($t)*)));
    };
}

#[macro_export]
macro_rules! api_bail {
    ($($t:tt)*) => {
        return ::core::result::Result::Err($crate::Error::Api(format!($($t)*)));
    };
}

#[macro_export]
macro_rules! config_bail {
    ($($t:tt)*) => {
        return ::core::result::Result::Err($crate::Error::Config(format!($($t)*)));
    };
}

#[macro_export]
macro_rules! api_error {
    ($($t:tt)*) => {
        $crate::Error::Api(format!($($t)*))
    };
}

#[macro_export]
macro_rules! auth_error {
    ($($t:tt)*) => {
        $crate::Error::Auth(format!($($t)*))
    };
}
