use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod config;
pub mod entry;
pub mod error;
pub mod loc;

pub use crate::config::Config;
pub use crate::entry::{Entry, EntryKind, Locator};
pub use crate::error::{Error, Result};

/// Metadata of an entry already materialized in the local tree.
/// `path` is relative to the local root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metadata {
    Directory {
        path: Utf8PathBuf,
    },
    Regular {
        path: Utf8PathBuf,
        size: u64,
        mtime: DateTime<Utc>,
    },
    Special {
        path: Utf8PathBuf,
    },
}

impl Metadata {
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Directory { path, .. } => path,
            Self::Regular { path, .. } => path,
            Self::Special { path, .. } => path,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }

    pub fn size(&self) -> Option<u64> {
        match self {
            Self::Regular { size, .. } => Some(*size),
            _ => None,
        }
    }

    pub fn mtime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Regular { mtime, .. } => Some(*mtime),
            _ => None,
        }
    }
}

/// Modification times are compared with millisecond precision,
/// which is what the remote API reports.
pub fn same_mtime(lhs: DateTime<Utc>, rhs: DateTime<Utc>) -> bool {
    lhs.timestamp_millis() == rhs.timestamp_millis()
}

/// Number of normal components of a relative path.
pub fn path_depth(path: &Utf8Path) -> usize {
    path.components()
        .filter(|c| matches!(c, camino::Utf8Component::Normal(_)))
        .count()
}
