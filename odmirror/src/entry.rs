//! Remote entries as yielded by a remote listing.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque reference used to fetch the bytes of a remote file.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new<S: Into<String>>(locator: S) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// download locators are pre-authenticated URLs and must not reach the logs
impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Locator(..)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File {
        mtime: DateTime<Utc>,
        locator: Locator,
    },
    Directory,
    /// Neither a file nor a directory (e.g. a package or a remote item
    /// of a shape we do not know).
    Unrecognized,
}

/// A child entry of a remote listing.
///
/// `name` is optional because listing payloads are not trusted:
/// a nameless entry is malformed and is skipped by the walker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: Option<String>,
    pub kind: EntryKind,
}

impl Entry {
    pub fn file<S: Into<String>>(name: S, mtime: DateTime<Utc>, locator: Locator) -> Self {
        Self {
            name: Some(name.into()),
            kind: EntryKind::File { mtime, locator },
        }
    }

    pub fn directory<S: Into<String>>(name: S) -> Self {
        Self {
            name: Some(name.into()),
            kind: EntryKind::Directory,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }
}

#[test]
fn locator_debug_is_redacted() {
    let loc = Locator::new("https://example.com/download?token=secret");
    assert_eq!(format!("{loc:?}"), "Locator(..)");
    assert_eq!(loc.as_str(), "https://example.com/download?token=secret");
}
