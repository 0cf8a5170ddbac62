use camino::Utf8Path;
use chrono::{DateTime, Utc};
use futures::{Future, Stream};
use odmirror::Metadata;
use tokio::io;

pub mod fs;
pub mod graph;
pub mod remote;

/// Paths given to the local storage traits are relative to the storage root.
/// The empty path designates the root itself.
pub trait DirEntries {
    fn dir_entries(&self, parent_path: &Utf8Path)
        -> impl Stream<Item = odmirror::Result<Metadata>> + Send;
}

pub trait MkDir {
    fn mkdir(&self, path: &Utf8Path, parents: bool)
        -> impl Future<Output = odmirror::Result<()>> + Send;
}

pub trait WriteFile {
    /// Creates or truncates the file at `path`, fills it with `data`
    /// and sets its modification time to `mtime`.
    /// If anything fails, the partially written file is removed.
    fn write_file(
        &self,
        path: &Utf8Path,
        mtime: DateTime<Utc>,
        data: impl io::AsyncRead + Send,
    ) -> impl Future<Output = odmirror::Result<Metadata>> + Send;
}

/// A trait to delete files or folders
pub trait Delete {
    /// Deletes the file or folder pointed to by `path`.
    /// Only empty folders can be deleted.
    fn delete(&self, path: &Utf8Path) -> impl Future<Output = odmirror::Result<()>> + Send;

    /// Deletes `path` and, if it is a folder, everything below it.
    fn delete_all(&self, path: &Utf8Path) -> impl Future<Output = odmirror::Result<()>> + Send;
}

/// A trait for the local, path-based storage
pub trait Storage: DirEntries + MkDir + WriteFile + Delete + Send + Sync + 'static {
    /// Where the storage lives on the file system.
    fn root(&self) -> &Utf8Path;
}
