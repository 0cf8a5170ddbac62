use camino::Utf8Path;
use futures::{Future, Stream};
use odmirror::{Entry, Locator};
use tokio::io;

pub trait DirEntries {
    /// Lists the children of `parent_path`, relative to the remote root.
    /// A folder without a children collection yields an empty stream.
    fn dir_entries(&self, parent_path: &Utf8Path)
        -> impl Stream<Item = odmirror::Result<Entry>> + Send;
}

pub trait ReadFile {
    fn read_file(
        &self,
        locator: &Locator,
    ) -> impl Future<Output = odmirror::Result<impl io::AsyncRead + Send>> + Send;
}

pub trait Storage: DirEntries + ReadFile + Send + Sync + 'static {}
