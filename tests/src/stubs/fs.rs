use std::sync::{Arc, Mutex};

use camino::Utf8Path;
use chrono::{DateTime, Utc};
use futures::Stream;
use odmirror_sync::storage::{
    self, fs::FileSystem, Delete as _, DirEntries as _, MkDir as _, Storage as _, WriteFile as _,
};
use tokio::io;

/// Calls received by the local storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    MkDir(String),
    Write(String),
    Delete(String),
    DeleteAll(String),
}

/// File system storage recording every mutating call.
/// The root is removed when the stub is dropped.
#[derive(Debug)]
pub struct Stub {
    inner: FileSystem,
    ops: Arc<Mutex<Vec<Op>>>,
}

impl Stub {
    pub fn new(root: &Utf8Path) -> anyhow::Result<Self> {
        let inner = FileSystem::new(root)?;
        Ok(Self {
            inner,
            ops: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Returns the recorded operations and forgets them.
    pub fn take_ops(&self) -> Vec<Op> {
        std::mem::take(&mut *self.ops.lock().unwrap())
    }

    fn record(&self, op: Op) {
        self.ops.lock().unwrap().push(op);
    }
}

impl Drop for Stub {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(self.inner.root());
    }
}

impl storage::DirEntries for Stub {
    fn dir_entries(
        &self,
        parent_path: &Utf8Path,
    ) -> impl Stream<Item = odmirror::Result<odmirror::Metadata>> + Send {
        self.inner.dir_entries(parent_path)
    }
}

impl storage::MkDir for Stub {
    async fn mkdir(&self, path: &Utf8Path, parents: bool) -> odmirror::Result<()> {
        self.record(Op::MkDir(path.to_string()));
        self.inner.mkdir(path, parents).await
    }
}

impl storage::WriteFile for Stub {
    async fn write_file(
        &self,
        path: &Utf8Path,
        mtime: DateTime<Utc>,
        data: impl io::AsyncRead + Send,
    ) -> odmirror::Result<odmirror::Metadata> {
        self.record(Op::Write(path.to_string()));
        self.inner.write_file(path, mtime, data).await
    }
}

impl storage::Delete for Stub {
    async fn delete(&self, path: &Utf8Path) -> odmirror::Result<()> {
        self.record(Op::Delete(path.to_string()));
        self.inner.delete(path).await
    }

    async fn delete_all(&self, path: &Utf8Path) -> odmirror::Result<()> {
        self.record(Op::DeleteAll(path.to_string()));
        self.inner.delete_all(path).await
    }
}

impl storage::Storage for Stub {
    fn root(&self) -> &Utf8Path {
        self.inner.root()
    }
}
