use std::{
    collections::{HashMap, HashSet},
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use futures::{stream, Stream};
use odmirror::{Entry, EntryKind, Locator};
use odmirror_sync::storage::remote;
use tokio::io;

#[derive(Debug, Default)]
struct Inner {
    children: HashMap<Utf8PathBuf, Vec<Entry>>,
    content: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    reads: Vec<String>,
}

/// In-memory remote tree.
///
/// Clones share the same tree, so a test can keep a handle and change
/// the remote between two runs.
#[derive(Debug, Clone, Default)]
pub struct Stub {
    inner: Arc<Mutex<Inner>>,
}

fn split(path: &str) -> (Utf8PathBuf, String) {
    let path = Utf8Path::new(path);
    let parent = path.parent().unwrap_or(Utf8Path::new("")).to_owned();
    let name = path.file_name().unwrap().to_string();
    (parent, name)
}

fn locator(path: &str) -> Locator {
    Locator::new(format!("stub://{path}"))
}

impl Stub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw entry to the listing of `parent`.
    pub fn add_entry(&self, parent: &str, entry: Entry) -> &Self {
        let mut inner = self.inner.lock().unwrap();
        inner
            .children
            .entry(parent.into())
            .or_default()
            .push(entry);
        self
    }

    pub fn add_dir(&self, path: &str) -> &Self {
        let (parent, name) = split(path);
        self.add_entry(parent.as_str(), Entry::directory(name))
    }

    pub fn add_file(&self, path: &str, mtime: DateTime<Utc>, content: &str) -> &Self {
        let (parent, name) = split(path);
        self.inner
            .lock()
            .unwrap()
            .content
            .insert(locator(path).as_str().to_string(), content.as_bytes().to_vec());
        self.add_entry(parent.as_str(), Entry::file(name, mtime, locator(path)))
    }

    /// Changes the mtime and content of an existing file, keeping its listing position.
    pub fn update_file(&self, path: &str, mtime: DateTime<Utc>, content: &str) {
        let (parent, name) = split(path);
        let mut inner = self.inner.lock().unwrap();
        let entry = inner
            .children
            .get_mut(&parent)
            .and_then(|children| children.iter_mut().find(|e| e.name() == Some(name.as_str())))
            .unwrap();
        entry.kind = EntryKind::File {
            mtime,
            locator: locator(path),
        };
        inner
            .content
            .insert(locator(path).as_str().to_string(), content.as_bytes().to_vec());
    }

    /// Downloads of `path` fail after a few bytes.
    pub fn fail_download(&self, path: &str) {
        let locator = locator(path).as_str().to_string();
        self.inner.lock().unwrap().failing.insert(locator);
    }

    pub fn heal_download(&self, path: &str) {
        let locator = locator(path).as_str().to_string();
        self.inner.lock().unwrap().failing.remove(&locator);
    }

    /// Paths of the files read so far, in order.
    pub fn reads(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .reads
            .iter()
            .map(|l| l.trim_start_matches("stub://").to_string())
            .collect()
    }
}

impl remote::DirEntries for Stub {
    fn dir_entries(
        &self,
        parent_path: &Utf8Path,
    ) -> impl Stream<Item = odmirror::Result<Entry>> + Send {
        let children = self
            .inner
            .lock()
            .unwrap()
            .children
            .get(parent_path)
            .cloned()
            .unwrap_or_default();
        stream::iter(children.into_iter().map(Ok))
    }
}

struct FailingRead;

impl io::AsyncRead for FailingRead {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut io::ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Poll::Ready(Err(std::io::Error::other("connection reset by stub")))
    }
}

impl remote::ReadFile for Stub {
    async fn read_file(&self, locator: &Locator) -> odmirror::Result<impl io::AsyncRead + Send> {
        let (data, failing) = {
            let mut inner = self.inner.lock().unwrap();
            inner.reads.push(locator.as_str().to_string());
            (
                inner.content.get(locator.as_str()).cloned(),
                inner.failing.contains(locator.as_str()),
            )
        };
        let Some(data) = data else {
            odmirror::api_bail!("no content for {}", locator.as_str());
        };

        let read: Box<dyn io::AsyncRead + Send + Unpin> = if failing {
            let partial = data[..data.len() / 2].to_vec();
            Box::new(io::AsyncReadExt::chain(std::io::Cursor::new(partial), FailingRead))
        } else {
            Box::new(std::io::Cursor::new(data))
        };
        Ok(read)
    }
}

impl remote::Storage for Stub {}
