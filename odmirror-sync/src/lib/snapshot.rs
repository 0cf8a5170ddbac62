use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use futures::future::BoxFuture;
use odmirror::Metadata;
use tokio_stream::StreamExt;

use crate::storage;

/// Every entry found on disk under the local root at the start of a run,
/// keyed by path relative to that root.
///
/// Entries are only ever removed after [LocalTree::build]: each one is
/// popped by the reconciler when the remote side has it, the remaining
/// ones are orphans.
#[derive(Debug, Default)]
pub struct LocalTree {
    entries: BTreeMap<Utf8PathBuf, Metadata>,
}

impl LocalTree {
    /// Walks the whole local storage, creating its root first if needed.
    pub async fn build<L>(local: &L) -> odmirror::Result<Self>
    where
        L: storage::Storage,
    {
        local.mkdir(Utf8Path::new(""), true).await?;

        let mut entries = BTreeMap::new();
        walk(local, &mut entries, Utf8Path::new("")).await?;
        log::info!("{} local entries found in {}", entries.len(), local.root());

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns the entry at `path`.
    pub fn pop(&mut self, path: &Utf8Path) -> Option<Metadata> {
        self.entries.remove(path)
    }

    /// Consumes the tree, returning the remaining entries children first.
    pub fn into_remaining(self) -> Vec<Metadata> {
        let mut entries: Vec<Metadata> = self.entries.into_values().collect();
        entries.sort_by(|a, b| deepest_first(a.path(), b.path()));
        entries
    }
}

#[cfg(test)]
impl FromIterator<Metadata> for LocalTree {
    fn from_iter<T: IntoIterator<Item = Metadata>>(iter: T) -> Self {
        let entries = iter
            .into_iter()
            .map(|md| (md.path().to_owned(), md))
            .collect();
        Self { entries }
    }
}

fn deepest_first(a: &Utf8Path, b: &Utf8Path) -> std::cmp::Ordering {
    odmirror::path_depth(b)
        .cmp(&odmirror::path_depth(a))
        .then_with(|| b.cmp(a))
}

fn walk<'a, L>(
    local: &'a L,
    entries: &'a mut BTreeMap<Utf8PathBuf, Metadata>,
    dir: &'a Utf8Path,
) -> BoxFuture<'a, odmirror::Result<()>>
where
    L: storage::Storage,
{
    Box::pin(async move {
        let children = local.dir_entries(dir);
        tokio::pin!(children);

        while let Some(child) = children.next().await {
            let child = child?;
            let path = child.path().to_owned();
            let is_dir = child.is_dir();
            entries.insert(path.clone(), child);
            if is_dir {
                walk(local, &mut *entries, &path).await?;
            }
        }
        Ok(())
    })
}
