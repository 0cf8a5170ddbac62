use camino::Utf8Path;
use chrono::{DateTime, Utc};
use odmirror::{error::NodeKind, EntryKind, Locator, Metadata};

use crate::{
    diff::DiffLog,
    mirror::Summary,
    snapshot::LocalTree,
    storage::{self, remote},
    transfer,
    walk::Visitor,
};

/// What has to be done to bring one local path in line with the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<'a> {
    /// Already in sync.
    Skip,
    Download {
        locator: &'a Locator,
        mtime: DateTime<Utc>,
    },
    MkDir,
    /// File on one side, directory on the other.
    Conflict { local: NodeKind, remote: NodeKind },
    /// The remote entry is neither a file nor a directory.
    Ignore,
}

pub fn decide<'a>(local: Option<&Metadata>, remote: &'a EntryKind) -> Action<'a> {
    match (remote, local) {
        (EntryKind::File { .. }, Some(Metadata::Directory { .. })) => Action::Conflict {
            local: NodeKind::Directory,
            remote: NodeKind::File,
        },
        (EntryKind::File { mtime, .. }, Some(local))
            if local
                .mtime()
                .is_some_and(|local_mtime| odmirror::same_mtime(*mtime, local_mtime)) =>
        {
            Action::Skip
        }
        (EntryKind::File { mtime, locator }, _) => Action::Download {
            locator,
            mtime: *mtime,
        },
        (EntryKind::Directory, Some(Metadata::Directory { .. })) => Action::Skip,
        (EntryKind::Directory, Some(_)) => Action::Conflict {
            local: NodeKind::File,
            remote: NodeKind::Directory,
        },
        (EntryKind::Directory, None) => Action::MkDir,
        (EntryKind::Unrecognized, _) => Action::Ignore,
    }
}

/// Reconciles each visited remote entry against the local tree.
pub struct Reconciler<'a, L, R> {
    local: &'a L,
    remote: &'a R,
    tree: &'a mut LocalTree,
    diff: Option<&'a mut DiffLog>,
    summary: Summary,
}

impl<'a, L, R> Reconciler<'a, L, R>
where
    L: storage::Storage,
    R: remote::Storage,
{
    pub fn new(
        local: &'a L,
        remote: &'a R,
        tree: &'a mut LocalTree,
        diff: Option<&'a mut DiffLog>,
    ) -> Self {
        Self {
            local,
            remote,
            tree,
            diff,
            summary: Summary::default(),
        }
    }

    pub fn into_summary(self) -> Summary {
        self.summary
    }

    async fn download(
        &mut self,
        path: &Utf8Path,
        locator: &Locator,
        mtime: DateTime<Utc>,
    ) -> odmirror::Result<()> {
        match transfer::download(self.remote, self.local, locator, path, mtime).await {
            Ok(_) => {
                self.summary.downloaded += 1;
                if let Some(diff) = self.diff.as_deref_mut() {
                    diff.append(&self.local.root().join(path)).await?;
                }
            }
            Err(err) => {
                // the file stays absent and is fetched again by the next run
                log::error!("{err}");
                self.summary.failed.push(path.to_owned());
            }
        }
        Ok(())
    }
}

impl<'a, L, R> Visitor for Reconciler<'a, L, R>
where
    L: storage::Storage,
    R: remote::Storage,
{
    async fn visit(
        &mut self,
        parent: &Utf8Path,
        name: &str,
        kind: &EntryKind,
    ) -> odmirror::Result<()> {
        self.summary.visited += 1;
        let path = parent.join(name);
        log::debug!("> processing {path}");

        let local = self.tree.pop(&path);
        match decide(local.as_ref(), kind) {
            Action::Skip => {
                self.summary.unchanged += 1;
            }
            Action::Download { locator, mtime } => {
                self.download(&path, locator, mtime).await?;
            }
            Action::MkDir => {
                self.local.mkdir(&path, false).await?;
                log::info!("-> created {path}");
                self.summary.created += 1;
            }
            Action::Conflict { local, remote } => {
                return Err(emergency_delete(self.local, &path, local, remote).await);
            }
            Action::Ignore => {
                log::error!("!!! UNEXPECTED ITEM TYPE {name} in '{parent}'");
                self.summary.unrecognized += 1;
            }
        }
        Ok(())
    }

    fn malformed(&mut self, _parent: &Utf8Path) {
        self.summary.visited += 1;
        self.summary.malformed += 1;
    }
}

async fn emergency_delete<L>(
    storage: &L,
    path: &Utf8Path,
    local: NodeKind,
    remote: NodeKind,
) -> odmirror::Error
where
    L: storage::Storage,
{
    log::error!(
        "ENTRY TYPE CHANGED, DELETING AND QUITTING {}",
        storage.root().join(path)
    );
    if let Err(err) = storage.delete_all(path).await {
        log::error!("could not delete {path}: {err}");
    }
    odmirror::Error::TypeConflict {
        path: path.to_owned(),
        local,
        remote,
    }
}
