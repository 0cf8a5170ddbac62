use std::fmt;

use camino::Utf8PathBuf;

use crate::{
    diff::DiffLog,
    reconcile::Reconciler,
    snapshot::LocalTree,
    storage::{self, remote},
    sweep,
    walk::RemoteWalker,
};

/// Counters of a mirror run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Remote entries processed, malformed ones included.
    pub visited: usize,
    pub unchanged: usize,
    pub downloaded: usize,
    pub created: usize,
    pub deleted: usize,
    pub unrecognized: usize,
    pub malformed: usize,
    /// Local paths of the files that could not be downloaded.
    pub failed: Vec<Utf8PathBuf>,
}

impl Summary {
    /// Whether every transfer succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} downloaded, {} folders created, {} unchanged, {} deleted",
            self.downloaded, self.created, self.unchanged, self.deleted
        )?;
        if !self.failed.is_empty() {
            write!(f, ", {} failed", self.failed.len())?;
        }
        if self.unrecognized + self.malformed > 0 {
            write!(f, ", {} skipped", self.unrecognized + self.malformed)?;
        }
        Ok(())
    }
}

/// Makes a local folder an exact copy of a remote one.
#[derive(Debug)]
pub struct Mirror<L, R> {
    local: L,
    remote: R,
    diff_list: Option<Utf8PathBuf>,
}

impl<L, R> Mirror<L, R>
where
    L: storage::Storage,
    R: remote::Storage,
{
    pub fn new(local: L, remote: R) -> Self {
        Self {
            local,
            remote,
            diff_list: None,
        }
    }

    /// Record the absolute path of each downloaded file in `path`.
    pub fn with_diff_list<P: Into<Utf8PathBuf>>(mut self, path: P) -> Self {
        self.diff_list = Some(path.into());
        self
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    /// Runs one full mirror pass.
    ///
    /// The local tree is scanned first, then the remote is walked and each
    /// entry reconciled, then whatever the remote did not mention is deleted.
    /// A type conflict aborts the run before the deletion phase.
    pub async fn run(&self) -> odmirror::Result<Summary> {
        let mut tree = LocalTree::build(&self.local).await?;

        let mut diff = match &self.diff_list {
            Some(path) => Some(DiffLog::create(path).await?),
            None => None,
        };

        let mut reconciler = Reconciler::new(&self.local, &self.remote, &mut tree, diff.as_mut());
        RemoteWalker::new(&self.remote)
            .traverse(&mut reconciler)
            .await?;
        let mut summary = reconciler.into_summary();
        log::info!("{} remote items processed", summary.visited);

        summary.deleted = sweep::sweep(&self.local, tree).await?;

        if summary.is_clean() {
            log::info!("mirror complete: {summary}");
        } else {
            for path in summary.failed.iter() {
                log::warn!("not downloaded: {path}");
            }
            log::warn!("mirror incomplete: {summary}");
        }
        Ok(summary)
    }
}
