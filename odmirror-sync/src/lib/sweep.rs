use crate::{snapshot::LocalTree, storage};

/// Deletes every local entry left in `tree` once reconciliation is over.
///
/// Entries are removed children first, so folders are empty when their
/// turn comes. Returns the number of deleted entries.
pub async fn sweep<L>(local: &L, tree: LocalTree) -> odmirror::Result<usize>
where
    L: storage::Storage,
{
    if tree.is_empty() {
        return Ok(0);
    }
    log::info!("{} orphan entries to delete", tree.len());

    let mut deleted = 0;
    for orphan in tree.into_remaining() {
        log::info!("> deleting orphan {}", local.root().join(orphan.path()));
        local.delete(orphan.path()).await?;
        deleted += 1;
    }
    Ok(deleted)
}
