use camino::Utf8Path;
use futures::{future::BoxFuture, Future};
use odmirror::EntryKind;
use tokio_stream::StreamExt;

use crate::storage::remote;

/// Called by [RemoteWalker] for every remote entry, parents first.
pub trait Visitor: Send {
    /// `parent` is the path of the listed folder, relative to the remote root.
    /// An error stops the whole traversal.
    fn visit(
        &mut self,
        parent: &Utf8Path,
        name: &str,
        kind: &EntryKind,
    ) -> impl Future<Output = odmirror::Result<()>> + Send;

    /// Called instead of [Visitor::visit] for an entry without a usable name.
    fn malformed(&mut self, _parent: &Utf8Path) {}
}

/// Depth-first, pre-order traversal of a remote tree.
///
/// Children are visited one at a time, in listing order.
/// A folder is visited before its content.
pub struct RemoteWalker<'a, R> {
    remote: &'a R,
}

impl<'a, R> RemoteWalker<'a, R>
where
    R: remote::Storage,
{
    pub fn new(remote: &'a R) -> Self {
        Self { remote }
    }

    pub async fn traverse<V>(&self, visitor: &mut V) -> odmirror::Result<()>
    where
        V: Visitor,
    {
        self.traverse_from(visitor, Utf8Path::new("")).await
    }

    pub fn traverse_from<'b, V>(
        &'b self,
        visitor: &'b mut V,
        from: &'b Utf8Path,
    ) -> BoxFuture<'b, odmirror::Result<()>>
    where
        V: Visitor,
    {
        Box::pin(async move {
            let children = self.remote.dir_entries(from);
            tokio::pin!(children);

            while let Some(child) = children.next().await {
                let child = child?;
                let Some(name) = child.name() else {
                    log::error!("!!! MISSING ITEM NAME in '{from}'");
                    visitor.malformed(from);
                    continue;
                };
                if !is_single_component(name) {
                    log::error!("!!! INVALID ITEM NAME {name:?} in '{from}'");
                    visitor.malformed(from);
                    continue;
                }
                visitor.visit(from, name, &child.kind).await?;
                if child.is_dir() {
                    let path = from.join(name);
                    self.traverse_from(&mut *visitor, &path).await?;
                }
            }
            Ok(())
        })
    }
}

/// A name must address exactly one child of its parent folder.
fn is_single_component(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
