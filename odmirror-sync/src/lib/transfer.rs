use camino::Utf8Path;
use chrono::{DateTime, Utc};
use odmirror::{Locator, Metadata};

use crate::storage::{self, remote};

/// Streams the remote file at `locator` into the local `path` and sets
/// its modification time.
///
/// If the transfer fails, nothing is left at `path`.
pub async fn download<R, L>(
    remote: &R,
    local: &L,
    locator: &Locator,
    path: &Utf8Path,
    mtime: DateTime<Utc>,
) -> odmirror::Result<Metadata>
where
    R: remote::Storage,
    L: storage::Storage,
{
    log::info!("-> downloading {path}");
    let res = match remote.read_file(locator).await {
        Ok(data) => local.write_file(path, mtime, data).await,
        Err(err) => Err(err),
    };
    match res {
        Ok(md) => {
            log::debug!("--> finished, {} bytes written", md.size().unwrap_or_default());
            Ok(md)
        }
        Err(err) => {
            log::error!("--> failed!! {err}");
            Err(odmirror::Error::Transfer {
                path: path.to_owned(),
                reason: err.to_string(),
            })
        }
    }
}
