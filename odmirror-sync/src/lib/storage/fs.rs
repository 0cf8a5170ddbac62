use async_stream::try_stream;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use futures::Stream;
use odmirror::Metadata;
use tokio::{
    fs::{self, DirEntry},
    io,
};

#[derive(Debug, Clone)]
pub struct FileSystem {
    root: Utf8PathBuf,
}

impl FileSystem {
    /// Build a new filesystem storage.
    /// The root does not need to exist yet, but must be an absolute path.
    pub fn new<P>(root: P) -> anyhow::Result<Self>
    where
        P: AsRef<Utf8Path>,
    {
        let root = root.as_ref();
        if !root.is_absolute() {
            anyhow::bail!("expected an absolute path, got '{root}'");
        }
        log::info!("Initializing FS storage in {root}");

        Ok(FileSystem {
            root: root.to_owned(),
        })
    }

    fn fs_path(&self, path: &Utf8Path) -> Utf8PathBuf {
        debug_assert!(path.is_relative(), "must be relative to storage root");
        if path.as_str().is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }

    async fn do_write(
        &self,
        fs_path: &Utf8Path,
        mtime: DateTime<Utc>,
        data: impl io::AsyncRead + Send,
    ) -> odmirror::Result<u64> {
        tokio::pin!(data);

        let mut f = fs::File::create(&fs_path).await?;
        let size = io::copy(&mut data, &mut f).await?;

        let f = f.into_std().await;
        f.set_modified(mtime.into())?;
        Ok(size)
    }
}

impl super::DirEntries for FileSystem {
    fn dir_entries(
        &self,
        parent_path: &Utf8Path,
    ) -> impl Stream<Item = odmirror::Result<Metadata>> + Send {
        let fs_base = self.fs_path(parent_path);
        log::trace!("listing entries of {fs_base}");
        try_stream! {
            let mut read_dir = fs::read_dir(&fs_base).await?;
            loop {
                match read_dir.next_entry().await? {
                    None => break,
                    Some(direntry) => {
                        yield map_direntry(parent_path, &direntry).await?;
                    }
                }
            }
        }
    }
}

impl super::MkDir for FileSystem {
    async fn mkdir(&self, path: &Utf8Path, parents: bool) -> odmirror::Result<()> {
        let fs_path = self.fs_path(path);
        log::info!("mkdir {}{}", if parents { "-p " } else { "" }, fs_path);
        if parents {
            fs::create_dir_all(&fs_path).await?;
        } else {
            fs::create_dir(&fs_path).await?;
        }
        Ok(())
    }
}

impl super::WriteFile for FileSystem {
    async fn write_file(
        &self,
        path: &Utf8Path,
        mtime: DateTime<Utc>,
        data: impl io::AsyncRead + Send,
    ) -> odmirror::Result<Metadata> {
        let fs_path = self.fs_path(path);
        log::trace!("writing {fs_path}");
        match fs::symlink_metadata(&fs_path).await {
            Ok(md) if md.is_dir() => odmirror::io_bail!("{path} is a directory: {fs_path}"),
            // links and special files are replaced, never written through
            Ok(md) if !md.is_file() => {
                log::info!("replacing special file {fs_path}");
                fs::remove_file(&fs_path).await?;
            }
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        match self.do_write(&fs_path, mtime, data).await {
            Ok(size) => Ok(Metadata::Regular {
                path: path.to_owned(),
                size,
                mtime,
            }),
            Err(err) => {
                log::warn!("removing partially written {fs_path}");
                if let Err(rm_err) = fs::remove_file(&fs_path).await {
                    if rm_err.kind() != std::io::ErrorKind::NotFound {
                        log::error!("could not remove {fs_path}: {rm_err}");
                    }
                }
                Err(err)
            }
        }
    }
}

impl super::Delete for FileSystem {
    async fn delete(&self, path: &Utf8Path) -> odmirror::Result<()> {
        let fs_path = self.fs_path(path);
        log::info!("deleting {fs_path}");
        let md = match fs::symlink_metadata(&fs_path).await {
            Ok(md) => md,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        if md.is_dir() {
            let mut entries = fs::read_dir(&fs_path).await?;
            let entry = entries.next_entry().await?;
            if entry.is_some() {
                odmirror::io_bail!("{path} is a non-empty folder");
            }
            fs::remove_dir(&fs_path).await?;
        } else {
            fs::remove_file(&fs_path).await?;
        }
        Ok(())
    }

    async fn delete_all(&self, path: &Utf8Path) -> odmirror::Result<()> {
        let fs_path = self.fs_path(path);
        log::info!("deleting recursively {fs_path}");
        let md = match fs::symlink_metadata(&fs_path).await {
            Ok(md) => md,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        if md.is_dir() {
            fs::remove_dir_all(&fs_path).await?;
        } else {
            fs::remove_file(&fs_path).await?;
        }
        Ok(())
    }
}

impl super::Storage for FileSystem {
    fn root(&self) -> &Utf8Path {
        &self.root
    }
}

async fn map_direntry(parent_path: &Utf8Path, direntry: &DirEntry) -> odmirror::Result<Metadata> {
    let file_name = String::from_utf8(direntry.file_name().into_encoded_bytes())?;
    let path = parent_path.join(&file_name);
    // symlinks are not followed
    let metadata = direntry.metadata().await?;
    map_metadata(path, &metadata)
}

fn map_metadata(path: Utf8PathBuf, metadata: &std::fs::Metadata) -> odmirror::Result<Metadata> {
    let metadata = if metadata.is_file() {
        Metadata::Regular {
            path,
            size: metadata.len(),
            mtime: metadata.modified().map(|mt| mt.into())?,
        }
    } else if metadata.is_dir() {
        Metadata::Directory { path }
    } else {
        Metadata::Special { path }
    };

    Ok(metadata)
}
