use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use odmirror_sync::{Mirror, Summary};

use crate::{
    stubs::{fs, remote},
    utils,
};

pub struct Harness {
    pub mirror: Mirror<fs::Stub, remote::Stub>,
    pub remote: remote::Stub,
    root: Utf8PathBuf,
    diff_list: Utf8PathBuf,
}

impl Harness {
    /// The local root is not created: the first run does it.
    pub fn new(remote: remote::Stub) -> Self {
        let root = utils::temp_path(Some("odmirror-fs"), None);
        let diff_list = utils::temp_path(Some("odmirror-diff"), Some("txt"));
        let local = fs::Stub::new(&root).unwrap();
        let mirror = Mirror::new(local, remote.clone()).with_diff_list(diff_list.clone());
        Self {
            mirror,
            remote,
            root,
            diff_list,
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn local_path(&self, path: &str) -> Utf8PathBuf {
        self.root.join(path)
    }

    pub async fn run(&self) -> odmirror::Result<Summary> {
        self.mirror.run().await
    }

    pub fn take_ops(&self) -> Vec<fs::Op> {
        self.mirror.local().take_ops()
    }

    pub fn seed_dir(&self, path: &str) {
        std::fs::create_dir_all(self.local_path(path)).unwrap();
    }

    pub fn seed_file(&self, path: &str, content: &str, mtime: DateTime<Utc>) {
        utils::write_file(&self.local_path(path), content, mtime).unwrap();
    }

    #[cfg(unix)]
    pub fn seed_symlink(&self, path: &str, target: &Utf8Path) {
        let link = self.local_path(path);
        if let Some(parent) = link.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::os::unix::fs::symlink(target, link).unwrap();
    }

    pub fn is_symlink(&self, path: &str) -> bool {
        std::fs::symlink_metadata(self.local_path(path))
            .map(|md| md.file_type().is_symlink())
            .unwrap_or(false)
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.local_path(path).is_dir()
    }

    pub fn has_file_with_content(&self, path: &str, content: &str) -> bool {
        let path = self.local_path(path);
        path.is_file() && utils::file_content(&path).unwrap() == content
    }

    pub fn exists(&self, path: &str) -> bool {
        std::fs::symlink_metadata(self.local_path(path)).is_ok()
    }

    pub fn mtime(&self, path: &str) -> DateTime<Utc> {
        utils::file_mtime(&self.local_path(path)).unwrap()
    }

    /// Lines of the diff list written by the last run.
    pub fn diff_lines(&self) -> Vec<String> {
        utils::file_content(&self.diff_list)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.diff_list);
    }
}
