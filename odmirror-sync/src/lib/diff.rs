use camino::Utf8Path;
use tokio::{fs, io::AsyncWriteExt};

/// Text file listing the local paths of the files downloaded during a run,
/// one per line, in the order the downloads completed.
#[derive(Debug)]
pub struct DiffLog {
    file: fs::File,
}

impl DiffLog {
    /// Creates the file, truncating any previous content.
    pub async fn create(path: &Utf8Path) -> odmirror::Result<Self> {
        log::info!("writing downloaded paths to {path}");
        let file = fs::File::create(path).await?;
        Ok(Self { file })
    }

    pub async fn append(&mut self, path: &Utf8Path) -> odmirror::Result<()> {
        let line = format!("{path}\n");
        self.file.write_all(line.as_bytes()).await?;
        // lines must survive an aborted run
        self.file.flush().await?;
        Ok(())
    }
}
