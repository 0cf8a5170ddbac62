use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, TimeZone, Utc};

pub fn temp_path(prefix: Option<&str>, ext: Option<&str>) -> Utf8PathBuf {
    use rand::{distributions::Alphanumeric, Rng};

    let mut filename = String::new();
    if let Some(prefix) = prefix {
        filename.push_str(prefix);
        filename.push('-');
    }
    let rnd: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect();
    filename.push_str(&rnd);
    if let Some(ext) = ext {
        filename.push('.');
        filename.push_str(ext);
    }
    let mut p = std::env::temp_dir();
    p.push(filename);
    p.try_into().unwrap()
}

pub fn ms(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

/// Writes `content` to `path`, creating parent folders, and sets its mtime.
pub fn write_file(path: &Utf8Path, content: &str, mtime: DateTime<Utc>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content).with_context(|| format!("writing {path}"))?;
    let f = std::fs::File::options().write(true).open(path)?;
    f.set_modified(mtime.into())?;
    Ok(())
}

pub fn file_content(path: &Utf8Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {path}"))
}

pub fn file_mtime(path: &Utf8Path) -> anyhow::Result<DateTime<Utc>> {
    let md = std::fs::metadata(path)?;
    Ok(md.modified()?.into())
}
