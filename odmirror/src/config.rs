use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    /// Drive endpoint, either absolute or relative to [GRAPH_BASE_URL],
    /// e.g. `/drives/{drive-id}` or `/sites/{site-id}/drive`.
    pub api_base: String,
    /// Remote folder, relative to the drive root, that is mirrored.
    pub parent_folder: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl GraphConfig {
    pub fn drive_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        if base.starts_with("https://") || base.starts_with("http://") {
            base.to_string()
        } else {
            format!("{GRAPH_BASE_URL}/{}", base.trim_start_matches('/'))
        }
    }

    pub fn parent_folder(&self) -> &str {
        self.parent_folder.trim_matches('/')
    }

    fn check(&self) -> crate::Result<()> {
        if self.tenant_id.is_empty() || self.client_id.is_empty() || self.client_secret.is_empty()
        {
            crate::config_bail!("missing auth data");
        }
        if self.api_base.is_empty() {
            crate::config_bail!("missing drive API base");
        }
        if self.parent_folder().is_empty() {
            crate::config_bail!("missing parent folder");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RemoteConfig {
    Graph(GraphConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub local_dir: Utf8PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_list: Option<Utf8PathBuf>,
    pub remote: RemoteConfig,
}

impl Config {
    pub async fn load_from_file(path: &Utf8Path) -> anyhow::Result<Self> {
        let config_json = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read config from {path}"))?;
        let config_json = std::str::from_utf8(&config_json)?;
        let config: Config = serde_json::from_str(config_json)
            .with_context(|| format!("Failed to parse config from {path}"))?;
        Ok(config)
    }

    /// Checks that everything needed for a run is present.
    pub fn check(&self) -> crate::Result<()> {
        if self.local_dir.as_str().is_empty() {
            crate::config_bail!("missing output path");
        }
        match &self.remote {
            RemoteConfig::Graph(graph) => graph.check(),
        }
    }
}
