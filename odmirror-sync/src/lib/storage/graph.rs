//! Microsoft Graph drive storage (OneDrive / SharePoint document libraries).

use std::sync::Arc;

use async_stream::try_stream;
use camino::Utf8Path;
use futures::Stream;
use odmirror::{config::GraphConfig, Entry, EntryKind, Locator};
use tokio::io;
use url::Url;

use crate::oauth2::GetToken;

#[derive(Clone)]
pub struct Graph<A> {
    client: reqwest::Client,
    auth: Arc<A>,
    drive_url: String,
    parent_folder: String,
    user_agent: String,
}

impl<A> Graph<A>
where
    A: GetToken,
{
    pub fn new(auth: A, client: reqwest::Client, config: &GraphConfig) -> Self {
        let user_agent = format!("odmirror/{}", env!("CARGO_PKG_VERSION"));
        let drive = Self {
            client,
            auth: Arc::new(auth),
            drive_url: config.drive_url(),
            parent_folder: config.parent_folder().to_string(),
            user_agent,
        };
        log::info!(
            "Mirroring '{}' from drive {}",
            drive.parent_folder,
            drive.drive_url
        );
        drive
    }
}

impl<A> super::remote::DirEntries for Graph<A>
where
    A: GetToken,
{
    fn dir_entries(
        &self,
        parent_path: &Utf8Path,
    ) -> impl Stream<Item = odmirror::Result<Entry>> + Send {
        try_stream! {
            let mut url = utils::children_url(&self.drive_url, &self.parent_folder, parent_path)
                .map_err(to_api_error)?;
            log::debug!("querying {}", url.path());
            loop {
                let list = self.children_page(url.clone()).await?;
                match list.value {
                    Some(serde_json::Value::Array(items)) => {
                        for item in items {
                            match serde_json::from_value::<api::DriveItem>(item) {
                                Ok(item) => {
                                    yield map_item(item);
                                }
                                Err(err) => {
                                    log::error!("!!! unreadable item in {parent_path}: {err}");
                                }
                            }
                        }
                    }
                    _ => {
                        log::debug!("no children collection for '{parent_path}'");
                    }
                }
                match list.next_link {
                    Some(next) => {
                        url = Url::parse(&next).map_err(|err| odmirror::api_error!("{err}"))?;
                    }
                    None => break,
                }
            }
        }
    }
}

impl<A> super::remote::ReadFile for Graph<A>
where
    A: GetToken,
{
    async fn read_file(&self, locator: &Locator) -> odmirror::Result<impl io::AsyncRead + Send> {
        use futures::TryStreamExt;

        let res = self
            .client
            .get(locator.as_str())
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|err| odmirror::api_error!("download request failed: {err}"))?;
        let res = utils::check_response("GET", "download URL", res)
            .await
            .map_err(to_api_error)?;
        if let Some(len) = res.content_length() {
            use byte_unit::{Byte, UnitType};
            let len = Byte::from_u64(len).get_appropriate_unit(UnitType::Binary);
            log::debug!("--> starting ({len:#.2})");
        }

        let bytes = res
            .bytes_stream()
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err.to_string()));
        let read = bytes.into_async_read();

        Ok(tokio_util::compat::FuturesAsyncReadCompatExt::compat(read))
    }
}

impl<A> super::remote::Storage for Graph<A> where A: GetToken {}

fn to_api_error(err: anyhow::Error) -> odmirror::Error {
    odmirror::api_error!("{err:#}")
}

fn map_item(item: api::DriveItem) -> Entry {
    let kind = if item.file.is_some() {
        let mtime = item
            .file_system_info
            .and_then(|info| info.last_modified_date_time)
            .or(item.last_modified_date_time);
        match (mtime, item.download_url) {
            (Some(mtime), Some(url)) => EntryKind::File {
                mtime,
                locator: Locator::new(url),
            },
            (None, _) => {
                log::warn!("file {:?} has no modification time", item.name);
                EntryKind::Unrecognized
            }
            (_, None) => {
                log::warn!("file {:?} has no download URL", item.name);
                EntryKind::Unrecognized
            }
        }
    } else if item.folder.is_some() {
        EntryKind::Directory
    } else {
        EntryKind::Unrecognized
    };
    Entry {
        name: item.name.filter(|name| !name.is_empty()),
        kind,
    }
}

mod api {
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    use crate::oauth2::GetToken;

    #[derive(Default, Clone, Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FileSystemInfo {
        pub last_modified_date_time: Option<DateTime<Utc>>,
    }

    #[derive(Default, Clone, Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DriveItem {
        pub name: Option<String>,
        pub file: Option<serde_json::Value>,
        pub folder: Option<serde_json::Value>,
        pub file_system_info: Option<FileSystemInfo>,
        pub last_modified_date_time: Option<DateTime<Utc>>,
        #[serde(rename = "@microsoft.graph.downloadUrl")]
        pub download_url: Option<String>,
    }

    /// `value` is kept untyped: some payloads carry no children collection,
    /// or one that is not an array.
    #[derive(Default, Clone, Debug, Deserialize)]
    pub struct ItemList {
        pub value: Option<serde_json::Value>,
        #[serde(rename = "@odata.nextLink")]
        pub next_link: Option<String>,
    }

    impl<A> super::Graph<A>
    where
        A: GetToken,
    {
        pub async fn children_page(&self, url: url::Url) -> odmirror::Result<ItemList> {
            let res = self.get(url.clone()).await?;
            let res = super::utils::check_response("GET", url.path(), res)
                .await
                .map_err(super::to_api_error)?;
            let list: ItemList = res
                .json()
                .await
                .map_err(|err| odmirror::api_error!("{err}"))?;
            Ok(list)
        }
    }
}

mod utils {
    use camino::Utf8Path;
    use reqwest::{header, Response, Url};

    use crate::oauth2::GetToken;

    pub async fn check_response(
        method: &str,
        path: &str,
        res: Response,
    ) -> anyhow::Result<Response> {
        if !res.status().is_success() {
            anyhow::bail!(
                "{method} {path} returned {}\n{}",
                res.status(),
                res.text().await?
            );
        }
        Ok(res)
    }

    /// Builds `{drive}/root:/{folder}/{path}:/children`, or
    /// `{drive}/root/children` for the drive root.
    pub fn children_url(
        drive_url: &str,
        parent_folder: &str,
        path: &Utf8Path,
    ) -> anyhow::Result<Url> {
        let mut url = Url::parse(drive_url)?;
        let mut comps: Vec<&str> = parent_folder.split('/').filter(|c| !c.is_empty()).collect();
        comps.extend(path.components().map(|c| c.as_str()));
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| anyhow::anyhow!("{drive_url} cannot be a base URL"))?;
            segs.pop_if_empty();
            match comps.split_last() {
                None => {
                    segs.push("root");
                }
                Some((last, init)) => {
                    segs.push("root:");
                    segs.extend(init);
                    segs.push(&format!("{last}:"));
                }
            }
            segs.push("children");
        }
        Ok(url)
    }

    impl<A> super::Graph<A>
    where
        A: GetToken,
    {
        pub async fn get(&self, url: Url) -> odmirror::Result<Response> {
            let token = self
                .auth
                .get_token()
                .await
                .map_err(|err| odmirror::auth_error!("{err:#}"))?;
            let res = self
                .client
                .get(url)
                .header(header::USER_AGENT, &self.user_agent)
                .bearer_auth(token.secret())
                .send()
                .await
                .map_err(|err| odmirror::api_error!("{err}"))?;
            Ok(res)
        }
    }
}
