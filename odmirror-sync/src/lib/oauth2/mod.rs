use std::sync::Arc;

use futures::prelude::*;
use oauth2::{
    basic::BasicClient, AuthType, AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse,
    TokenUrl,
};
pub use oauth2::{AccessToken, Scope};
use tokio::sync::RwLock;

mod token_cache;

pub use self::token_cache::TokenCache;

pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

pub trait GetToken: Send + Sync + 'static {
    fn get_token(&self) -> impl Future<Output = anyhow::Result<AccessToken>> + Send;
}

#[derive(Debug, Clone)]
pub struct Secret {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub auth_url: AuthUrl,
    pub token_url: TokenUrl,
}

impl Secret {
    /// Secret of an application registered in a Microsoft Entra tenant.
    pub fn for_tenant(tenant_id: &str, client_id: &str, client_secret: &str) -> anyhow::Result<Self> {
        let base = format!("https://login.microsoftonline.com/{tenant_id}/oauth2/v2.0");
        Ok(Self {
            client_id: ClientId::new(client_id.to_string()),
            client_secret: ClientSecret::new(client_secret.to_string()),
            auth_url: AuthUrl::new(format!("{base}/authorize"))?,
            token_url: TokenUrl::new(format!("{base}/token"))?,
        })
    }
}

#[derive(Debug)]
struct Inner {
    cache: RwLock<TokenCache>,
    http: reqwest::Client,
    oauth2: BasicClient,
    scopes: Vec<Scope>,
}

/// Client credentials flow: the application authenticates as itself,
/// without user interaction.
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    pub fn new(secret: Secret, scopes: Vec<Scope>, http: Option<reqwest::Client>) -> Self {
        let oauth2 = BasicClient::new(
            secret.client_id,
            Some(secret.client_secret),
            secret.auth_url,
            Some(secret.token_url),
        )
        .set_auth_type(AuthType::RequestBody);
        let http = http.unwrap_or_else(reqwest::Client::new);

        Self {
            inner: Arc::new(Inner {
                cache: RwLock::new(TokenCache::new()),
                http,
                oauth2,
                scopes,
            }),
        }
    }

    async fn fetch_token(&self) -> anyhow::Result<AccessToken> {
        log::debug!("requesting access token");
        let token_response = self
            .inner
            .oauth2
            .exchange_client_credentials()
            .add_scopes(self.inner.scopes.clone())
            .request_async(|req| async { self.http(req).await })
            .await?;

        let access = oauth2::TokenResponse::access_token(&token_response).to_owned();

        let mut cache = self.inner.cache.write().await;
        cache.put(&token_response);

        Ok(access)
    }

    async fn http(&self, req: HttpRequest) -> reqwest::Result<HttpResponse> {
        let method = req.method.clone();
        let url = req.url.clone();

        let resp = self
            .inner
            .http
            .request(req.method, req.url)
            .headers(req.headers)
            .body(req.body)
            .send()
            .await?;

        let status_code = resp.status();
        let headers = resp.headers().to_owned();
        let body = resp.bytes().await?.to_vec();

        if !status_code.is_success() {
            log::error!("{} {} received error {status_code}", method, url);
            if let Ok(body) = std::str::from_utf8(&body) {
                log::error!("{body}");
            }
        }

        Ok(HttpResponse {
            status_code,
            headers,
            body,
        })
    }
}

impl GetToken for Client {
    async fn get_token(&self) -> anyhow::Result<AccessToken> {
        let cached = self.inner.cache.read().await.check();
        match cached {
            Some(access_token) => Ok(access_token),
            None => self.fetch_token().await,
        }
    }
}
