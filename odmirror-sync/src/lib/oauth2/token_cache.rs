use chrono::{DateTime, Duration, Utc};
use oauth2::{AccessToken, TokenResponse, TokenType};

/// Tokens are renewed this long before they actually expire.
const EXPIRATION_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct TokenEntry {
    access_token: AccessToken,
    expiration: Option<DateTime<Utc>>,
}

/// In-memory cache of the last access token.
#[derive(Debug, Default)]
pub struct TokenCache {
    entry: Option<TokenEntry>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self { entry: None }
    }

    pub fn put<T, TT>(&mut self, tok: &T)
    where
        T: TokenResponse<TT>,
        TT: TokenType,
    {
        let expiration = tok
            .expires_in()
            .and_then(|exp| Duration::from_std(exp).ok())
            .map(|exp| Utc::now() + exp);
        log::trace!(target: "odmirror_sync::oauth2::TokenCache", "caching token expiring at {expiration:?}");
        self.entry = Some(TokenEntry {
            access_token: tok.access_token().clone(),
            expiration,
        });
    }

    /// Returns the cached token if it is still valid.
    pub fn check(&self) -> Option<AccessToken> {
        self.check_at(Utc::now())
    }

    fn check_at(&self, now: DateTime<Utc>) -> Option<AccessToken> {
        let entry = self.entry.as_ref()?;
        match entry.expiration {
            Some(exp) if exp - Duration::seconds(EXPIRATION_MARGIN_SECS) <= now => None,
            _ => Some(entry.access_token.clone()),
        }
    }
}
