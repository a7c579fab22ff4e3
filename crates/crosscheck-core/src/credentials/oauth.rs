//! Refreshable OAuth bearer token storage for the OpenAI provider.
//!
//! The token lives in a single JSON file. [`OAuthTokenStore::access_token`]
//! walks the validity state machine:
//!
//! - **Absent**: nothing cached and nothing readable on disk.
//! - **Valid**: `now < expires_at - 300`.
//! - **ExpiredRefreshable**: past the margin, `refresh_token` present. A
//!   refresh call replaces the token.
//! - **ExpiredTerminal**: past the margin, no `refresh_token`. The operator
//!   has to re-authenticate out of band.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credentials::clock::{Clock, SystemClock};
use crate::credentials::secret_file::{read_json, write_private_json};
use crate::credentials::CredentialSource;
use crate::error::CrossCheckError;

/// Seconds before `expires_at` at which a token is already treated as expired.
pub const EXPIRY_MARGIN_SECS: i64 = 300;

/// Lifetime assumed when the token endpoint does not report `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// `expires_at` for a token issued at `now` with the reported lifetime.
///
/// A missing, zero or negative lifetime counts as [`DEFAULT_EXPIRES_IN_SECS`].
/// The sum saturates instead of overflowing.
pub fn expiry_from_lifetime(now: i64, expires_in: Option<i64>) -> i64 {
    let lifetime = expires_in
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS);
    now.saturating_add(lifetime)
}

/// Default refresh endpoint. Overridable through configuration.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://auth.openai.com/oauth/token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Unix seconds.
    pub expires_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl OAuthToken {
    /// True once `expires_at` is within [`EXPIRY_MARGIN_SECS`] of `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at <= now.saturating_add(EXPIRY_MARGIN_SECS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Absent,
    Valid,
    ExpiredRefreshable,
    ExpiredTerminal,
}

impl TokenState {
    pub fn of(token: Option<&OAuthToken>, now: i64) -> Self {
        match token {
            None => TokenState::Absent,
            Some(t) if !t.is_expired_at(now) => TokenState::Valid,
            Some(t) if t.refresh_token.is_some() => TokenState::ExpiredRefreshable,
            Some(_) => TokenState::ExpiredTerminal,
        }
    }
}

/// Body of a successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Exchanges a refresh token for a new access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, CrossCheckError>;
}

/// Refresher that POSTs a form-encoded `refresh_token` grant over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher {
    client: reqwest::Client,
    endpoint: String,
    client_id: Option<String>,
}

impl HttpTokenRefresher {
    pub fn new(endpoint: impl Into<String>, client_id: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            client_id: client_id.filter(|id| !id.is_empty()),
        }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, CrossCheckError> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        if let Some(client_id) = &self.client_id {
            form.push(("client_id", client_id.as_str()));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| CrossCheckError::RefreshFailed {
                status: None,
                reason: format!("Request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrossCheckError::RefreshFailed {
                status: Some(status.as_u16()),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        response
            .json::<RefreshResponse>()
            .await
            .map_err(|e| CrossCheckError::RefreshFailed {
                status: Some(status.as_u16()),
                reason: format!("Failed to parse response: {e}"),
            })
    }
}

pub struct OAuthTokenStore {
    token_path: PathBuf,
    token: RwLock<Option<OAuthToken>>,
    refresher: Arc<dyn TokenRefresher>,
    clock: Arc<dyn Clock>,
}

impl OAuthTokenStore {
    pub fn new(token_path: impl Into<PathBuf>, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self::with_clock(token_path, refresher, Arc::new(SystemClock))
    }

    pub fn with_clock(
        token_path: impl Into<PathBuf>,
        refresher: Arc<dyn TokenRefresher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            token_path: token_path.into(),
            token: RwLock::new(None),
            refresher,
            clock,
        }
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// The currently cached token, if any. Does not touch the disk.
    pub fn current(&self) -> Option<OAuthToken> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Validity of the cached token right now.
    pub fn state(&self) -> TokenState {
        TokenState::of(self.current().as_ref(), self.clock.now())
    }

    /// Reads the token file and caches it. A missing or malformed file yields
    /// `None` and leaves any cached token untouched.
    pub fn load(&self) -> Option<OAuthToken> {
        let token = read_json::<OAuthToken>(&self.token_path)?;
        tracing::debug!(
            path = %self.token_path.display(),
            expires_at = token.expires_at,
            "loaded OAuth token"
        );
        self.replace(token.clone());
        Some(token)
    }

    /// Persists `token` and makes it the cached token.
    pub fn save(&self, token: OAuthToken) -> Result<(), CrossCheckError> {
        write_private_json(&self.token_path, &token)?;
        self.replace(token);
        Ok(())
    }

    /// Exchanges the cached refresh token for a new access token and persists
    /// the result. The previous refresh token is kept when the endpoint does
    /// not issue a new one.
    pub async fn refresh(&self) -> Result<OAuthToken, CrossCheckError> {
        let previous = self.current();
        let refresh_token = previous
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .ok_or_else(|| {
                CrossCheckError::MissingCredential(format!(
                    "No refresh_token available in {}",
                    self.token_path.display()
                ))
            })?;

        tracing::info!("refreshing OpenAI OAuth token");
        let response = self.refresher.refresh(&refresh_token).await?;

        let refreshed = OAuthToken {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(Some(refresh_token)),
            token_type: response.token_type.unwrap_or_else(default_token_type),
            expires_at: expiry_from_lifetime(self.clock.now(), response.expires_in),
            scope: response.scope,
        };

        self.save(refreshed.clone())?;
        tracing::debug!(expires_at = refreshed.expires_at, "OAuth token refreshed");
        Ok(refreshed)
    }

    /// Returns a usable access token, loading from disk and refreshing as
    /// needed.
    pub async fn access_token(&self) -> Result<String, CrossCheckError> {
        if self.current().is_none() {
            self.load();
        }

        let token = self.current().ok_or_else(|| {
            CrossCheckError::MissingCredential(format!(
                "OpenAI OAuth token is not configured.\n\
                 Create the token file at: {}\n\
                 Minimal format: {{ \"access_token\": \"...\", \"expires_at\": 1234567890 }}",
                self.token_path.display()
            ))
        })?;

        if !token.is_expired_at(self.clock.now()) {
            return Ok(token.access_token);
        }
        if token.refresh_token.is_none() {
            return Err(CrossCheckError::ReauthRequired {
                token_path: self.token_path.clone(),
            });
        }
        Ok(self.refresh().await?.access_token)
    }

    fn replace(&self, token: OAuthToken) {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token);
    }
}

#[async_trait]
impl CredentialSource for OAuthTokenStore {
    async fn credential(&self) -> Result<String, CrossCheckError> {
        self.access_token().await
    }
}
