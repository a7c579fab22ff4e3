//! Credential storage for the two providers.
//!
//! Gemini authenticates with a static API key ([`ApiKeyStore`]); OpenAI with
//! a refreshable OAuth bearer token ([`OAuthTokenStore`]). Both persist to
//! owner-only JSON files under the secrets directory and both are handed to
//! tool adapters as a [`CredentialSource`].

pub mod api_key;
pub mod clock;
pub mod oauth;
pub mod secret_file;

use async_trait::async_trait;

use crate::error::CrossCheckError;

pub use api_key::{ApiKeyStore, EnvLookup, KeySource, StaticCredential, API_KEY_ENV_VARS};
pub use clock::{Clock, FixedClock, SystemClock};
pub use oauth::{
    expiry_from_lifetime, HttpTokenRefresher, OAuthToken, OAuthTokenStore, RefreshResponse,
    TokenRefresher, TokenState,
};

/// Anything that can produce a credential string for a provider call.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn credential(&self) -> Result<String, CrossCheckError>;
}
