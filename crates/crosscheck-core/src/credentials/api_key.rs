//! Static API key storage for the Gemini provider.
//!
//! The key is looked up in the environment first (`GEMINI_API_KEY`, then
//! `GOOGLE_API_KEY`) and falls back to a JSON file of the form
//! `{ "api_key": "..." }`. Once found, the key is cached for the lifetime of
//! the store unless [`ApiKeyStore::save`] replaces it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credentials::secret_file::{read_json, write_private_json};
use crate::credentials::CredentialSource;
use crate::error::CrossCheckError;

/// Environment variables checked for the key, in priority order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Where a new key can be issued.
pub const API_KEY_ISSUE_URL: &str = "https://aistudio.google.com/app/apikey";

/// Environment lookup function. Injected so tests never touch the real
/// process environment.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// A loaded API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredential {
    value: String,
}

impl StaticCredential {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredential")
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Where [`ApiKeyStore::load`] would currently find a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Env(&'static str),
    File(PathBuf),
    Missing,
}

#[derive(Serialize, Deserialize)]
struct ApiKeyFile {
    api_key: String,
}

pub struct ApiKeyStore {
    config_path: PathBuf,
    env: EnvLookup,
    cached: RwLock<Option<StaticCredential>>,
}

impl ApiKeyStore {
    /// Creates a store backed by the real process environment.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self::with_env(config_path, Arc::new(|name: &str| std::env::var(name).ok()))
    }

    pub fn with_env(config_path: impl Into<PathBuf>, env: EnvLookup) -> Self {
        Self {
            config_path: config_path.into(),
            env,
            cached: RwLock::new(None),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Returns the key from cache, environment, or file. Never fails; any
    /// read or parse problem is reported as `None`.
    pub fn load(&self) -> Option<StaticCredential> {
        if let Some(cached) = self.cached() {
            return Some(cached);
        }

        let found = self
            .from_env()
            .map(|(_, value)| value)
            .or_else(|| self.from_file())?;

        let credential = StaticCredential::new(found);
        self.store_cached(credential.clone());
        Some(credential)
    }

    /// Persists `value` to the key file and makes it the cached key.
    pub fn save(&self, value: &str) -> Result<(), CrossCheckError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(CrossCheckError::InvalidInput(vec![
                "api_key: must not be empty".into(),
            ]));
        }
        write_private_json(
            &self.config_path,
            &ApiKeyFile {
                api_key: value.to_string(),
            },
        )?;
        tracing::info!(path = %self.config_path.display(), "saved Gemini API key");
        self.store_cached(StaticCredential::new(value));
        Ok(())
    }

    /// Like [`load`](Self::load), but a missing key is an error whose message
    /// tells the operator how to fix it.
    pub fn get_or_fail(&self) -> Result<StaticCredential, CrossCheckError> {
        self.load().ok_or_else(|| {
            CrossCheckError::MissingCredential(format!(
                "Gemini API key is not configured.\n\n\
                 1. Create a key: {API_KEY_ISSUE_URL}\n\n\
                 2. Set an environment variable:\n   \
                    export {}=\"AIza...\"\n\n\
                 3. Or create the file:\n   \
                    {}\n   \
                    with content: {{ \"api_key\": \"AIza...\" }}",
                API_KEY_ENV_VARS[0],
                self.config_path.display()
            ))
        })
    }

    /// Reports where a key would be found right now, ignoring the cache.
    pub fn source(&self) -> KeySource {
        if let Some((name, _)) = self.from_env() {
            return KeySource::Env(name);
        }
        if self.from_file().is_some() {
            return KeySource::File(self.config_path.clone());
        }
        KeySource::Missing
    }

    fn from_env(&self) -> Option<(&'static str, String)> {
        API_KEY_ENV_VARS.iter().find_map(|name| {
            (self.env)(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (*name, v))
        })
    }

    fn from_file(&self) -> Option<String> {
        read_json::<ApiKeyFile>(&self.config_path)
            .map(|f| f.api_key.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    fn cached(&self) -> Option<StaticCredential> {
        self.cached
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn store_cached(&self, credential: StaticCredential) {
        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(credential);
    }
}

#[async_trait]
impl CredentialSource for ApiKeyStore {
    async fn credential(&self) -> Result<String, CrossCheckError> {
        self.get_or_fail().map(|c| c.value().to_string())
    }
}
