//! Runtime configuration.
//!
//! Resolution order: built-in defaults, then the optional TOML file
//! (`~/.omc/crosscheck.toml` unless a path is given), then `CROSSCHECK_*`
//! environment variables. The CLI applies its own flags last.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::credentials::oauth::DEFAULT_TOKEN_ENDPOINT;
use crate::error::CrossCheckError;
use crate::provider::{DEFAULT_GEMINI_BASE_URL, DEFAULT_OPENAI_BASE_URL};

pub const API_KEY_FILE_NAME: &str = "gemini-api.json";
pub const OAUTH_TOKEN_FILE_NAME: &str = "openai-oauth.json";

pub const ENV_SECRETS_DIR: &str = "CROSSCHECK_SECRETS_DIR";
pub const ENV_GEMINI_BASE_URL: &str = "CROSSCHECK_GEMINI_BASE_URL";
pub const ENV_OPENAI_BASE_URL: &str = "CROSSCHECK_OPENAI_BASE_URL";
pub const ENV_OPENAI_TOKEN_ENDPOINT: &str = "CROSSCHECK_OPENAI_TOKEN_ENDPOINT";
pub const ENV_OPENAI_CLIENT_ID: &str = "CROSSCHECK_OPENAI_CLIENT_ID";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the credential files. `~/.omc/secrets` when unset.
    pub secrets_dir: Option<PathBuf>,
    pub gemini: GeminiConfig,
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    pub review_model: String,
    pub critique_model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub token_endpoint: String,
    pub client_id: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_owned(),
            review_model: "gemini-1.5-pro".to_owned(),
            critique_model: "gemini-2.0-flash-exp".to_owned(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENAI_BASE_URL.to_owned(),
            model: "gpt-5.2".to_owned(),
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_owned(),
            client_id: None,
        }
    }
}

impl Config {
    /// `~/.omc/crosscheck.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".omc").join("crosscheck.toml"))
    }

    /// Loads the file at `path`, or the default file when `path` is `None`.
    ///
    /// An explicitly given file must exist; a missing default file yields the
    /// built-in defaults. Environment overrides are applied in both cases.
    pub fn load(path: Option<&Path>) -> Result<Self, CrossCheckError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(p) => Self::from_file(&p)?,
                None => Self::default(),
            },
        };
        config.apply_env(&|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, CrossCheckError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CrossCheckError::Config(format!("Cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| CrossCheckError::Config(format!("Invalid {}: {e}", path.display())))
    }

    /// Applies `CROSSCHECK_*` overrides. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get(ENV_SECRETS_DIR) {
            self.secrets_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = get(ENV_GEMINI_BASE_URL) {
            self.gemini.base_url = url;
        }
        if let Some(url) = get(ENV_OPENAI_BASE_URL) {
            self.openai.base_url = url;
        }
        if let Some(url) = get(ENV_OPENAI_TOKEN_ENDPOINT) {
            self.openai.token_endpoint = url;
        }
        if let Some(id) = get(ENV_OPENAI_CLIENT_ID) {
            self.openai.client_id = Some(id);
        }
    }

    /// The resolved secrets directory, with a leading `~` expanded.
    pub fn secrets_dir(&self) -> Result<PathBuf, CrossCheckError> {
        match &self.secrets_dir {
            Some(dir) => expand_home(dir),
            None => dirs::home_dir()
                .map(|home| home.join(".omc").join("secrets"))
                .ok_or_else(|| {
                    CrossCheckError::Config("Cannot determine the home directory".into())
                }),
        }
    }

    pub fn api_key_path(&self) -> Result<PathBuf, CrossCheckError> {
        Ok(self.secrets_dir()?.join(API_KEY_FILE_NAME))
    }

    pub fn oauth_token_path(&self) -> Result<PathBuf, CrossCheckError> {
        Ok(self.secrets_dir()?.join(OAUTH_TOKEN_FILE_NAME))
    }
}

fn expand_home(path: &Path) -> Result<PathBuf, CrossCheckError> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    dirs::home_dir()
        .map(|home| home.join(rest))
        .ok_or_else(|| CrossCheckError::Config("Cannot determine the home directory".into()))
}
