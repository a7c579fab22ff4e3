use std::sync::Arc;

use crosscheck_core::config::Config;
use crosscheck_core::credentials::{
    expiry_from_lifetime, ApiKeyStore, Clock, HttpTokenRefresher, KeySource, OAuthToken,
    OAuthTokenStore, SystemClock, TokenState,
};
use dialoguer::Password;

use crate::output::Reporter;

/// Run the `crosscheck auth set-key` command.
///
/// Prompts with hidden input when no key is given on the command line.
pub fn run_set_key(key: Option<&str>, config: &Config, reporter: &mut Reporter) -> bool {
    let Some(store) = api_key_store(config, reporter) else {
        return false;
    };

    let key = match key {
        Some(k) => k.to_string(),
        None => match Password::new().with_prompt("Gemini API key").interact() {
            Ok(k) => k,
            Err(e) => {
                reporter.error(&format!("Cannot read key: {e}"));
                return false;
            }
        },
    };

    if let Err(e) = store.save(&key) {
        reporter.error(&format!("{e}"));
        return false;
    }
    reporter.success(&format!(
        "Saved Gemini API key to {}",
        store.config_path().display()
    ));
    if let KeySource::Env(name) = store.source() {
        reporter.warning(&format!("{name} is set and takes precedence over the saved key"));
    }
    true
}

/// Run the `crosscheck auth set-token` command.
pub fn run_set_token(
    access_token: &str,
    refresh_token: Option<&str>,
    expires_in: i64,
    scope: Option<&str>,
    config: &Config,
    reporter: &mut Reporter,
) -> bool {
    if access_token.trim().is_empty() {
        reporter.error("--access-token must not be empty");
        return false;
    }
    if expires_in <= 0 {
        reporter.error("--expires-in must be a positive number of seconds");
        return false;
    }

    let Some(store) = oauth_store(config, reporter) else {
        return false;
    };

    let token = OAuthToken {
        access_token: access_token.trim().to_string(),
        refresh_token: refresh_token.map(str::to_string),
        token_type: "Bearer".to_string(),
        expires_at: expiry_from_lifetime(SystemClock.now(), Some(expires_in)),
        scope: scope.map(str::to_string),
    };
    match store.save(token) {
        Ok(()) => {
            reporter.success(&format!(
                "Saved OpenAI OAuth token to {}",
                store.token_path().display()
            ));
            if refresh_token.is_none() {
                reporter.warning(
                    "No refresh token given; the token cannot be renewed once it expires",
                );
            }
            true
        }
        Err(e) => {
            reporter.error(&format!("{e}"));
            false
        }
    }
}

/// Run the `crosscheck auth status` command.
///
/// Reports what a tool call would find without touching the network.
pub fn run_status(config: &Config, reporter: &mut Reporter) -> bool {
    let (Some(keys), Some(oauth)) = (api_key_store(config, reporter), oauth_store(config, reporter))
    else {
        return false;
    };

    reporter.section("Gemini");
    match keys.source() {
        KeySource::Env(name) => {
            reporter.success(&format!("API key from environment variable {name}"))
        }
        KeySource::File(path) => reporter.success(&format!("API key from {}", path.display())),
        KeySource::Missing => reporter.warning(&format!(
            "API key not configured; set GEMINI_API_KEY or run `crosscheck auth set-key` (file: {})",
            keys.config_path().display()
        )),
    }

    reporter.section("OpenAI");
    oauth.load();
    let path = oauth.token_path().display();
    match oauth.state() {
        TokenState::Valid => {
            let expires_at = oauth.current().map(|t| t.expires_at).unwrap_or_default();
            reporter.success(&format!(
                "OAuth token valid, expires at {expires_at} (unix seconds) ({path})"
            ));
        }
        TokenState::ExpiredRefreshable => {
            reporter.info(&format!(
                "OAuth token expired; it will be refreshed on next use ({path})"
            ));
        }
        TokenState::ExpiredTerminal => {
            reporter.warning(&format!(
                "OAuth token expired and has no refresh_token; save a new one with `crosscheck auth set-token` ({path})"
            ));
        }
        TokenState::Absent => {
            reporter.warning(&format!(
                "OAuth token not configured; run `crosscheck auth set-token` (file: {path})"
            ));
        }
    }
    true
}

fn api_key_store(config: &Config, reporter: &mut Reporter) -> Option<ApiKeyStore> {
    match config.api_key_path() {
        Ok(path) => Some(ApiKeyStore::new(path)),
        Err(e) => {
            reporter.error(&format!("{e}"));
            None
        }
    }
}

fn oauth_store(config: &Config, reporter: &mut Reporter) -> Option<OAuthTokenStore> {
    match config.oauth_token_path() {
        Ok(path) => {
            let refresher = HttpTokenRefresher::new(
                config.openai.token_endpoint.clone(),
                config.openai.client_id.clone(),
            );
            Some(OAuthTokenStore::new(path, Arc::new(refresher)))
        }
        Err(e) => {
            reporter.error(&format!("{e}"));
            None
        }
    }
}
