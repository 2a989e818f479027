//! Configuration management for the Spotify session.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory. Everything except the client id has a
//! default pointing at Spotify's public endpoints.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Explicit values (command-line flags)
//! 2. Environment variables
//! 3. `.env` file in the local data directory
//! 4. Application defaults

use std::{env, path::PathBuf, time::Duration};

use crate::{
    error::AuthError,
    logging::Logger,
    management::credentials::{ACCOUNT_CLIENT_ID, CredentialStore},
    server::CALLBACK_PATH,
    types::AuthConfig,
};

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:6969";
pub const DEFAULT_SCOPE: &str = "user-read-private user-read-email user-top-read";
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(180);

pub const CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// The file lives at:
/// - Linux: `~/.local/share/spotme/.env`
/// - macOS: `~/Library/Application Support/spotme/.env`
/// - Windows: `%LOCALAPPDATA%/spotme/.env`
///
/// A missing file is not an error; variables already set in the environment
/// take precedence over the file.
///
/// # Errors
///
/// Returns an error string if the directory cannot be created or the file
/// exists but cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotme/.env");
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
    }
    Ok(())
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Address the loopback callback listener binds to (`SERVER_ADDRESS`).
pub fn server_addr() -> String {
    var_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

/// Spotify authorization endpoint (`SPOTIFY_API_AUTH_URL`).
pub fn spotify_apiauth_url() -> String {
    var_or("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL)
}

/// Spotify token endpoint (`SPOTIFY_API_TOKEN_URL`).
pub fn spotify_apitoken_url() -> String {
    var_or("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL)
}

/// Spotify Web API base URL (`SPOTIFY_API_URL`).
pub fn spotify_apiurl() -> String {
    var_or("SPOTIFY_API_URL", DEFAULT_API_URL)
}

/// Requested scopes, from the space-separated `SPOTIFY_API_AUTH_SCOPE`.
pub fn spotify_scopes() -> Vec<String> {
    var_or("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// How long a full login waits for the browser redirect (`SPOTME_LOGIN_TIMEOUT`,
/// in seconds). Unparsable or zero values fall back to the default.
pub fn login_timeout() -> Duration {
    env::var("SPOTME_LOGIN_TIMEOUT")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_LOGIN_TIMEOUT)
}

/// Whether debug log lines are enabled (`SPOTME_DEBUG`).
pub fn debug_enabled() -> bool {
    env::var("SPOTME_DEBUG")
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Everything the session manager needs for one `ensure_valid_token` call.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub auth: AuthConfig,
    pub scopes: Vec<String>,
    pub server_addr: String,
    pub callback_path: String,
    pub login_timeout: Duration,
}

impl SessionConfig {
    /// Builds a config listening on `server_addr`, with the default scopes
    /// and timeout.
    pub fn new(
        client_id: impl Into<String>,
        server_addr: impl Into<String>,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        let server_addr = server_addr.into();
        Self {
            auth: AuthConfig::new(client_id, &server_addr, auth_url, token_url),
            scopes: DEFAULT_SCOPE.split_whitespace().map(str::to_string).collect(),
            server_addr,
            callback_path: CALLBACK_PATH.to_string(),
            login_timeout: DEFAULT_LOGIN_TIMEOUT,
        }
    }

    pub fn from_env(client_id: impl Into<String>) -> Self {
        let mut config = Self::new(
            client_id,
            server_addr(),
            spotify_apiauth_url(),
            spotify_apitoken_url(),
        );
        config.scopes = spotify_scopes();
        config.login_timeout = login_timeout();
        config
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }
}

/// Picks the client id: `explicit`, then the credential store, then
/// `SPOTIFY_CLIENT_ID`.
///
/// An explicit id is remembered in the credential store for later runs; if
/// that fails a warning is logged and the id is still used.
///
/// # Errors
///
/// [`AuthError::Config`] when no non-empty id is found.
pub fn resolve_client_id(
    explicit: Option<&str>,
    credentials: &dyn CredentialStore,
    logger: &dyn Logger,
) -> Result<String, AuthError> {
    if let Some(id) = explicit {
        let id = id.trim();
        if id.is_empty() {
            return Err(AuthError::Config("client id must not be empty".to_string()));
        }
        if let Err(e) = credentials.set(ACCOUNT_CLIENT_ID, id) {
            logger.warn(format_args!("Failed to remember client id: {}", e));
        }
        return Ok(id.to_string());
    }

    match credentials.get(ACCOUNT_CLIENT_ID) {
        Ok(Some(id)) if !id.trim().is_empty() => return Ok(id.trim().to_string()),
        Ok(_) => {}
        Err(e) => logger.debug(format_args!(
            "Client id not found in the credential store: {}",
            e
        )),
    }

    env::var(CLIENT_ID_ENV)
        .ok()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(missing_client_id)
}

pub fn missing_client_id() -> AuthError {
    AuthError::Config(format!(
        "client id is required. Set it via the environment variable {} or the --client-id flag.",
        CLIENT_ID_ENV
    ))
}
