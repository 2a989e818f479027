//! Error types for the session components.
//!
//! Every failure along the login path ends up as an [`AuthError`]. The
//! lower-level enums keep the specific cause so the command layer can print
//! something useful and tests can match on it.

use std::{io, path::PathBuf, time::Duration};

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("token exchange failed: {0}")]
    Exchange(#[source] TokenError),

    #[error("token refresh failed: {0}")]
    Refresh(#[source] TokenError),

    #[error("no authorization callback received within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("cannot listen on {addr} (is another login in progress?): {source}")]
    PortConflict {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("authorization failed: {0}")]
    Callback(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Wraps a failed `authorization_code` grant.
    pub fn exchange(err: TokenError) -> Self {
        match err {
            TokenError::Transport(e) => AuthError::Network(e),
            other => AuthError::Exchange(other),
        }
    }

    /// Wraps a failed `refresh_token` grant.
    pub fn refresh(err: TokenError) -> Self {
        match err {
            TokenError::Transport(e) => AuthError::Network(e),
            other => AuthError::Refresh(other),
        }
    }
}

/// Failure talking to the token endpoint.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token endpoint answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed token response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no stored session")]
    NotFound,

    #[error("cannot determine the user's home directory")]
    NoHomeDir,

    #[error("refusing to use {} outside of the home directory", .0.display())]
    OutsideHome(PathBuf),

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("stored session is unreadable: {0}")]
    Corrupt(String),

    #[error("refusing to save a token that expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("credential store: {0}")]
    Credential(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
#[error("cannot open browser: {0}")]
pub struct BrowserError(#[from] pub io::Error);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_exchange_stays_an_exchange_error() {
        let err = AuthError::exchange(TokenError::Malformed("missing access_token".into()));
        assert!(matches!(err, AuthError::Exchange(TokenError::Malformed(_))));
    }

    #[test]
    fn status_refresh_stays_a_refresh_error() {
        let err = AuthError::refresh(TokenError::Status {
            status: StatusCode::BAD_REQUEST,
            body: "invalid_grant".into(),
        });
        assert!(matches!(err, AuthError::Refresh(TokenError::Status { .. })));
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[test]
    fn timeout_message_names_the_bound() {
        let err = AuthError::Timeout(Duration::from_secs(180));
        assert_eq!(
            err.to_string(),
            "no authorization callback received within 180s"
        );
    }
}
