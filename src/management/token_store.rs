use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::io::AsyncWriteExt;

use crate::{
    error::StorageError,
    logging::Logger,
    management::credentials::{ACCOUNT_CLIENT_ID, ACCOUNT_REFRESH_TOKEN, CredentialStore},
    types::TokenSet,
};

pub const TOKEN_FILE_NAME: &str = ".spotme-cli";

const KEY_ACCESS_TOKEN: &str = "access_token";
const KEY_REFRESH_TOKEN: &str = "refresh_token";
const KEY_EXPIRES_AT: &str = "expires_at";

/// Two-tier token persistence.
///
/// The refresh token goes to the credential store when it accepts it and to
/// the token file otherwise. The access token and its expiry always go to the
/// token file, a `key=value` file in the home directory readable only by its
/// owner.
///
/// The file is not locked. Two processes saving at the same time can lose
/// one of the writes.
pub struct TokenStore {
    home: PathBuf,
    file_name: String,
    credentials: Arc<dyn CredentialStore>,
    logger: Arc<dyn Logger>,
}

impl TokenStore {
    pub fn new(
        home: impl Into<PathBuf>,
        credentials: Arc<dyn CredentialStore>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            home: home.into(),
            file_name: TOKEN_FILE_NAME.to_string(),
            credentials,
            logger,
        }
    }

    /// Uses the current user's home directory.
    pub fn from_home_dir(
        credentials: Arc<dyn CredentialStore>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, StorageError> {
        let home = dirs::home_dir().ok_or(StorageError::NoHomeDir)?;
        Ok(Self::new(home, credentials, logger))
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn credentials(&self) -> Arc<dyn CredentialStore> {
        Arc::clone(&self.credentials)
    }

    /// Resolves the token file and checks that it stays inside the home
    /// directory, following symlinks.
    pub async fn token_path(&self) -> Result<PathBuf, StorageError> {
        let home = tokio::fs::canonicalize(&self.home)
            .await
            .map_err(|e| StorageError::io(&self.home, e))?;
        let path = home.join(&self.file_name);

        let mut components = Path::new(&self.file_name).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(StorageError::OutsideHome(path));
        }

        match tokio::fs::canonicalize(&path).await {
            Ok(resolved) if resolved.starts_with(&home) => Ok(path),
            Ok(resolved) => Err(StorageError::OutsideHome(resolved)),
            // A dangling symlink would be followed on create.
            Err(_) if tokio::fs::symlink_metadata(&path).await.is_ok() => {
                Err(StorageError::OutsideHome(path))
            }
            Err(_) => Ok(path),
        }
    }

    /// Persists `tokens`, rewriting the token file from scratch.
    ///
    /// A credential store failure is not an error: the refresh token is
    /// written to the token file instead and a warning is logged.
    pub async fn save(&self, tokens: &TokenSet) -> Result<(), StorageError> {
        if !tokens.is_valid_at(Utc::now()) {
            return Err(StorageError::Expired(tokens.expires_at));
        }

        let path = self.token_path().await?;
        let mut contents = format!(
            "{KEY_ACCESS_TOKEN}={}\n{KEY_EXPIRES_AT}={}\n",
            tokens.access_token,
            format_expiry(tokens.expires_at)
        );

        if let Some(refresh_token) = &tokens.refresh_token {
            if let Err(e) = self.credentials.set(ACCOUNT_REFRESH_TOKEN, refresh_token) {
                self.logger.warn(format_args!(
                    "Failed to store refresh token in the credential store: {}",
                    e
                ));
                self.logger.warn(format_args!(
                    "Falling back to saving the refresh token in {}.",
                    path.display()
                ));
                contents.push_str(&format!("{KEY_REFRESH_TOKEN}={refresh_token}\n"));
            }
        }

        write_private(&path, &contents).await?;
        self.logger
            .debug(format_args!("Access token saved to {}", path.display()));
        Ok(())
    }

    /// Reads the stored session.
    ///
    /// The refresh token comes from the token file when present there, and
    /// from the credential store otherwise.
    pub async fn load(&self) -> Result<TokenSet, StorageError> {
        let fields = self.read_fields().await?.ok_or(StorageError::NotFound)?;

        let access_token = fields
            .get(KEY_ACCESS_TOKEN)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| StorageError::Corrupt(format!("missing {KEY_ACCESS_TOKEN}")))?;
        let expires_at = fields
            .get(KEY_EXPIRES_AT)
            .ok_or_else(|| StorageError::Corrupt(format!("missing {KEY_EXPIRES_AT}")))
            .and_then(|raw| parse_expiry(raw))?;

        let refresh_token = match fields.get(KEY_REFRESH_TOKEN).filter(|v| !v.is_empty()) {
            Some(token) => Some(token.clone()),
            None => self.credential_refresh_token(),
        };

        Ok(TokenSet {
            access_token: access_token.clone(),
            refresh_token,
            expires_at,
        })
    }

    /// Looks up a refresh token in the credential store, then in the token
    /// file. Read failures count as "not found".
    pub async fn refresh_token(&self) -> Option<String> {
        if let Some(token) = self.credential_refresh_token() {
            return Some(token);
        }

        match self.read_fields().await {
            Ok(Some(mut fields)) => fields
                .remove(KEY_REFRESH_TOKEN)
                .filter(|v| !v.is_empty()),
            Ok(None) => None,
            Err(e) => {
                self.logger
                    .debug(format_args!("Cannot read token file: {}", e));
                None
            }
        }
    }

    /// Removes the stored client id, refresh token and token file.
    ///
    /// Credential store failures are logged and skipped; missing entries
    /// and a missing file are fine.
    pub async fn clear(&self) -> Result<(), StorageError> {
        for account in [ACCOUNT_CLIENT_ID, ACCOUNT_REFRESH_TOKEN] {
            if let Err(e) = self.credentials.delete(account) {
                self.logger.warn(format_args!(
                    "Failed to delete {} from the credential store: {}",
                    account, e
                ));
            }
        }

        let path = self.token_path().await?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                self.logger
                    .debug(format_args!("Removed {}", path.display()));
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    fn credential_refresh_token(&self) -> Option<String> {
        match self.credentials.get(ACCOUNT_REFRESH_TOKEN) {
            Ok(token) => token,
            Err(e) => {
                self.logger.debug(format_args!(
                    "Refresh token not available from the credential store: {}",
                    e
                ));
                None
            }
        }
    }

    async fn read_fields(&self) -> Result<Option<HashMap<String, String>>, StorageError> {
        let path = self.token_path().await?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(parse_fields(&content))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }
}

fn parse_fields(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

fn format_expiry(expires_at: DateTime<Utc>) -> String {
    expires_at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_expiry(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("bad {KEY_EXPIRES_AT} {raw:?}: {e}")))
}

async fn write_private(path: &Path, contents: &str) -> Result<(), StorageError> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options
        .open(path)
        .await
        .map_err(|e| StorageError::io(path, e))?;
    file.write_all(contents.as_bytes())
        .await
        .map_err(|e| StorageError::io(path, e))?;
    file.flush().await.map_err(|e| StorageError::io(path, e))?;

    // `mode` only applies on create; tighten files left by older versions.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .map_err(|e| StorageError::io(path, e))?;
    }

    Ok(())
}
