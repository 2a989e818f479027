use std::sync::Arc;

use chrono::Utc;

use crate::{
    browser::{BrowserLauncher, SystemBrowser},
    config::{self, SessionConfig},
    error::{AuthError, StorageError},
    logging::{ConsoleLogger, Logger},
    management::{
        credentials::{CredentialStore, KeyringStore},
        token_store::TokenStore,
    },
    server::CallbackServer,
    spotify::TokenClient,
    types::{CallbackFailure, CallbackResult, PkcePair},
    utils,
};

/// Keeps a usable access token around.
///
/// One call to [`ensure_valid_token`](Self::ensure_valid_token) walks
/// `stored token → refresh → full login` and stops at the first step that
/// produces a valid token. Refreshing before a full login is the only
/// automatic retry; every other failure goes back to the caller.
pub struct SessionManager {
    config: SessionConfig,
    store: TokenStore,
    client: TokenClient,
    browser: Arc<dyn BrowserLauncher>,
    logger: Arc<dyn Logger>,
}

impl SessionManager {
    pub fn new(
        config: SessionConfig,
        store: TokenStore,
        client: TokenClient,
        browser: Arc<dyn BrowserLauncher>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            config,
            store,
            client,
            browser,
            logger,
        }
    }

    /// Wires up the OS keyring, the token file in the home directory, the
    /// system browser and a console logger, reading endpoints from the
    /// environment.
    ///
    /// A missing client id is not reported here, only once a network call
    /// would need it, so a still-valid stored token keeps working.
    pub fn from_env(client_id: Option<&str>, verbose: bool) -> Result<Self, AuthError> {
        let logger: Arc<dyn Logger> =
            Arc::new(ConsoleLogger::new(verbose || config::debug_enabled()));
        let credentials: Arc<dyn CredentialStore> = Arc::new(KeyringStore::default());
        let store = TokenStore::from_home_dir(Arc::clone(&credentials), Arc::clone(&logger))?;

        let client_id = match config::resolve_client_id(
            client_id,
            credentials.as_ref(),
            logger.as_ref(),
        ) {
            Ok(id) => id,
            Err(AuthError::Config(reason)) if client_id.is_none() => {
                logger.debug(format_args!("{}", reason));
                String::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Self::new(
            SessionConfig::from_env(client_id),
            store,
            TokenClient::new(Arc::clone(&logger)),
            Arc::new(SystemBrowser),
            logger,
        ))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Returns an access token that is valid right now.
    ///
    /// 1. A stored, unexpired token is returned without any network call.
    /// 2. Otherwise a stored refresh token is traded for a new access token.
    /// 3. Otherwise, or if the refresh fails, the user is sent through the
    ///    browser login and the code from the redirect is exchanged.
    ///
    /// New tokens are persisted before they are returned.
    pub async fn ensure_valid_token(&self) -> Result<String, AuthError> {
        let cached = match self.store.load().await {
            Ok(tokens) if tokens.is_valid_at(Utc::now()) => {
                self.logger
                    .debug(format_args!("Using stored access token."));
                return Ok(tokens.access_token);
            }
            Ok(tokens) => {
                self.logger.debug(format_args!(
                    "Stored access token expired at {}.",
                    tokens.expires_at
                ));
                Some(tokens)
            }
            Err(StorageError::NotFound) => {
                self.logger.debug(format_args!("No stored session."));
                None
            }
            Err(e) => {
                self.logger
                    .warn(format_args!("Ignoring stored session: {}", e));
                None
            }
        };

        self.require_client_id()?;

        let refresh_token = match cached.and_then(|tokens| tokens.refresh_token) {
            Some(token) => Some(token),
            None => self.store.refresh_token().await,
        };

        if let Some(refresh_token) = refresh_token {
            self.logger.debug(format_args!(
                "Using existing refresh token to get a new access token."
            ));
            match self
                .client
                .refresh_token(&self.config.auth, &refresh_token)
                .await
            {
                Ok(tokens) => {
                    self.store.save(&tokens).await?;
                    return Ok(tokens.access_token);
                }
                Err(e) => {
                    self.logger.debug(format_args!(
                        "Failed to refresh access token: {}",
                        AuthError::refresh(e)
                    ));
                    self.logger
                        .debug(format_args!("Falling back to regular login flow."));
                }
            }
        }

        self.login().await
    }

    /// Deletes every stored credential: the client id and refresh token in
    /// the credential store, and the token file.
    pub async fn clear_session(&self) -> Result<(), AuthError> {
        self.store.clear().await?;
        Ok(())
    }

    async fn login(&self) -> Result<String, AuthError> {
        let pkce = PkcePair::generate();
        let url =
            utils::build_authorize_url(&self.config.auth, &self.config.scopes, &pkce.challenge)?;
        self.logger
            .debug(format_args!("Generated authorization URL: {}", url));

        self.logger.info(format_args!(
            "Opening the browser for Spotify authorization..."
        ));
        if let Err(e) = self.browser.open(url.as_str()) {
            self.logger.warn(format_args!(
                "{}. Please navigate to the following URL manually:\n{}",
                e, url
            ));
        }

        let server = CallbackServer::new(
            self.config.server_addr.clone(),
            self.config.callback_path.clone(),
            self.config.login_timeout,
            Arc::clone(&self.logger),
        );
        let code = match server.start().await? {
            CallbackResult::Code(code) => code,
            CallbackResult::Failed(CallbackFailure::Timeout) => {
                return Err(AuthError::Timeout(self.config.login_timeout));
            }
            CallbackResult::Failed(CallbackFailure::MissingCode) => {
                return Err(AuthError::Callback("missing code".to_string()));
            }
            CallbackResult::Failed(CallbackFailure::Denied(reason)) => {
                return Err(AuthError::Callback(format!(
                    "authorization server returned {reason}"
                )));
            }
        };

        let tokens = self
            .client
            .exchange_code(&self.config.auth, &code, &pkce.verifier)
            .await
            .map_err(AuthError::exchange)?;
        self.store.save(&tokens).await?;

        Ok(tokens.access_token)
    }

    fn require_client_id(&self) -> Result<(), AuthError> {
        if self.config.auth.client_id.trim().is_empty() {
            return Err(config::missing_client_id());
        }
        Ok(())
    }
}
