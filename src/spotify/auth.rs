use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};

use crate::{
    error::TokenError,
    logging::Logger,
    types::{AuthConfig, TokenResponse, TokenSet},
};

/// Client for the token endpoint's two grant types.
///
/// Requests are not retried.
#[derive(Clone)]
pub struct TokenClient {
    http: Client,
    logger: Arc<dyn Logger>,
}

impl TokenClient {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self::with_client(Client::new(), logger)
    }

    pub fn with_client(http: Client, logger: Arc<dyn Logger>) -> Self {
        Self { http, logger }
    }

    /// Exchanges an authorization code for tokens using PKCE.
    ///
    /// The `verifier` must be the one whose challenge was sent with the
    /// authorization request that produced `code`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Status`] for any non-200 answer (carrying the
    /// response body) and [`TokenError::Malformed`] when `access_token`,
    /// `refresh_token` or a positive integer `expires_in` is missing.
    pub async fn exchange_code(
        &self,
        config: &AuthConfig,
        code: &str,
        verifier: &str,
    ) -> Result<TokenSet, TokenError> {
        let response = self
            .request_token(
                config,
                &[
                    ("client_id", config.client_id.as_str()),
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", config.redirect_uri.as_str()),
                    ("code_verifier", verifier),
                ],
            )
            .await?;

        if response.refresh_token.is_none() {
            return Err(TokenError::Malformed(
                "missing field `refresh_token`".to_string(),
            ));
        }

        let tokens = token_set_from_response(response, None, Utc::now())?;
        self.logger
            .debug(format_args!("Authorization code exchanged for tokens."));
        Ok(tokens)
    }

    /// Obtains a new access token with a refresh token.
    ///
    /// When the server does not rotate the refresh token, the returned set
    /// carries `refresh_token` forward unchanged.
    pub async fn refresh_token(
        &self,
        config: &AuthConfig,
        refresh_token: &str,
    ) -> Result<TokenSet, TokenError> {
        let response = self
            .request_token(
                config,
                &[
                    ("client_id", config.client_id.as_str()),
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                ],
            )
            .await?;

        let tokens = token_set_from_response(response, Some(refresh_token), Utc::now())?;
        self.logger
            .debug(format_args!("Access token refreshed successfully."));
        Ok(tokens)
    }

    async fn request_token(
        &self,
        config: &AuthConfig,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, TokenError> {
        let res = self
            .http
            .post(&config.token_endpoint)
            .form(form)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if status != StatusCode::OK {
            return Err(TokenError::Status { status, body });
        }

        serde_json::from_str(&body).map_err(|e| TokenError::Malformed(e.to_string()))
    }
}

/// Turns a token response received at `issued_at` into a [`TokenSet`].
///
/// `expires_at` is rounded up to whole seconds, the precision it is stored
/// with, so it is never earlier than `issued_at + expires_in`.
/// `previous_refresh` is used when the response carries no refresh token of
/// its own.
pub fn token_set_from_response(
    response: TokenResponse,
    previous_refresh: Option<&str>,
    issued_at: DateTime<Utc>,
) -> Result<TokenSet, TokenError> {
    if response.access_token.is_empty() {
        return Err(TokenError::Malformed("empty `access_token`".to_string()));
    }
    if response.expires_in <= 0 {
        return Err(TokenError::Malformed(format!(
            "`expires_in` must be positive, got {}",
            response.expires_in
        )));
    }

    let issued_secs =
        issued_at.timestamp() + i64::from(issued_at.timestamp_subsec_nanos() > 0);
    let expires_at = DateTime::from_timestamp(issued_secs, 0)
        .zip(Duration::try_seconds(response.expires_in))
        .and_then(|(t, lifetime)| t.checked_add_signed(lifetime))
        .ok_or_else(|| {
            TokenError::Malformed(format!(
                "`expires_in` out of range: {}",
                response.expires_in
            ))
        })?;

    Ok(TokenSet {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string)),
        expires_at,
    })
}
