use reqwest::Client;

use crate::{Res, spotify::request::get_json, types::Profile};

/// Fetches the current user's profile from the `/me` endpoint.
///
/// `api_url` is the Web API base, e.g. `https://api.spotify.com/v1`, and
/// `token` a valid access token as returned by
/// [`SessionManager::ensure_valid_token`](crate::management::SessionManager::ensure_valid_token).
pub async fn fetch_me(client: &Client, api_url: &str, token: &str) -> Res<Profile> {
    get_json(client, &format!("{}/me", api_url.trim_end_matches('/')), token).await
}
