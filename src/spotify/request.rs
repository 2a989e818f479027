use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::Res;

/// Bearer-authenticated GET against the Web API, decoding a JSON body.
///
/// Non-success answers become an error carrying the status and body.
pub async fn get_json<T: DeserializeOwned>(client: &Client, url: &str, token: &str) -> Res<T> {
    let res = client.get(url).bearer_auth(token).send().await?;

    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        return Err(format!("API request failed with status {}: {}", status, body).into());
    }

    Ok(res.json::<T>().await?)
}
