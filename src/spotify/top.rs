use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    Res,
    spotify::request::get_json,
    types::{Paging, TopArtist, TopKind, TopQuery, TopTrack},
};

/// Largest page the top endpoint serves.
pub const MAX_LIMIT: u32 = 50;

/// Builds `{api_url}/me/top/{kind}` with `limit`, `offset` and `time_range`.
///
/// # Errors
///
/// Fails when `api_url` is not a valid base URL or `limit` is outside
/// `1..=50`.
pub fn top_url(api_url: &str, kind: TopKind, query: &TopQuery) -> Res<Url> {
    if query.limit == 0 || query.limit > MAX_LIMIT {
        return Err(format!("limit must be between 1 and {MAX_LIMIT}, got {}", query.limit).into());
    }

    let mut url = Url::parse(&format!(
        "{}/me/top/{}",
        api_url.trim_end_matches('/'),
        kind.path_segment()
    ))?;
    url.query_pairs_mut()
        .append_pair("limit", &query.limit.to_string())
        .append_pair("offset", &query.offset.to_string())
        .append_pair("time_range", query.time_range.as_query());
    Ok(url)
}

/// The user's most listened artists.
pub async fn fetch_top_artists(
    client: &Client,
    api_url: &str,
    token: &str,
    query: &TopQuery,
) -> Res<Paging<TopArtist>> {
    let url = top_url(api_url, TopKind::Artists, query)?;
    fetch_page(client, url.as_str(), token).await
}

/// The user's most listened tracks.
pub async fn fetch_top_tracks(
    client: &Client,
    api_url: &str,
    token: &str,
    query: &TopQuery,
) -> Res<Paging<TopTrack>> {
    let url = top_url(api_url, TopKind::Tracks, query)?;
    fetch_page(client, url.as_str(), token).await
}

/// Fetches a page by its full URL, e.g. a [`Paging::next`] link.
pub async fn fetch_page<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    token: &str,
) -> Res<Paging<T>> {
    get_json(client, url, token).await
}
