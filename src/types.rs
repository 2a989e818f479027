use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::utils;

/// Endpoints and client identity for one login or refresh attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub redirect_uri: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub client_id: String,
}

impl AuthConfig {
    /// Builds a config whose redirect URI points at the loopback listener on
    /// `server_addr` (`host:port`).
    pub fn new(
        client_id: impl Into<String>,
        server_addr: &str,
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            redirect_uri: format!("http://{server_addr}{}", crate::server::CALLBACK_PATH),
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            client_id: client_id.into(),
        }
    }
}

/// A code verifier and the S256 challenge derived from it.
///
/// Generated fresh for every full login and never persisted.
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    pub fn generate() -> Self {
        let verifier = utils::generate_code_verifier();
        let challenge = utils::generate_code_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Persisted credentials. The access token is usable while `now < expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Body of a successful token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

/// Outcome delivered by the callback listener, exactly once per login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackResult {
    Code(String),
    Failed(CallbackFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackFailure {
    /// A request reached the callback path without a `code` parameter.
    MissingCode,
    /// The timer fired before any request arrived.
    Timeout,
    /// The authorization server redirected back with `error=<reason>`.
    Denied(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub product: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Tabled)]
pub struct ProfileTableRow {
    pub name: String,
    pub email: String,
    pub product: String,
    pub profile: String,
}

impl From<Profile> for ProfileTableRow {
    fn from(p: Profile) -> Self {
        let unknown = || "Unknown".to_string();
        Self {
            name: p.display_name.unwrap_or_else(unknown),
            email: p.email.unwrap_or_else(unknown),
            product: p.product.unwrap_or_else(unknown),
            profile: p.external_urls.spotify.unwrap_or_default(),
        }
    }
}

/// One page of a Web API list endpoint. `next` and `previous` are full URLs,
/// absent at either end of the list.
#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
    pub previous: Option<String>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

impl<T> Paging<T> {
    /// Offset of the following page, if there is one.
    pub fn next_offset(&self) -> Option<u64> {
        self.next.as_ref().map(|_| self.offset + self.limit)
    }

    /// Offset of the preceding page, if there is one.
    pub fn previous_offset(&self) -> Option<u64> {
        self.previous
            .as_ref()
            .map(|_| self.offset.saturating_sub(self.limit))
    }
}

/// Kind of item the top endpoint ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopKind {
    Artists,
    Tracks,
}

impl TopKind {
    pub fn path_segment(self) -> &'static str {
        match self {
            TopKind::Artists => "artists",
            TopKind::Tracks => "tracks",
        }
    }
}

/// Window the top items are computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TimeRange {
    /// About the last four weeks
    Short,
    /// About the last six months
    #[default]
    Medium,
    /// About the last year
    Long,
}

impl TimeRange {
    pub fn as_query(self) -> &'static str {
        match self {
            TimeRange::Short => "short_term",
            TimeRange::Medium => "medium_term",
            TimeRange::Long => "long_term",
        }
    }
}

/// Which page of top items to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopQuery {
    pub limit: u32,
    pub offset: u32,
    pub time_range: TimeRange,
}

impl Default for TopQuery {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
            time_range: TimeRange::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopArtist {
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub popularity: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedItem {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopTrack {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<NamedItem>,
    pub album: Option<NamedItem>,
    #[serde(default)]
    pub popularity: u32,
}

#[derive(Tabled)]
pub struct TopArtistTableRow {
    pub rank: u64,
    pub name: String,
    pub genres: String,
    pub popularity: u32,
}

impl TopArtistTableRow {
    pub fn new(rank: u64, artist: TopArtist) -> Self {
        Self {
            rank,
            name: artist.name,
            genres: artist.genres.join(", "),
            popularity: artist.popularity,
        }
    }
}

#[derive(Tabled)]
pub struct TopTrackTableRow {
    pub rank: u64,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub popularity: u32,
}

impl TopTrackTableRow {
    pub fn new(rank: u64, track: TopTrack) -> Self {
        Self {
            rank,
            name: track.name,
            // The first credited artist
            artist: track
                .artists
                .into_iter()
                .next()
                .map(|a| a.name)
                .unwrap_or_default(),
            album: track.album.map(|a| a.name).unwrap_or_default(),
            popularity: track.popularity,
        }
    }
}
