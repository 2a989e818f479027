//! # Spotify Integration Module
//!
//! Calls against Spotify's accounts service and Web API.
//!
//! ## Modules
//!
//! [`auth`] - The token endpoint:
//! - **Authorization Code Grant**: exchanges the code captured by the loopback
//!   listener, together with the PKCE verifier, for an access/refresh pair
//! - **Refresh Token Grant**: renews an expired access token, keeping the
//!   previous refresh token when the server does not issue a new one
//!
//! [`me`] - The current user's profile.
//!
//! [`top`] - The user's top artists and tracks, one page at a time. Each page
//! carries `next`/`previous` links that [`top::fetch_page`] follows as-is.
//!
//! ## Error Handling
//!
//! Token endpoint failures are returned as [`crate::error::TokenError`] and
//! never retried here. The session manager decides whether a failed refresh
//! falls back to a full login.

pub mod auth;
pub mod me;
mod request;
pub mod top;

pub use auth::TokenClient;
pub use me::fetch_me;
pub use top::{fetch_top_artists, fetch_top_tracks};
