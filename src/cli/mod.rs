//! # CLI Module
//!
//! Command implementations for the `spotme` binary. Each command builds a
//! [`SessionManager`](crate::management::SessionManager) from the environment,
//! does its work, and returns any failure to `main`, which decides how to
//! report it.
//!
//! ## Commands
//!
//! - [`login`] - Makes sure a valid access token is stored, refreshing or
//!   running the browser login as needed
//! - [`me`] - Prints the current user's Spotify profile
//! - [`logout`] - Removes the stored client id, refresh token and token file
//! - [`top_artists`] / [`top_songs`] - Prints a ranked page of the user's top
//!   artists or tracks with links to the neighbouring pages

mod login;
mod logout;
mod me;
mod top;

pub use login::login;
pub use logout::logout;
pub use me::me;
pub use top::{top_artists, top_songs};
