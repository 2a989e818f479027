//! # API Module
//!
//! HTTP handlers mounted on the transient loopback listener started by
//! [`crate::server::CallbackServer`] during a full login.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the redirect from Spotify's authorization server
//!   and hands the authorization code (or the reason there is none) back to
//!   the waiting session manager.
//!
//! The listener registers nothing else. Each login attempt builds its own
//! router, so two attempts never share routing state.

mod callback;

pub use callback::callback;
