//! Spotify Session Library
//!
//! This library keeps a Spotify OAuth 2.0 session usable across process runs.
//! It performs the Authorization Code flow with PKCE against the Spotify
//! accounts service, stores the resulting tokens in the OS credential store
//! and a private file in the user's home directory, and refreshes or
//! re-acquires them when they expire.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the transient OAuth callback listener
//! - `browser` - Opening the authorization URL in the user's browser
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error types shared by the session components
//! - `logging` - Injectable log sinks
//! - `management` - Token persistence and the session state machine
//! - `server` - Loopback HTTP listener that captures the authorization code
//! - `spotify` - Spotify token endpoint and Web API calls
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE helpers and authorization URL construction
//!
//! # Example
//!
//! ```
//! use spotme::{config, management::SessionManager};
//!
//! #[tokio::main]
//! async fn main() -> spotme::Res<()> {
//!     config::load_env().await?;
//!     let session = SessionManager::from_env(None, false)?;
//!     let token = session.ensure_valid_token().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used by the command layer, where errors from several components are
/// reported to the user as-is. The session components themselves return
/// [`error::AuthError`] so callers can match on the cause.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Starting authentication process...");
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Authentication completed successfully");
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only the binary entry point uses this. Library code returns errors and
/// leaves the decision to terminate to its caller.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Cache file not found, will create new one");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
