//! Presents the authorization URL to the user.
//!
//! Opening a browser is best-effort: the session manager logs a failure and
//! carries on, since the user can always paste the URL by hand.

use crate::error::BrowserError;

pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> Result<(), BrowserError>;
}

/// Opens URLs with the platform's default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), BrowserError> {
        webbrowser::open(url).map_err(BrowserError)
    }
}
