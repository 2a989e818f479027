#![allow(dead_code)]

use std::{
    fmt,
    net::TcpListener,
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, Utc};
use spotme::{
    browser::BrowserLauncher,
    error::{BrowserError, StorageError},
    logging::{Level, Logger},
    management::CredentialStore,
};

/// Finds a loopback address nothing is listening on right now.
pub fn free_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

/// `now + secs`, truncated to whole seconds like stored expiries.
pub fn in_secs(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(Utc::now().timestamp() + secs, 0).unwrap()
}

/// GETs `url`, retrying while the listener is not up yet.
pub async fn get_with_retry(url: &str) -> reqwest::Response {
    for _ in 0..250 {
        match reqwest::get(url).await {
            Ok(res) => return res,
            Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    panic!("nothing answered at {url}");
}

#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingLogger {
    pub fn warnings(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, _)| *level == Level::Warn)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}

/// A credential store that is never available, like a locked or missing keyring.
pub struct FailingCredentials;

impl CredentialStore for FailingCredentials {
    fn get(&self, _account: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Credential("keyring locked".to_string()))
    }

    fn set(&self, _account: &str, _secret: &str) -> Result<(), StorageError> {
        Err(StorageError::Credential("keyring locked".to_string()))
    }

    fn delete(&self, _account: &str) -> Result<(), StorageError> {
        Err(StorageError::Credential("keyring locked".to_string()))
    }
}

/// Records opened URLs and, when given a code, plays the user approving the
/// request by following the redirect.
#[derive(Default)]
pub struct FakeBrowser {
    code: Option<String>,
    opened: Mutex<Vec<String>>,
}

impl FakeBrowser {
    pub fn approving(code: &str) -> Arc<Self> {
        Arc::new(Self {
            code: Some(code.to_string()),
            opened: Mutex::default(),
        })
    }

    pub fn idle() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl BrowserLauncher for FakeBrowser {
    fn open(&self, url: &str) -> Result<(), BrowserError> {
        self.opened.lock().unwrap().push(url.to_string());

        if let Some(code) = self.code.clone() {
            let url = url::Url::parse(url).unwrap();
            let redirect = url
                .query_pairs()
                .find(|(k, _)| k == "redirect_uri")
                .map(|(_, v)| v.into_owned())
                .unwrap();
            tokio::spawn(async move {
                get_with_retry(&format!("{redirect}?code={code}")).await;
            });
        }
        Ok(())
    }
}

/// A browser that cannot be launched.
pub struct BrokenBrowser;

impl BrowserLauncher for BrokenBrowser {
    fn open(&self, _url: &str) -> Result<(), BrowserError> {
        Err(BrowserError(std::io::Error::other("no display")))
    }
}
