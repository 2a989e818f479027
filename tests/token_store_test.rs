mod support;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use spotme::{
    error::StorageError,
    logging::NullLogger,
    management::{CredentialStore, MemoryCredentials, TOKEN_FILE_NAME, TokenStore},
    types::TokenSet,
};
use support::{FailingCredentials, RecordingLogger, in_secs};
use tempfile::TempDir;

fn token_set(access: &str, refresh: Option<&str>) -> TokenSet {
    TokenSet {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        expires_at: in_secs(3600),
    }
}

fn store_with(home: &TempDir, credentials: Arc<dyn CredentialStore>) -> TokenStore {
    TokenStore::new(home.path(), credentials, Arc::new(NullLogger))
}

fn read_token_file(home: &TempDir) -> String {
    std::fs::read_to_string(home.path().join(TOKEN_FILE_NAME)).unwrap()
}

#[tokio::test]
async fn test_round_trip_with_credential_store() {
    let home = TempDir::new().unwrap();
    let credentials = Arc::new(MemoryCredentials::new());
    let store = store_with(&home, credentials.clone());
    let tokens = token_set("AT1", Some("RT1"));

    store.save(&tokens).await.unwrap();

    assert_eq!(store.load().await.unwrap(), tokens);
    assert_eq!(
        credentials.get("refresh_token").unwrap().as_deref(),
        Some("RT1")
    );
    // Refresh token lives in the credential store only
    let file = read_token_file(&home);
    assert!(!file.contains("refresh_token"));
    assert!(file.contains("access_token=AT1\n"));
}

#[tokio::test]
async fn test_falls_back_to_file_when_credential_store_fails() {
    let home = TempDir::new().unwrap();
    let logger = Arc::new(RecordingLogger::default());
    let store = TokenStore::new(home.path(), Arc::new(FailingCredentials), logger.clone());
    let tokens = token_set("AT1", Some("RT1"));

    store.save(&tokens).await.unwrap();

    assert!(read_token_file(&home).contains("refresh_token=RT1\n"));
    assert!(!logger.warnings().is_empty());
    assert_eq!(store.load().await.unwrap(), tokens);
    assert_eq!(store.refresh_token().await.as_deref(), Some("RT1"));
}

#[tokio::test]
async fn test_save_rewrites_instead_of_appending() {
    let home = TempDir::new().unwrap();
    let store = store_with(&home, Arc::new(FailingCredentials));

    store.save(&token_set("AT1", Some("RT1"))).await.unwrap();
    store.save(&token_set("AT2", Some("RT2"))).await.unwrap();

    let file = read_token_file(&home);
    assert_eq!(file.matches("access_token=").count(), 1);
    assert_eq!(file.matches("refresh_token=").count(), 1);
    assert_eq!(file.matches("expires_at=").count(), 1);
    assert!(file.contains("access_token=AT2"));
    assert!(file.contains("refresh_token=RT2"));
}

#[tokio::test]
async fn test_expiry_is_stored_as_rfc3339() {
    let home = TempDir::new().unwrap();
    let store = store_with(&home, Arc::new(MemoryCredentials::new()));
    let tokens = token_set("AT1", None);

    store.save(&tokens).await.unwrap();

    let expected = format!(
        "expires_at={}",
        tokens
            .expires_at
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    );
    assert!(read_token_file(&home).contains(&expected));
}

#[cfg(unix)]
#[tokio::test]
async fn test_token_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let home = TempDir::new().unwrap();
    let path = home.path().join(TOKEN_FILE_NAME);
    std::fs::write(&path, "access_token=old\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    let store = store_with(&home, Arc::new(MemoryCredentials::new()));
    store.save(&token_set("AT1", Some("RT1"))).await.unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test]
async fn test_load_without_file_is_not_found() {
    let home = TempDir::new().unwrap();
    let store = store_with(&home, Arc::new(MemoryCredentials::new()));

    assert!(matches!(store.load().await, Err(StorageError::NotFound)));
    assert_eq!(store.refresh_token().await, None);
}

#[tokio::test]
async fn test_load_incomplete_file_is_corrupt() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(TOKEN_FILE_NAME), "access_token=AT1\n").unwrap();
    let store = store_with(&home, Arc::new(MemoryCredentials::new()));

    assert!(matches!(store.load().await, Err(StorageError::Corrupt(_))));
}

#[tokio::test]
async fn test_refuses_to_save_expired_tokens() {
    let home = TempDir::new().unwrap();
    let store = store_with(&home, Arc::new(MemoryCredentials::new()));
    let mut tokens = token_set("AT1", Some("RT1"));
    tokens.expires_at = in_secs(-10);

    assert!(matches!(
        store.save(&tokens).await,
        Err(StorageError::Expired(_))
    ));
    assert!(!home.path().join(TOKEN_FILE_NAME).exists());
}

#[tokio::test]
async fn test_refresh_token_prefers_credential_store() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join(TOKEN_FILE_NAME),
        "access_token=AT1\nrefresh_token=RT-file\nexpires_at=2020-01-01T00:00:00Z\n",
    )
    .unwrap();
    let credentials = Arc::new(MemoryCredentials::new());
    let store = store_with(&home, credentials.clone());

    assert_eq!(store.refresh_token().await.as_deref(), Some("RT-file"));

    credentials.set("refresh_token", "RT-keyring").unwrap();
    assert_eq!(store.refresh_token().await.as_deref(), Some("RT-keyring"));
}

#[tokio::test]
async fn test_rejects_paths_leaving_home() {
    let home = TempDir::new().unwrap();
    let store = store_with(&home, Arc::new(MemoryCredentials::new())).with_file_name("../escaped");

    assert!(matches!(
        store.save(&token_set("AT1", None)).await,
        Err(StorageError::OutsideHome(_))
    ));
    assert!(matches!(
        store.load().await,
        Err(StorageError::OutsideHome(_))
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn test_rejects_symlink_out_of_home() {
    let home = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let target = elsewhere.path().join("stolen");
    std::fs::write(&target, "").unwrap();
    std::os::unix::fs::symlink(&target, home.path().join(TOKEN_FILE_NAME)).unwrap();

    let store = store_with(&home, Arc::new(MemoryCredentials::new()));

    assert!(matches!(
        store.save(&token_set("AT1", Some("RT1"))).await,
        Err(StorageError::OutsideHome(_))
    ));
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "");
}

#[tokio::test]
async fn test_clear_removes_everything() {
    let home = TempDir::new().unwrap();
    let credentials = Arc::new(MemoryCredentials::new());
    credentials.set("client_id", "client-123").unwrap();
    let store = store_with(&home, credentials.clone());
    store.save(&token_set("AT1", Some("RT1"))).await.unwrap();

    store.clear().await.unwrap();

    assert!(!home.path().join(TOKEN_FILE_NAME).exists());
    assert_eq!(credentials.get("client_id").unwrap(), None);
    assert_eq!(credentials.get("refresh_token").unwrap(), None);

    // Clearing again is fine
    store.clear().await.unwrap();
}

#[tokio::test]
async fn test_clear_survives_unavailable_credential_store() {
    let home = TempDir::new().unwrap();
    let logger = Arc::new(RecordingLogger::default());
    let store = TokenStore::new(home.path(), Arc::new(FailingCredentials), logger.clone());
    store.save(&token_set("AT1", Some("RT1"))).await.unwrap();
    let warnings_before = logger.warnings().len();

    store.clear().await.unwrap();

    assert!(!home.path().join(TOKEN_FILE_NAME).exists());
    // One warning per credential store account
    assert_eq!(logger.warnings().len(), warnings_before + 2);
}

#[tokio::test]
async fn test_short_lived_fresh_token_can_be_saved() {
    let home = TempDir::new().unwrap();
    let store = store_with(&home, Arc::new(MemoryCredentials::new()));
    let response: spotme::types::TokenResponse =
        serde_json::from_str(r#"{"access_token":"AT1","expires_in":1}"#).unwrap();
    let tokens =
        spotme::spotify::auth::token_set_from_response(response, Some("RT1"), chrono::Utc::now())
            .unwrap();

    store.save(&tokens).await.unwrap();

    assert_eq!(store.load().await.unwrap().access_token, "AT1");
}
