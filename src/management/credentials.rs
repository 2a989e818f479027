use std::{collections::HashMap, sync::Mutex};

use crate::error::StorageError;

pub const SERVICE_NAME: &str = "spotme-cli";
pub const ACCOUNT_CLIENT_ID: &str = "client_id";
pub const ACCOUNT_REFRESH_TOKEN: &str = "refresh_token";

/// Secret storage addressed by account name under one service.
pub trait CredentialStore: Send + Sync {
    /// Returns `Ok(None)` when no entry exists for `account`.
    fn get(&self, account: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, account: &str, secret: &str) -> Result<(), StorageError>;

    /// Deleting a missing entry is not an error.
    fn delete(&self, account: &str) -> Result<(), StorageError>;
}

/// The OS-native credential store (Keychain, Credential Manager, kernel keyring).
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, account: &str) -> Result<keyring::Entry, StorageError> {
        keyring::Entry::new(&self.service, account)
            .map_err(|e| StorageError::Credential(format!("cannot open entry {account}: {e}")))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self, account: &str) -> Result<Option<String>, StorageError> {
        match self.entry(account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::Credential(format!(
                "cannot read {account}: {e}"
            ))),
        }
    }

    fn set(&self, account: &str, secret: &str) -> Result<(), StorageError> {
        self.entry(account)?
            .set_password(secret)
            .map_err(|e| StorageError::Credential(format!("cannot store {account}: {e}")))
    }

    fn delete(&self, account: &str) -> Result<(), StorageError> {
        match self.entry(account)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StorageError::Credential(format!(
                "cannot delete {account}: {e}"
            ))),
        }
    }
}

/// Process-local store, for tests and machines without a usable keyring.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Credential("in-memory store poisoned".to_string()))
    }
}

impl CredentialStore for MemoryCredentials {
    fn get(&self, account: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries()?.get(account).cloned())
    }

    fn set(&self, account: &str, secret: &str) -> Result<(), StorageError> {
        self.entries()?
            .insert(account.to_string(), secret.to_string());
        Ok(())
    }

    fn delete(&self, account: &str) -> Result<(), StorageError> {
        self.entries()?.remove(account);
        Ok(())
    }
}
