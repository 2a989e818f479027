pub mod credentials;
mod session;
mod token_store;

pub use credentials::CredentialStore;
pub use credentials::KeyringStore;
pub use credentials::MemoryCredentials;
pub use session::SessionManager;
pub use token_store::TOKEN_FILE_NAME;
pub use token_store::TokenStore;
