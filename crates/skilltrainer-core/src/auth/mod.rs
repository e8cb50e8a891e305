//! Authentication module for managing the credential pair lifecycle.
//!
//! This module provides:
//! - `Session`: explicit session object owning the token store and login redirect
//! - `TokenStore`: key-value interface with in-memory, file and keychain backends
//!
//! Tokens are persisted under the `access_token` and `refresh_token` keys.

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::KeyringTokenStore;
pub use session::{
    CredentialPair, LogRedirect, LoginRedirect, Session, SessionState, DEFAULT_LOGIN_PATH,
};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
