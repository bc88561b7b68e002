//! Keyward Storage - persistent password backends
//!
//! Passwords are addressed by [`SecretKey`], whose textual form
//! (`username@@scope`) is shared by every backend.
//!
//! # Backends
//!
//! - `keyring` - OS keychain (feature `keychain`)
//! - `file` - redb database under the keyward data directory
//! - `memory` - process-lifetime map, used by tests and dry runs

mod file_store;
#[cfg(feature = "keychain")]
mod keyring_store;
mod memory_store;
mod types;

pub use file_store::FileSecretStore;
#[cfg(feature = "keychain")]
pub use keyring_store::KeyringSecretStore;
pub use memory_store::MemorySecretStore;
pub use types::{
    DEFAULT_SERVICE, SecretKey, SecretStore, SecretStoreError, SecretStoreKind,
    SecretStoreOptions, open_secret_store,
};
