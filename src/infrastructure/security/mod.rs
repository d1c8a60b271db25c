pub mod keyring;
pub mod secret_store;

pub use secret_store::{KeyringSecretStore, MapSecretStore, SecretStore};
