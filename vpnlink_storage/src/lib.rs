pub mod secrets;
pub mod vault;

// re-export ergonomic entry points
pub use secrets::KeyringSecrets;
pub use vault::ProfileVault;
