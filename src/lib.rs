pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod store;
pub mod view;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use error::{VaultError, VaultResult};
pub use store::{MemoryVault, VaultActions, VaultMutator, VaultStore};
