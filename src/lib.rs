// Credvault — Library root
//
// Re-exports the codec, store, users, service, config, and CLI modules.

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod service;
pub mod store;
pub mod users;

pub use error::{ErrorKind, Result, VaultError};
