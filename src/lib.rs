//! StringStore: an in-memory string key-value store
//!
//! The [`Store`] is usable on its own as a library. The [`server`] module
//! puts it behind a Redis-compatible TCP interface.

pub mod config;
pub mod protocol;
pub mod server;
pub mod store;

pub use config::{Config, ConfigError};
pub use server::Server;
pub use store::Store;
