// HBNB - Core Library
// Exposes the models and storage engines to the console, the web server, and tests

pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod storage;
pub mod views;
#[cfg(feature = "server")]
pub mod web;

// Re-export commonly used types
pub use config::{Config, DbConfig, StorageBackend};
pub use console::Console;
pub use error::{ConfigError, DecodeError, StorageError};
pub use models::{
    Amenity, BaseModel, City, Entity, Model, ModelKind, Place, Review, State, User,
};
pub use storage::{open, open_or_exit, DbStorage, FileStorage, Objects, Storage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
