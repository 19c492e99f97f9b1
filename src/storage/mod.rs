//! Storage engines
//!
//! Two interchangeable backends behind the [`Storage`] trait:
//! - [`FileStorage`]: live collection in memory, whole-collection JSON file
//! - [`DbStorage`]: SQLite tables, one open transaction as the session
//!
//! [`open`] picks the backend from configuration and reloads it once. The
//! returned handle is passed explicitly to whatever needs the store.

pub mod db;
pub mod file;

pub use db::DbStorage;
pub use file::FileStorage;

use std::collections::BTreeMap;

use crate::config::{Config, StorageBackend};
use crate::error::StorageError;
use crate::models::{composite_key, Entity, Model, ModelKind};

/// Live collection: composite key (`"<TypeName>.<id>"`) to entity
pub type Objects = BTreeMap<String, Model>;

/// Uniform persistence contract shared by both backends.
///
/// Callers are expected to use one handle from one thread of control at a
/// time; neither backend coordinates with other processes.
pub trait Storage: Send {
    /// Stage an entity under its composite key, replacing any previous entry
    fn register(&mut self, model: Model) -> Result<(), StorageError>;

    /// Every known entity, or only those whose discriminator equals `kind`
    fn query(&self, kind: Option<ModelKind>) -> Result<Objects, StorageError>;

    /// Make everything registered or removed so far durable
    fn persist(&mut self) -> Result<(), StorageError>;

    /// Load durable state into the live view
    fn reload(&mut self) -> Result<(), StorageError>;

    /// Remove an entity; `None` is a no-op, an unknown entity is `NotFound`
    fn remove(&mut self, model: Option<&Model>) -> Result<(), StorageError>;

    /// End the current unit of work
    fn close(&mut self) -> Result<(), StorageError>;

    fn get(&self, kind: ModelKind, id: &str) -> Result<Option<Model>, StorageError> {
        let key = composite_key(kind, id);
        Ok(self.query(Some(kind))?.remove(&key))
    }

    fn count(&self, kind: Option<ModelKind>) -> Result<usize, StorageError> {
        Ok(self.query(kind)?.len())
    }
}

/// Typed view of one model kind
pub fn all<T: Entity>(storage: &dyn Storage) -> Result<Vec<T>, StorageError> {
    Ok(storage
        .query(Some(T::KIND))?
        .into_values()
        .filter_map(|model| T::try_from(model).ok())
        .collect())
}

// ============================================================================
// BACKEND SELECTION
// ============================================================================

/// Build the configured backend and reload it exactly once.
pub fn open(config: &Config) -> Result<Box<dyn Storage>, StorageError> {
    let mut storage: Box<dyn Storage> = match &config.backend {
        StorageBackend::File => {
            tracing::info!(path = %config.file_path.display(), "using file storage");
            Box::new(FileStorage::new(&config.file_path))
        }
        StorageBackend::Db(db) => {
            tracing::info!(
                database = %db.database,
                user = %db.user,
                host = %db.host,
                "using database storage"
            );
            Box::new(DbStorage::connect(db)?)
        }
    };

    storage.reload()?;
    Ok(storage)
}

/// Like [`open`], but a store that cannot be loaded ends the process.
///
/// Continuing with an empty live collection would silently overwrite the
/// persisted data on the next save.
pub fn open_or_exit(config: &Config) -> Box<dyn Storage> {
    match open(config) {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!(error = %e, "unable to load storage");
            eprintln!("Unable to load storage: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::models::{City, State};

    #[test]
    fn test_open_file_backend_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");

        let mut first = FileStorage::new(&path);
        State::new("Oregon").save(&mut first).unwrap();

        let config = Config {
            backend: StorageBackend::File,
            file_path: path,
            ..Config::default()
        };
        let storage = open(&config).unwrap();

        assert_eq!(storage.count(Some(ModelKind::State)).unwrap(), 1);
    }

    #[test]
    fn test_open_db_backend_creates_tables() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            backend: StorageBackend::Db(DbConfig {
                database: dir.path().join("hbnb.db").display().to_string(),
                ..DbConfig::default()
            }),
            ..Config::default()
        };

        let storage = open(&config).unwrap();
        assert_eq!(storage.count(None).unwrap(), 0);
    }

    #[test]
    fn test_open_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = Config {
            file_path: path,
            ..Config::default()
        };

        assert!(matches!(open(&config), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_typed_all_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("file.json"));

        let mut state = State::new("Ohio");
        state.save(&mut storage).unwrap();
        City::new(&state.base.id, "Columbus").save(&mut storage).unwrap();

        let states = all::<State>(&storage).unwrap();
        assert_eq!(states, vec![state.clone()]);

        let found = storage.get(ModelKind::State, &state.base.id).unwrap();
        assert_eq!(found, Some(Model::State(state)));
        assert!(storage.get(ModelKind::City, "nope").unwrap().is_none());
        assert_eq!(storage.count(None).unwrap(), 2);
    }
}
