// 📄 File Storage - live collection in memory, JSON snapshot on disk
//
// Every persist rewrites the whole file from the live collection. There is
// no locking: one writer process at a time.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{DecodeError, StorageError};
use crate::models::{composite_key, split_key, FieldMap, Model, ModelKind};

use super::{Objects, Storage};

pub struct FileStorage {
    path: PathBuf,
    objects: Objects,
}

impl FileStorage {
    /// Empty live collection bound to `path`; call `reload` to load it
    pub fn new(path: impl AsRef<Path>) -> Self {
        FileStorage {
            path: path.as_ref().to_path_buf(),
            objects: Objects::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialized snapshot of the live collection
    fn snapshot(&self) -> FieldMap {
        self.objects
            .iter()
            .map(|(key, model)| (key.clone(), Value::Object(model.to_dict())))
            .collect()
    }

    fn decode_entry(key: &str, value: Value) -> Result<Model, StorageError> {
        let (kind, id) = split_key(key)?;

        let mut dict = match value {
            Value::Object(dict) => dict,
            _ => {
                return Err(StorageError::Decode {
                    key: key.to_string(),
                    source: DecodeError::WrongType {
                        field: key.to_string(),
                        expected: "object",
                    },
                })
            }
        };

        // The key carries the identity when the mapping omits it
        dict.entry("id").or_insert_with(|| Value::String(id.to_string()));

        let model = Model::from_dict(kind, dict).map_err(|source| StorageError::Decode {
            key: key.to_string(),
            source,
        })?;

        if model.id() != id {
            return Err(StorageError::MalformedKey(key.to_string()));
        }
        Ok(model)
    }
}

impl Storage for FileStorage {
    fn register(&mut self, model: Model) -> Result<(), StorageError> {
        let key = model.key();
        tracing::debug!(%key, "register");
        self.objects.insert(key, model);
        Ok(())
    }

    fn query(&self, kind: Option<ModelKind>) -> Result<Objects, StorageError> {
        Ok(match kind {
            None => self.objects.clone(),
            Some(kind) => {
                let prefix = kind.key_prefix();
                self.objects
                    .iter()
                    .filter(|(key, _)| key.starts_with(&prefix))
                    .map(|(key, model)| (key.clone(), model.clone()))
                    .collect()
            }
        })
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(&self.snapshot())?;
        fs::write(&self.path, bytes)?;
        tracing::debug!(path = %self.path.display(), count = self.objects.len(), "persisted");
        Ok(())
    }

    fn reload(&mut self) -> Result<(), StorageError> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no storage file yet");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        if metadata.len() == 0 {
            return Ok(());
        }

        let bytes = fs::read(&self.path)?;
        let content: FieldMap =
            serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        // Nothing reaches the live collection unless every entry decodes
        let mut decoded = Objects::new();
        for (key, value) in content {
            let model = Self::decode_entry(&key, value)?;
            decoded.insert(key, model);
        }
        let loaded = decoded.len();
        self.objects.extend(decoded);

        tracing::info!(path = %self.path.display(), loaded, "reloaded file storage");
        Ok(())
    }

    fn remove(&mut self, model: Option<&Model>) -> Result<(), StorageError> {
        let Some(model) = model else {
            return Ok(());
        };

        let key = model.key();
        match self.objects.remove(&key) {
            Some(_) => {
                tracing::debug!(%key, "removed");
                Ok(())
            }
            None => Err(StorageError::NotFound(key)),
        }
    }

    fn close(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    fn get(&self, kind: ModelKind, id: &str) -> Result<Option<Model>, StorageError> {
        Ok(self
            .objects
            .get(&composite_key(kind, id))
            .cloned())
    }
}

// ============================================================================
// TESTS
// ============================================================================
