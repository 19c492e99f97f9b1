// 🗄️ Database Storage - SQLite tables behind the Storage trait
//
// The "session" is one explicit transaction on the connection: writes are
// applied as they are registered (so queries see them), `persist` commits,
// `close` rolls back whatever was not committed. Foreign keys are checked at
// commit time and parents cascade their deletes to children.

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;

use crate::config::DbConfig;
use crate::error::StorageError;
use crate::models::{composite_key, FieldMap, Model, ModelKind, CLASS_FIELD};

use super::{Objects, Storage};

/// Columns of the places table that live in the join table instead
const AMENITY_IDS: &str = "amenity_ids";

pub fn setup_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS states (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS cities (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            state_id TEXT NOT NULL
                REFERENCES states(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            email TEXT NOT NULL,
            password TEXT NOT NULL,
            first_name TEXT,
            last_name TEXT
        );

        CREATE TABLE IF NOT EXISTS places (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            city_id TEXT NOT NULL
                REFERENCES cities(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            user_id TEXT NOT NULL
                REFERENCES users(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            name TEXT NOT NULL,
            description TEXT,
            number_rooms INTEGER NOT NULL DEFAULT 0,
            number_bathrooms INTEGER NOT NULL DEFAULT 0,
            max_guest INTEGER NOT NULL DEFAULT 0,
            price_by_night INTEGER NOT NULL DEFAULT 0,
            latitude REAL,
            longitude REAL
        );

        CREATE TABLE IF NOT EXISTS amenities (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            place_id TEXT NOT NULL
                REFERENCES places(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            user_id TEXT NOT NULL
                REFERENCES users(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            text TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS place_amenity (
            place_id TEXT NOT NULL
                REFERENCES places(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            amenity_id TEXT NOT NULL
                REFERENCES amenities(id) ON DELETE CASCADE DEFERRABLE INITIALLY DEFERRED,
            PRIMARY KEY (place_id, amenity_id)
        );",
    )?;
    Ok(())
}

pub struct DbStorage {
    conn: Connection,
}

impl DbStorage {
    /// Open the configured database; tables are created by `reload`
    pub fn connect(config: &DbConfig) -> Result<Self, StorageError> {
        let path = config.sqlite_path();
        tracing::debug!(?config, path = %path.display(), "opening database");
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(DbStorage { conn })
    }

    fn in_session(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn begin(&self) -> Result<(), StorageError> {
        if !self.in_session() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn rollback(&self) -> Result<(), StorageError> {
        if self.in_session() {
            self.conn.execute_batch("ROLLBACK")?;
            tracing::debug!("rolled back uncommitted session");
        }
        Ok(())
    }

    fn upsert(&self, model: &Model) -> Result<(), StorageError> {
        let kind = model.kind();
        let mut dict = model.to_dict();
        dict.remove(CLASS_FIELD);
        let amenity_ids = dict.remove(AMENITY_IDS);

        let columns: Vec<&String> = dict.keys().collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| c.as_str() != "id")
            .map(|c| format!("{0} = excluded.{0}", c))
            .collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT(id) DO UPDATE SET {}",
            kind.table_name(),
            columns.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", "),
            placeholders.join(", "),
            updates.join(", "),
        );
        self.conn
            .execute(&sql, params_from_iter(dict.values().map(to_sql)))?;

        if let Some(Value::Array(ids)) = amenity_ids {
            self.conn.execute(
                "DELETE FROM place_amenity WHERE place_id = ?1",
                params![model.id()],
            )?;
            for id in ids.iter().filter_map(Value::as_str) {
                self.conn.execute(
                    "INSERT OR IGNORE INTO place_amenity (place_id, amenity_id) VALUES (?1, ?2)",
                    params![model.id(), id],
                )?;
            }
        }

        Ok(())
    }

    fn load(&self, kind: ModelKind) -> Result<Vec<Model>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {} ORDER BY rowid", kind.table_name()))?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt
            .query_map([], |row| {
                let mut dict = FieldMap::new();
                for (i, name) in names.iter().enumerate() {
                    if let Some(value) = from_sql(row.get_ref(i)?) {
                        dict.insert(name.clone(), value);
                    }
                }
                Ok(dict)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut models = Vec::with_capacity(rows.len());
        for mut dict in rows {
            let id = dict
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if kind == ModelKind::Place {
                dict.insert(AMENITY_IDS.to_string(), Value::from(self.amenity_ids(&id)?));
            }
            let model = Model::from_dict(kind, dict).map_err(|source| StorageError::Decode {
                key: composite_key(kind, &id),
                source,
            })?;
            models.push(model);
        }
        Ok(models)
    }

    fn amenity_ids(&self, place_id: &str) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT amenity_id FROM place_amenity WHERE place_id = ?1 ORDER BY rowid")?;
        let ids = stmt
            .query_map(params![place_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Option<Value> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(Value::from(i)),
        ValueRef::Real(f) => Some(Value::from(f)),
        ValueRef::Text(bytes) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Blob(_) => None,
    }
}

impl Storage for DbStorage {
    fn register(&mut self, model: Model) -> Result<(), StorageError> {
        self.begin()?;
        tracing::debug!(key = %model.key(), "register");
        self.upsert(&model)
    }

    fn query(&self, kind: Option<ModelKind>) -> Result<Objects, StorageError> {
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => ModelKind::ALL.to_vec(),
        };

        let mut objects = Objects::new();
        for kind in kinds {
            for model in self.load(kind)? {
                objects.insert(model.key(), model);
            }
        }
        Ok(objects)
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        if !self.in_session() {
            return Ok(());
        }
        if let Err(e) = self.conn.execute_batch("COMMIT") {
            // A failed commit leaves the transaction open
            self.rollback()?;
            return Err(e.into());
        }
        tracing::debug!("committed session");
        Ok(())
    }

    fn reload(&mut self) -> Result<(), StorageError> {
        self.rollback()?;
        setup_schema(&self.conn)?;
        tracing::info!("database tables ready");
        Ok(())
    }

    fn remove(&mut self, model: Option<&Model>) -> Result<(), StorageError> {
        let Some(model) = model else {
            return Ok(());
        };

        self.begin()?;
        let deleted = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", model.kind().table_name()),
            params![model.id()],
        )?;
        if deleted == 0 {
            return Err(StorageError::NotFound(model.key()));
        }
        tracing::debug!(key = %model.key(), "removed");
        Ok(())
    }

    fn close(&mut self) -> Result<(), StorageError> {
        self.rollback()
    }
}

// ============================================================================
// TESTS
// ============================================================================
