// 🪪 Entity base - identity, timestamps, and the field reader
//
// Every model embeds a BaseModel. The id never changes once assigned;
// updated_at moves forward on every save.

use chrono::{Duration, NaiveDateTime, SubsecRound, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::DecodeError;

use super::ModelKind;

/// Serialized form of an entity: field name to JSON value
pub type FieldMap = Map<String, Value>;

/// Timestamps are naive UTC with microsecond precision
pub type Timestamp = NaiveDateTime;

/// Discriminator field carried by every serialized entity
pub const CLASS_FIELD: &str = "__class__";

/// Textual timestamp format used in the file store and the database
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

// Parsing accepts a missing or shorter fraction
const PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Current time truncated to what the textual format can represent
pub fn now() -> Timestamp {
    Utc::now().naive_utc().trunc_subsecs(6)
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(TIME_FORMAT).to_string()
}

pub fn parse_timestamp(text: &str) -> Result<Timestamp, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, PARSE_FORMAT)
}

// ============================================================================
// BASE MODEL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseModel {
    /// Stable identity (UUID v4)
    pub id: String,
    #[serde(serialize_with = "timestamp_text")]
    pub created_at: Timestamp,
    #[serde(serialize_with = "timestamp_text")]
    pub updated_at: Timestamp,
}

fn timestamp_text<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

impl BaseModel {
    /// Fresh identity with both timestamps set to now
    pub fn new() -> Self {
        let now = now();
        BaseModel {
            id: new_id(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstruction path: read id and timestamps, defaulting what is absent.
    pub fn from_fields(fields: &mut FieldReader) -> Result<Self, DecodeError> {
        let id = match fields.optional_string("id")? {
            Some(id) if id.is_empty() => {
                return Err(DecodeError::Invalid {
                    field: "id".to_string(),
                    reason: "must not be empty".to_string(),
                })
            }
            Some(id) => id,
            None => new_id(),
        };
        let created_at = fields.timestamp("created_at")?.unwrap_or_else(now);
        let updated_at = fields.timestamp("updated_at")?.unwrap_or(created_at);

        if updated_at < created_at {
            return Err(DecodeError::Invalid {
                field: "updated_at".to_string(),
                reason: "earlier than created_at".to_string(),
            });
        }

        Ok(BaseModel {
            id,
            created_at,
            updated_at,
        })
    }

    /// Refresh updated_at, always moving it strictly forward
    pub fn touch(&mut self) {
        let now = now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }
}

impl Default for BaseModel {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// FIELD READER
// ============================================================================

/// Consumes a serialized mapping field by field.
///
/// Absent (or null) fields fall back to the type's default; present fields of
/// the wrong JSON type fail with an error naming the field. Whatever is left
/// over after a model has read its fields is rejected by [`FieldReader::finish`].
pub struct FieldReader {
    fields: FieldMap,
}

impl FieldReader {
    pub fn new(fields: FieldMap) -> Self {
        FieldReader { fields }
    }

    fn take(&mut self, name: &str) -> Option<Value> {
        match self.fields.remove(name) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    fn wrong_type(name: &str, expected: &'static str) -> DecodeError {
        DecodeError::WrongType {
            field: name.to_string(),
            expected,
        }
    }

    /// Drop the discriminator, checking it names the expected kind
    pub fn check_class(&mut self, kind: ModelKind) -> Result<(), DecodeError> {
        match self.take(CLASS_FIELD) {
            None => Ok(()),
            Some(Value::String(found)) if found == kind.as_str() => Ok(()),
            Some(Value::String(found)) => Err(DecodeError::ClassMismatch {
                expected: kind.as_str().to_string(),
                found,
            }),
            Some(_) => Err(Self::wrong_type(CLASS_FIELD, "string")),
        }
    }

    pub fn optional_string(&mut self, name: &str) -> Result<Option<String>, DecodeError> {
        match self.take(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(Self::wrong_type(name, "string")),
        }
    }

    pub fn string(&mut self, name: &str) -> Result<String, DecodeError> {
        Ok(self.optional_string(name)?.unwrap_or_default())
    }

    pub fn int(&mut self, name: &str) -> Result<i64, DecodeError> {
        match self.take(name) {
            None => Ok(0),
            Some(value) => value.as_i64().ok_or_else(|| Self::wrong_type(name, "integer")),
        }
    }

    pub fn float(&mut self, name: &str) -> Result<f64, DecodeError> {
        match self.take(name) {
            None => Ok(0.0),
            Some(value) => value.as_f64().ok_or_else(|| Self::wrong_type(name, "number")),
        }
    }

    pub fn string_list(&mut self, name: &str) -> Result<Vec<String>, DecodeError> {
        match self.take(name) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    _ => Err(Self::wrong_type(name, "list of strings")),
                })
                .collect(),
            Some(_) => Err(Self::wrong_type(name, "list of strings")),
        }
    }

    pub fn timestamp(&mut self, name: &str) -> Result<Option<Timestamp>, DecodeError> {
        match self.optional_string(name)? {
            None => Ok(None),
            Some(text) => parse_timestamp(&text)
                .map(Some)
                .map_err(|source| DecodeError::Timestamp {
                    field: name.to_string(),
                    source,
                }),
        }
    }

    /// Reject any field the model did not claim
    pub fn finish(self) -> Result<(), DecodeError> {
        match self.fields.into_iter().next() {
            Some((name, _)) => Err(DecodeError::UnknownField(name)),
            None => Ok(()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
