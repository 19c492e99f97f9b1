// Entity Models
//
// Each model has:
// - A BaseModel carrying the stable identity and the two timestamps
// - An explicit list of typed domain fields
// - A discriminator (ModelKind) used in composite keys and in `__class__`

pub mod amenity;
pub mod base;
pub mod city;
pub mod place;
pub mod review;
pub mod state;
pub mod user;

pub use amenity::Amenity;
pub use base::{BaseModel, FieldMap, FieldReader, Timestamp, CLASS_FIELD, TIME_FORMAT};
pub use city::City;
pub use place::Place;
pub use review::Review;
pub use state::State;
pub use user::User;

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{DecodeError, StorageError};
use crate::storage::Storage;

// ============================================================================
// MODEL KIND (discriminator)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModelKind {
    State,
    City,
    User,
    Place,
    Amenity,
    Review,
}

impl ModelKind {
    /// Parents before children, the order tables are declared in
    pub const ALL: [ModelKind; 6] = [
        ModelKind::State,
        ModelKind::City,
        ModelKind::User,
        ModelKind::Place,
        ModelKind::Amenity,
        ModelKind::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::State => "State",
            ModelKind::City => "City",
            ModelKind::User => "User",
            ModelKind::Place => "Place",
            ModelKind::Amenity => "Amenity",
            ModelKind::Review => "Review",
        }
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            ModelKind::State => "states",
            ModelKind::City => "cities",
            ModelKind::User => "users",
            ModelKind::Place => "places",
            ModelKind::Amenity => "amenities",
            ModelKind::Review => "reviews",
        }
    }

    /// Prefix shared by every composite key of this kind
    pub fn key_prefix(&self) -> String {
        format!("{}.", self.as_str())
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| StorageError::UnknownClass(s.to_string()))
    }
}

/// `"<TypeName>.<id>"`
pub fn composite_key(kind: ModelKind, id: &str) -> String {
    format!("{}.{}", kind.as_str(), id)
}

/// Split a composite key at its first `.` into discriminator and id
pub fn split_key(key: &str) -> Result<(ModelKind, &str), StorageError> {
    match key.split_once('.') {
        Some((class, id)) if !id.is_empty() => Ok((class.parse()?, id)),
        _ => Err(StorageError::MalformedKey(key.to_string())),
    }
}

/// `[<TypeName>] (<id>) <field mapping>`
pub fn describe(kind: ModelKind, dict: &FieldMap) -> String {
    let mut fields = dict.clone();
    fields.remove(CLASS_FIELD);
    let id = fields
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    format!("[{}] ({}) {}", kind, id, Value::Object(fields))
}

// ============================================================================
// ENTITY CONTRACT
// ============================================================================

/// Identity, serialization, and persistence shared by every model type.
pub trait Entity: Clone + Serialize + Into<Model> + TryFrom<Model, Error = Model> {
    const KIND: ModelKind;

    fn base(&self) -> &BaseModel;

    fn base_mut(&mut self) -> &mut BaseModel;

    /// Read the domain fields from what is left after the base fields
    fn read_fields(base: BaseModel, fields: &mut FieldReader) -> Result<Self, DecodeError>;

    fn id(&self) -> &str {
        &self.base().id
    }

    fn key(&self) -> String {
        composite_key(Self::KIND, self.id())
    }

    fn to_dict(&self) -> FieldMap {
        // Plain structs with named fields always serialize to an object
        let mut out = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => FieldMap::new(),
        };
        out.insert(
            CLASS_FIELD.to_string(),
            Value::String(Self::KIND.as_str().to_string()),
        );
        out
    }

    fn from_dict(dict: FieldMap) -> Result<Self, DecodeError> {
        let mut fields = FieldReader::new(dict);
        fields.check_class(Self::KIND)?;
        let base = BaseModel::from_fields(&mut fields)?;
        let entity = Self::read_fields(base, &mut fields)?;
        fields.finish()?;
        Ok(entity)
    }

    /// Refresh updated_at, register with the store, persist everything
    fn save(&mut self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        self.base_mut().touch();
        storage.register(self.clone().into())?;
        storage.persist()
    }

    /// Remove from the store and persist the removal
    fn delete(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        let model: Model = self.clone().into();
        storage.remove(Some(&model))?;
        storage.persist()
    }

    fn describe(&self) -> String {
        describe(Self::KIND, &self.to_dict())
    }
}

// ============================================================================
// MODEL (closed union over the model types)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Model {
    State(State),
    City(City),
    User(User),
    Place(Place),
    Amenity(Amenity),
    Review(Review),
}

macro_rules! dispatch {
    ($model:expr, $inner:ident => $body:expr) => {
        match $model {
            Model::State($inner) => $body,
            Model::City($inner) => $body,
            Model::User($inner) => $body,
            Model::Place($inner) => $body,
            Model::Amenity($inner) => $body,
            Model::Review($inner) => $body,
        }
    };
}

impl Model {
    /// A fresh, empty instance of the given kind
    pub fn new(kind: ModelKind) -> Model {
        match kind {
            ModelKind::State => State::default().into(),
            ModelKind::City => City::default().into(),
            ModelKind::User => User::default().into(),
            ModelKind::Place => Place::default().into(),
            ModelKind::Amenity => Amenity::default().into(),
            ModelKind::Review => Review::default().into(),
        }
    }

    /// Reconstruct a model of `kind` from its serialized mapping
    pub fn from_dict(kind: ModelKind, dict: FieldMap) -> Result<Model, DecodeError> {
        Ok(match kind {
            ModelKind::State => State::from_dict(dict)?.into(),
            ModelKind::City => City::from_dict(dict)?.into(),
            ModelKind::User => User::from_dict(dict)?.into(),
            ModelKind::Place => Place::from_dict(dict)?.into(),
            ModelKind::Amenity => Amenity::from_dict(dict)?.into(),
            ModelKind::Review => Review::from_dict(dict)?.into(),
        })
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Model::State(_) => ModelKind::State,
            Model::City(_) => ModelKind::City,
            Model::User(_) => ModelKind::User,
            Model::Place(_) => ModelKind::Place,
            Model::Amenity(_) => ModelKind::Amenity,
            Model::Review(_) => ModelKind::Review,
        }
    }

    pub fn base(&self) -> &BaseModel {
        dispatch!(self, m => m.base())
    }

    pub fn base_mut(&mut self) -> &mut BaseModel {
        dispatch!(self, m => m.base_mut())
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn key(&self) -> String {
        composite_key(self.kind(), self.id())
    }

    pub fn to_dict(&self) -> FieldMap {
        dispatch!(self, m => m.to_dict())
    }

    /// Display name used by list views (`name`, else email, else text)
    pub fn label(&self) -> &str {
        match self {
            Model::State(m) => &m.name,
            Model::City(m) => &m.name,
            Model::User(m) => &m.email,
            Model::Place(m) => &m.name,
            Model::Amenity(m) => &m.name,
            Model::Review(m) => &m.text,
        }
    }

    pub fn save(&mut self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        self.base_mut().touch();
        storage.register(self.clone())?;
        storage.persist()
    }

    pub fn delete(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        storage.remove(Some(self))?;
        storage.persist()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe(self.kind(), &self.to_dict()))
    }
}

macro_rules! model_conversions {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Model {
                fn from(value: $ty) -> Self {
                    Model::$ty(value)
                }
            }

            impl TryFrom<Model> for $ty {
                type Error = Model;

                fn try_from(model: Model) -> Result<Self, Self::Error> {
                    match model {
                        Model::$ty(value) => Ok(value),
                        other => Err(other),
                    }
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.describe())
                }
            }
        )*
    };
}

model_conversions!(State, City, User, Place, Amenity, Review);

// ============================================================================
// TESTS
// ============================================================================
