// 🏙️ City Entity - belongs to a State, hosts Places

use crate::error::{DecodeError, StorageError};
use crate::storage::{self, Storage};

use super::{BaseModel, Entity, FieldReader, ModelKind, Place};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct City {
    #[serde(flatten)]
    pub base: BaseModel,
    /// Foreign key to State
    pub state_id: String,
    pub name: String,
}

impl City {
    pub fn new(state_id: impl Into<String>, name: impl Into<String>) -> Self {
        City {
            base: BaseModel::new(),
            state_id: state_id.into(),
            name: name.into(),
        }
    }

    pub fn places(&self, storage: &dyn Storage) -> Result<Vec<Place>, StorageError> {
        Ok(storage::all::<Place>(storage)?
            .into_iter()
            .filter(|place| place.city_id == self.base.id)
            .collect())
    }
}

impl Entity for City {
    const KIND: ModelKind = ModelKind::City;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }


    fn read_fields(base: BaseModel, fields: &mut FieldReader) -> Result<Self, DecodeError> {
        Ok(City {
            base,
            state_id: fields.string("state_id")?,
            name: fields.string("name")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_city_fields_serialize() {
        let city = City::new("state-1", "San Francisco");
        let dict = city.to_dict();

        assert_eq!(dict["state_id"], json!("state-1"));
        assert_eq!(dict["name"], json!("San Francisco"));
        assert_eq!(dict["__class__"], json!("City"));
    }

    #[test]
    fn test_city_reconstruction_names_bad_field() {
        let mut dict = City::new("state-1", "Oakland").to_dict();
        dict.insert("state_id".to_string(), json!(42));

        let err = City::from_dict(dict).unwrap_err();
        assert!(err.to_string().contains("state_id"));
    }
}
