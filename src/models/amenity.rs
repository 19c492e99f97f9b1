// 🛁 Amenity Entity - linked to Places many-to-many

use crate::error::DecodeError;

use super::{BaseModel, Entity, FieldReader, ModelKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub base: BaseModel,
    pub name: String,
}

impl Amenity {
    pub fn new(name: impl Into<String>) -> Self {
        Amenity {
            base: BaseModel::new(),
            name: name.into(),
        }
    }
}

impl Entity for Amenity {
    const KIND: ModelKind = ModelKind::Amenity;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }


    fn read_fields(base: BaseModel, fields: &mut FieldReader) -> Result<Self, DecodeError> {
        Ok(Amenity {
            base,
            name: fields.string("name")?,
        })
    }
}
