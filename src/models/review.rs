// ✍️ Review Entity - written by a User about a Place

use crate::error::DecodeError;

use super::{BaseModel, Entity, FieldReader, ModelKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Review {
    #[serde(flatten)]
    pub base: BaseModel,
    /// Foreign key to Place
    pub place_id: String,
    /// Foreign key to User
    pub user_id: String,
    pub text: String,
}

impl Review {
    pub fn new(
        place_id: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Review {
            base: BaseModel::new(),
            place_id: place_id.into(),
            user_id: user_id.into(),
            text: text.into(),
        }
    }
}

impl Entity for Review {
    const KIND: ModelKind = ModelKind::Review;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }


    fn read_fields(base: BaseModel, fields: &mut FieldReader) -> Result<Self, DecodeError> {
        Ok(Review {
            base,
            place_id: fields.string("place_id")?,
            user_id: fields.string("user_id")?,
            text: fields.string("text")?,
        })
    }
}
