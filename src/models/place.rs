// 🏠 Place Entity - a rental listing
//
// Belongs to a City and a User, collects Reviews, and links to Amenities
// through `amenity_ids` (the `place_amenity` join table in the database).

use crate::error::{DecodeError, StorageError};
use crate::storage::{self, Storage};

use super::{Amenity, BaseModel, Entity, FieldReader, ModelKind, Review};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Place {
    #[serde(flatten)]
    pub base: BaseModel,
    /// Foreign key to City
    pub city_id: String,
    /// Foreign key to User (the host)
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub number_rooms: i64,
    pub number_bathrooms: i64,
    pub max_guest: i64,
    pub price_by_night: i64,
    pub latitude: f64,
    pub longitude: f64,
    /// Linked amenities, in insertion order, without duplicates
    pub amenity_ids: Vec<String>,
}

impl Place {
    pub fn new(
        city_id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Place {
            base: BaseModel::new(),
            city_id: city_id.into(),
            user_id: user_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Link an amenity; linking the same amenity twice is a no-op
    pub fn add_amenity(&mut self, amenity: &Amenity) {
        if !self.amenity_ids.contains(&amenity.base.id) {
            self.amenity_ids.push(amenity.base.id.clone());
        }
    }

    pub fn reviews(&self, storage: &dyn Storage) -> Result<Vec<Review>, StorageError> {
        Ok(storage::all::<Review>(storage)?
            .into_iter()
            .filter(|review| review.place_id == self.base.id)
            .collect())
    }

    /// Linked amenities that the store still knows about
    pub fn amenities(&self, storage: &dyn Storage) -> Result<Vec<Amenity>, StorageError> {
        Ok(storage::all::<Amenity>(storage)?
            .into_iter()
            .filter(|amenity| self.amenity_ids.contains(&amenity.base.id))
            .collect())
    }
}

impl Entity for Place {
    const KIND: ModelKind = ModelKind::Place;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }


    fn read_fields(base: BaseModel, fields: &mut FieldReader) -> Result<Self, DecodeError> {
        Ok(Place {
            base,
            city_id: fields.string("city_id")?,
            user_id: fields.string("user_id")?,
            name: fields.string("name")?,
            description: fields.string("description")?,
            number_rooms: fields.int("number_rooms")?,
            number_bathrooms: fields.int("number_bathrooms")?,
            max_guest: fields.int("max_guest")?,
            price_by_night: fields.int("price_by_night")?,
            latitude: fields.float("latitude")?,
            longitude: fields.float("longitude")?,
            amenity_ids: fields.string_list("amenity_ids")?,
        })
    }
}
