// 👤 User Entity - owns Places and writes Reviews

use crate::error::{DecodeError, StorageError};
use crate::storage::{self, Storage};

use super::{BaseModel, Entity, FieldReader, ModelKind, Place, Review};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct User {
    #[serde(flatten)]
    pub base: BaseModel,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl User {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        User {
            base: BaseModel::new(),
            email: email.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn places(&self, storage: &dyn Storage) -> Result<Vec<Place>, StorageError> {
        Ok(storage::all::<Place>(storage)?
            .into_iter()
            .filter(|place| place.user_id == self.base.id)
            .collect())
    }

    pub fn reviews(&self, storage: &dyn Storage) -> Result<Vec<Review>, StorageError> {
        Ok(storage::all::<Review>(storage)?
            .into_iter()
            .filter(|review| review.user_id == self.base.id)
            .collect())
    }
}

impl Entity for User {
    const KIND: ModelKind = ModelKind::User;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }


    fn read_fields(base: BaseModel, fields: &mut FieldReader) -> Result<Self, DecodeError> {
        Ok(User {
            base,
            email: fields.string("email")?,
            password: fields.string("password")?,
            first_name: fields.string("first_name")?,
            last_name: fields.string("last_name")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_defaults() {
        let mut user = User::new("betty@holberton.io", "pwd");
        assert_eq!(user.full_name(), "");

        user.first_name = "Betty".to_string();
        assert_eq!(user.full_name(), "Betty");

        user.last_name = "Holberton".to_string();
        assert_eq!(user.full_name(), "Betty Holberton");
    }

    #[test]
    fn test_user_absent_fields_default_to_empty() {
        let user = User::new("a@b.c", "x");
        let mut dict = user.to_dict();
        dict.remove("first_name");
        dict.remove("last_name");

        let restored = User::from_dict(dict).unwrap();
        assert_eq!(restored, user);
    }
}
