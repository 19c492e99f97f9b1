// 🗺️ State Entity
//
// Parent of cities. The database cascades a state's deletion to its cities;
// the file store does not.

use crate::error::{DecodeError, StorageError};
use crate::storage::{self, Storage};

use super::{BaseModel, City, Entity, FieldReader, ModelKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct State {
    #[serde(flatten)]
    pub base: BaseModel,
    pub name: String,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        State {
            base: BaseModel::new(),
            name: name.into(),
        }
    }

    /// Cities whose `state_id` points at this state
    pub fn cities(&self, storage: &dyn Storage) -> Result<Vec<City>, StorageError> {
        Ok(storage::all::<City>(storage)?
            .into_iter()
            .filter(|city| city.state_id == self.base.id)
            .collect())
    }
}

impl Entity for State {
    const KIND: ModelKind = ModelKind::State;

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }


    fn read_fields(base: BaseModel, fields: &mut FieldReader) -> Result<Self, DecodeError> {
        Ok(State {
            base,
            name: fields.string("name")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStorage;

    #[test]
    fn test_state_creation() {
        let state = State::new("California");

        assert!(!state.base.id.is_empty());
        assert_eq!(state.name, "California");
        assert_eq!(state.key(), format!("State.{}", state.base.id));
    }

    #[test]
    fn test_cities_follow_state_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("file.json"));

        let mut california = State::new("California");
        let mut nevada = State::new("Nevada");
        california.save(&mut storage).unwrap();
        nevada.save(&mut storage).unwrap();

        City::new(&california.base.id, "San Francisco").save(&mut storage).unwrap();
        City::new(&california.base.id, "San Jose").save(&mut storage).unwrap();
        City::new(&nevada.base.id, "Reno").save(&mut storage).unwrap();

        let mut names: Vec<String> = california
            .cities(&storage)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        names.sort();

        assert_eq!(names, vec!["San Francisco", "San Jose"]);
        assert_eq!(nevada.cities(&storage).unwrap().len(), 1);
    }
}
