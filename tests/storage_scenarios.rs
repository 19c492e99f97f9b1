// End-to-end storage scenarios run against both backends through `storage::open`

use hbnb::{
    storage, Amenity, City, Config, DbConfig, Entity, Model, ModelKind, Place, Review, State,
    Storage, StorageBackend, User,
};
use std::path::Path;

fn file_config(dir: &Path) -> Config {
    Config {
        file_path: dir.join("file.json"),
        ..Config::default()
    }
}

fn db_config(dir: &Path) -> Config {
    Config {
        backend: StorageBackend::Db(DbConfig {
            database: dir.join("hbnb_test.db").display().to_string(),
            ..DbConfig::default()
        }),
        ..Config::default()
    }
}

fn both_backends() -> Vec<(&'static str, tempfile::TempDir, Config)> {
    let file_dir = tempfile::tempdir().unwrap();
    let db_dir = tempfile::tempdir().unwrap();
    let file = file_config(file_dir.path());
    let db = db_config(db_dir.path());
    vec![("file", file_dir, file), ("db", db_dir, db)]
}

#[test]
fn test_state_with_city_survives_a_fresh_engine() {
    for (name, _dir, config) in both_backends() {
        let mut store = storage::open(&config).unwrap();

        let mut california = State::new("California");
        california.save(store.as_mut()).unwrap();
        let mut san_francisco = City::new(&california.base.id, "San Francisco");
        san_francisco.save(store.as_mut()).unwrap();
        store.close().unwrap();

        let fresh = storage::open(&config).unwrap();
        let state = fresh
            .get(ModelKind::State, &california.base.id)
            .unwrap()
            .unwrap_or_else(|| panic!("{name}: state missing"));
        assert_eq!(state, Model::State(california.clone()), "{name}");

        let cities = california.cities(fresh.as_ref()).unwrap();
        assert_eq!(cities, vec![san_francisco], "{name}");
    }
}

#[test]
fn test_query_returns_only_the_requested_type() {
    for (name, _dir, config) in both_backends() {
        let mut store = storage::open(&config).unwrap();

        let mut user = User::new("guest@hbnb.io", "pwd");
        user.save(store.as_mut()).unwrap();
        let mut state = State::new("Nevada");
        state.save(store.as_mut()).unwrap();
        let mut city = City::new(&state.base.id, "Reno");
        city.save(store.as_mut()).unwrap();
        let mut wifi = Amenity::new("Wifi");
        wifi.save(store.as_mut()).unwrap();
        let mut place = Place::new(&city.base.id, &user.base.id, "Cabin");
        place.add_amenity(&wifi);
        place.save(store.as_mut()).unwrap();
        Review::new(&place.base.id, &user.base.id, "Cozy")
            .save(store.as_mut())
            .unwrap();

        assert_eq!(store.count(None).unwrap(), 6, "{name}");
        for kind in ModelKind::ALL {
            let objects = store.query(Some(kind)).unwrap();
            assert_eq!(objects.len(), 1, "{name}: {kind}");
            assert!(objects.values().all(|model| model.kind() == kind), "{name}");
        }

        let amenities = place.amenities(store.as_ref()).unwrap();
        assert_eq!(amenities, vec![wifi], "{name}");
        assert_eq!(storage::all::<Review>(store.as_ref()).unwrap()[0].text, "Cozy");
    }
}

#[test]
fn test_deleting_a_state_cascades_only_in_the_database() {
    for (name, _dir, config) in both_backends() {
        let mut store = storage::open(&config).unwrap();

        let mut state = State::new("Oregon");
        state.save(store.as_mut()).unwrap();
        City::new(&state.base.id, "Portland")
            .save(store.as_mut())
            .unwrap();

        state.delete(store.as_mut()).unwrap();

        let remaining = store.count(Some(ModelKind::City)).unwrap();
        match name {
            "db" => assert_eq!(remaining, 0),
            _ => assert_eq!(remaining, 1, "file storage keeps the orphaned city"),
        }
    }
}

#[test]
fn test_unsaved_changes_are_dropped_by_close_only_in_the_database() {
    for (name, _dir, config) in both_backends() {
        let mut store = storage::open(&config).unwrap();
        store.register(State::new("Draft").into()).unwrap();
        store.close().unwrap();

        let visible = store.count(Some(ModelKind::State)).unwrap();
        match name {
            "db" => assert_eq!(visible, 0),
            _ => assert_eq!(visible, 1),
        }

        let fresh = storage::open(&config).unwrap();
        assert_eq!(fresh.count(None).unwrap(), 0, "{name}");
    }
}
