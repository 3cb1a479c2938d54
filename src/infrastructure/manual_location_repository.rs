use crate::domain::models::Coordinates;
use crate::infrastructure::error::PersistenceError;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct ManualLocationRecord {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl ManualLocationRecord {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    fn is_usable(&self) -> bool {
        !self.name.trim().is_empty() && self.coordinates().validate().is_ok()
    }
}

// A malformed row invalidates the whole record: load yields None and the
// resolver falls back to automatic resolution.
pub trait ManualLocationRepository: Send + Sync {
    fn load(&self) -> Result<Option<ManualLocationRecord>, PersistenceError>;
    fn save(&self, record: &ManualLocationRecord) -> Result<(), PersistenceError>;
    fn clear(&self) -> Result<(), PersistenceError>;
}

#[derive(Debug, Clone)]
pub struct SqliteManualLocationRepository {
    db_path: PathBuf,
}

impl SqliteManualLocationRepository {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, PersistenceError> {
        Connection::open(&self.db_path).map_err(PersistenceError::from)
    }
}

impl ManualLocationRepository for SqliteManualLocationRepository {
    fn load(&self) -> Result<Option<ManualLocationRecord>, PersistenceError> {
        let connection = self.connect()?;
        let row: Option<(Option<String>, Option<f64>, Option<f64>)> = connection
            .query_row(
                "SELECT name, latitude, longitude FROM manual_location WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((name, latitude, longitude)) = row else {
            return Ok(None);
        };
        let (Some(name), Some(latitude), Some(longitude)) = (name, latitude, longitude) else {
            return Ok(None);
        };

        let record = ManualLocationRecord {
            name,
            latitude,
            longitude,
        };
        if !record.is_usable() {
            return Ok(None);
        }
        Ok(Some(record))
    }

    fn save(&self, record: &ManualLocationRecord) -> Result<(), PersistenceError> {
        if !record.is_usable() {
            return Err(PersistenceError::InvalidRecord(
                "manual location requires a name and in-range coordinates".to_string(),
            ));
        }

        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO manual_location (id, name, latitude, longitude)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
               name = excluded.name,
               latitude = excluded.latitude,
               longitude = excluded.longitude",
            params![record.name, record.latitude, record.longitude],
        )?;
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        let connection = self.connect()?;
        connection.execute("DELETE FROM manual_location WHERE id = 1", [])?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryManualLocationRepository {
    record: Mutex<Option<ManualLocationRecord>>,
}

impl ManualLocationRepository for InMemoryManualLocationRepository {
    fn load(&self) -> Result<Option<ManualLocationRecord>, PersistenceError> {
        let record = self
            .record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(record.clone().filter(ManualLocationRecord::is_usable))
    }

    fn save(&self, record: &ManualLocationRecord) -> Result<(), PersistenceError> {
        if !record.is_usable() {
            return Err(PersistenceError::InvalidRecord(
                "manual location requires a name and in-range coordinates".to_string(),
            ));
        }
        let mut stored = self
            .record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *stored = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        let mut stored = self
            .record
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *stored = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::initialize_database;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_ID: AtomicUsize = AtomicUsize::new(0);

    fn temp_database() -> PathBuf {
        let id = NEXT_TEMP_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "minaret-repo-test-{}-{id}.sqlite",
            std::process::id()
        ))
    }

    fn sample_record() -> ManualLocationRecord {
        ManualLocationRecord {
            name: "Makkah".to_string(),
            latitude: 21.4225,
            longitude: 39.8262,
        }
    }

    #[test]
    fn sqlite_round_trips_the_single_record() {
        let path = temp_database();
        initialize_database(&path).expect("initialize schema");
        let repository = SqliteManualLocationRepository::new(&path);

        assert_eq!(repository.load().expect("load empty"), None);
        repository.save(&sample_record()).expect("save record");
        assert_eq!(
            repository.load().expect("load saved"),
            Some(sample_record())
        );

        let renamed = ManualLocationRecord {
            name: "Mecca".to_string(),
            ..sample_record()
        };
        repository.save(&renamed).expect("overwrite record");
        assert_eq!(repository.load().expect("load renamed"), Some(renamed));

        repository.clear().expect("clear record");
        assert_eq!(repository.load().expect("load cleared"), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn sqlite_load_rejects_out_of_range_row() {
        let path = temp_database();
        initialize_database(&path).expect("initialize schema");
        let connection = Connection::open(&path).expect("open database");
        connection
            .execute(
                "INSERT INTO manual_location (id, name, latitude, longitude)
                 VALUES (1, 'Broken', 123.0, 39.0)",
                [],
            )
            .expect("insert malformed row");

        let repository = SqliteManualLocationRepository::new(&path);
        assert_eq!(repository.load().expect("load"), None);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn save_rejects_blank_name() {
        let repository = InMemoryManualLocationRepository::default();
        let record = ManualLocationRecord {
            name: "   ".to_string(),
            latitude: 0.0,
            longitude: 0.0,
        };
        assert!(repository.save(&record).is_err());
        assert_eq!(repository.load().expect("load"), None);
    }
}
