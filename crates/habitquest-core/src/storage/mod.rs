mod config;
pub mod database;
pub mod memory;

pub use config::{Config, NotificationsConfig, RewardsConfig, TimerConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Key of the [`PlayerState`](crate::progression::PlayerState) snapshot.
pub const USER_KEY: &str = "user";
/// Key of the [`StudyRecords`](crate::records::StudyRecords) map.
pub const STUDY_RECORDS_KEY: &str = "studyRecords";
/// Key of the persisted timer.
pub const TIMER_KEY: &str = "timer";

/// Key/value persistence used for committed snapshots.
///
/// Values are JSON strings. Implementations only move strings around; the
/// typed helpers handle (de)serialization.
pub trait Storage {
    fn load_raw(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn save_raw(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.load_raw(key)? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|source| StorageError::Serialization {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_string(value).map_err(|source| StorageError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.save_raw(key, &json)
    }
}

impl<S: Storage> Storage for &S {
    fn load_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).load_raw(key)
    }

    fn save_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).save_raw(key, value)
    }
}

/// Returns the data directory, creating it if needed.
///
/// `HABITQUEST_HOME` overrides the location. Otherwise this is
/// `~/.config/habitquest[-dev]/`, with `HABITQUEST_ENV=dev` selecting the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("HABITQUEST_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("HABITQUEST_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("habitquest-dev")
            } else {
                base_dir.join("habitquest")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::PlayerState;

    #[test]
    fn typed_round_trip_through_raw_store() {
        let store = MemoryStore::new();
        let player = PlayerState {
            level: 5,
            ..PlayerState::default()
        };
        store.save(USER_KEY, &player).unwrap();
        let loaded: PlayerState = store.load(USER_KEY).unwrap().unwrap();
        assert_eq!(loaded, player);
    }

    #[test]
    fn corrupt_value_reports_serialization_error() {
        let store = MemoryStore::new();
        store.save_raw(USER_KEY, "{not json").unwrap();
        let err = store.load::<PlayerState>(USER_KEY).unwrap_err();
        assert!(matches!(err, StorageError::Serialization { ref key, .. } if key == USER_KEY));
    }

    #[test]
    fn missing_key_loads_none() {
        let store = MemoryStore::new();
        assert!(store.load::<PlayerState>("nope").unwrap().is_none());
    }
}
