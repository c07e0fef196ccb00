//! Best-score persistence
//!
//! Only a single scalar is stored, wrapped in a versioned JSON envelope:
//! `{"version":1,"best_score":1234}`.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Envelope version written by this build
pub const SAVE_VERSION: u32 = 1;

/// LocalStorage key
#[allow(dead_code)]
const STORAGE_KEY: &str = "ingredient_rush_best_score";

/// Where the best score lives
pub trait HighScoreStore {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&mut self) -> Result<Option<u64>, StoreError>;

    fn save(&mut self, score: u64) -> Result<(), StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    best_score: u64,
}

/// Serialize a score into the current envelope
pub fn encode(score: u64) -> Result<String, StoreError> {
    Ok(serde_json::to_string(&Envelope {
        version: SAVE_VERSION,
        best_score: score,
    })?)
}

/// Parse an envelope, rejecting versions from the future
pub fn decode(json: &str) -> Result<u64, StoreError> {
    let envelope: Envelope = serde_json::from_str(json)?;
    if envelope.version == 0 || envelope.version > SAVE_VERSION {
        return Err(StoreError::UnsupportedVersion(envelope.version));
    }
    Ok(envelope.best_score)
}

/// In-memory store for native runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<String>,
    /// Successful saves
    pub writes: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a best score
    pub fn with_score(score: u64) -> Self {
        Self {
            saved: encode(score).ok(),
            writes: 0,
        }
    }

    /// Store holding raw (possibly corrupt) data
    pub fn with_raw(json: impl Into<String>) -> Self {
        Self {
            saved: Some(json.into()),
            writes: 0,
        }
    }
}

impl HighScoreStore for MemoryStore {
    fn load(&mut self) -> Result<Option<u64>, StoreError> {
        self.saved.as_deref().map(decode).transpose()
    }

    fn save(&mut self, score: u64) -> Result<(), StoreError> {
        self.saved = Some(encode(score)?);
        self.writes += 1;
        Ok(())
    }
}

/// Browser LocalStorage store
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".into()))?
            .local_storage()
            .map_err(|_| StoreError::Unavailable("localStorage access denied".into()))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl HighScoreStore for LocalStorageStore {
    fn load(&mut self) -> Result<Option<u64>, StoreError> {
        let storage = Self::storage()?;
        let raw = storage
            .get_item(STORAGE_KEY)
            .map_err(|_| StoreError::Unavailable("localStorage read failed".into()))?;
        match raw {
            Some(json) => {
                let score = decode(&json)?;
                log::info!("Loaded best score {score}");
                Ok(Some(score))
            }
            None => Ok(None),
        }
    }

    fn save(&mut self, score: u64) -> Result<(), StoreError> {
        let json = encode(score)?;
        Self::storage()?
            .set_item(STORAGE_KEY, &json)
            .map_err(|_| StoreError::Unavailable("localStorage write failed".into()))?;
        log::info!("Best score saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_format() {
        assert_eq!(encode(42).unwrap(), r#"{"version":1,"best_score":42}"#);
        assert_eq!(decode(r#"{"version":1,"best_score":42}"#).unwrap(), 42);
    }

    #[test]
    fn test_future_version_rejected() {
        let err = decode(r#"{"version":9,"best_score":42}"#).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion(9)));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save(300).unwrap();
        assert_eq!(store.load().unwrap(), Some(300));
        assert_eq!(store.writes, 1);
        assert_eq!(MemoryStore::with_score(7).load().unwrap(), Some(7));
    }

    #[test]
    fn test_corrupt_data_is_an_error() {
        let mut store = MemoryStore::with_raw("{oops");
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    }
}
