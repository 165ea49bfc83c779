//! Dataset and identity persistence over a [`KvStore`].
//!
//! # Responsibility
//! - Encode/decode the dataset record (`eb_data` by default) as compact JSON.
//! - Encode/decode the current-user record (`eb_currentUser` by default).
//! - Seed and immediately persist the demo dataset when no record exists.
//!
//! # Invariants
//! - Decoding tolerates legacy records: missing `invitations`, id lists or
//!   collections load as empty; unknown fields are ignored.
//! - Malformed records are reported, never silently replaced by the seed.

use crate::kv::{KvError, KvStore};
use crate::model::dataset::Dataset;
use crate::model::user::CurrentUser;
use crate::repo::seed::demo_dataset;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_DATA_KEY: &str = "eb_data";
pub const DEFAULT_USER_KEY: &str = "eb_currentUser";

pub type PersistResult<T> = Result<T, PersistError>;

/// Persistence adapter failure.
#[derive(Debug)]
pub enum PersistError {
    /// Backend read/write failure.
    Kv(KvError),
    /// Stored record cannot be decoded (or the dataset cannot be encoded).
    InvalidData(String),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kv(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Kv(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<KvError> for PersistError {
    fn from(value: KvError) -> Self {
        Self::Kv(value)
    }
}

/// Keys used for the two persisted records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_key: String,
    pub user_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_key: DEFAULT_DATA_KEY.to_string(),
            user_key: DEFAULT_USER_KEY.to_string(),
        }
    }
}

/// Result of [`DatasetRepository::load_or_seed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    /// `true` when the demo dataset was generated and persisted.
    pub seeded: bool,
}

/// Reads and writes the dataset and identity records.
pub struct DatasetRepository<K: KvStore> {
    kv: K,
    config: StoreConfig,
}

impl<K: KvStore> DatasetRepository<K> {
    /// Creates a repository using the default keys.
    pub fn new(kv: K) -> Self {
        Self::with_config(kv, StoreConfig::default())
    }

    pub fn with_config(kv: K, config: StoreConfig) -> Self {
        Self { kv, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn kv_mut(&mut self) -> &mut K {
        &mut self.kv
    }

    pub fn into_inner(self) -> K {
        self.kv
    }

    /// Reads the stored dataset, if any.
    pub fn load(&self) -> PersistResult<Option<Dataset>> {
        let Some(raw) = self.kv.get(&self.config.data_key)? else {
            return Ok(None);
        };
        match decode_dataset(&raw) {
            Ok(dataset) => {
                info!(
                    "event=dataset_load module=repo status=ok source=stored tags={} participants={} events={}",
                    dataset.tags.len(),
                    dataset.participants.len(),
                    dataset.events.len()
                );
                Ok(Some(dataset))
            }
            Err(err) => {
                error!(
                    "event=dataset_load module=repo status=error error_code=decode_failed error={}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Reads the stored dataset or seeds and persists the demo dataset.
    ///
    /// `organizer` and `sent_at` are only used when seeding.
    pub fn load_or_seed(
        &mut self,
        organizer: Option<&CurrentUser>,
        sent_at: &str,
    ) -> PersistResult<LoadedDataset> {
        if let Some(dataset) = self.load()? {
            return Ok(LoadedDataset {
                dataset,
                seeded: false,
            });
        }

        let dataset = demo_dataset(organizer, sent_at);
        self.save(&dataset)?;
        info!(
            "event=dataset_load module=repo status=ok source=seed events={}",
            dataset.events.len()
        );
        Ok(LoadedDataset {
            dataset,
            seeded: true,
        })
    }

    /// Overwrites the stored dataset record.
    pub fn save(&mut self, dataset: &Dataset) -> PersistResult<()> {
        let encoded = encode_dataset(dataset)?;
        if let Err(err) = self.kv.set(&self.config.data_key, &encoded) {
            error!(
                "event=dataset_save module=repo status=error error_code=kv_set_failed error={}",
                err
            );
            return Err(err.into());
        }
        Ok(())
    }

    pub fn load_user(&self) -> PersistResult<Option<CurrentUser>> {
        let Some(raw) = self.kv.get(&self.config.user_key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| PersistError::InvalidData(format!("current user record: {err}")))
    }

    pub fn save_user(&mut self, user: &CurrentUser) -> PersistResult<()> {
        let encoded = serde_json::to_string(user)
            .map_err(|err| PersistError::InvalidData(format!("current user record: {err}")))?;
        self.kv.set(&self.config.user_key, &encoded)?;
        Ok(())
    }

    /// Removes the current-user record (logout).
    pub fn clear_user(&mut self) -> PersistResult<()> {
        self.kv.remove(&self.config.user_key)?;
        Ok(())
    }
}

/// Encodes a dataset as compact JSON.
pub fn encode_dataset(dataset: &Dataset) -> PersistResult<String> {
    serde_json::to_string(dataset)
        .map_err(|err| PersistError::InvalidData(format!("dataset encode: {err}")))
}

/// Decodes a dataset record, applying legacy defaults.
pub fn decode_dataset(raw: &str) -> PersistResult<Dataset> {
    serde_json::from_str(raw).map_err(|err| PersistError::InvalidData(format!("dataset: {err}")))
}
