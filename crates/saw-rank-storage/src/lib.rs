use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Criteria and their AHP weights, index-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AhpWeights {
    pub criteria: Vec<String>,
    pub weights: Vec<f64>,
}

impl AhpWeights {
    pub fn new(criteria: Vec<String>, weights: Vec<f64>) -> Result<Self, StorageError> {
        if criteria.is_empty() {
            return Err(StorageError::InvalidInput(
                "criteria cannot be empty".to_string(),
            ));
        }
        if criteria.len() != weights.len() {
            return Err(StorageError::InvalidInput(format!(
                "criteria has {} entries but weights has {}",
                criteria.len(),
                weights.len()
            )));
        }
        if criteria.iter().any(|c| c.trim().is_empty()) {
            return Err(StorageError::InvalidInput(
                "criterion names cannot be empty".to_string(),
            ));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(StorageError::InvalidInput(
                "weights must be finite and non-negative".to_string(),
            ));
        }
        Ok(Self { criteria, weights })
    }
}

pub trait WeightsBackend: Send {
    /// `None` when either half of the pair has never been stored.
    fn load(&self) -> Option<AhpWeights>;
    fn save(&mut self, weights: AhpWeights) -> Result<(), StorageError>;
    fn clear(&mut self) -> Result<(), StorageError>;
    fn stats(&self) -> serde_json::Value;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

// Two independent arrays, matching how the weighting step hands them over.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    #[serde(default)]
    ahp_criteria: Option<Vec<String>>,
    #[serde(default)]
    ahp_weights: Option<Vec<f64>>,
    #[serde(default)]
    updated_ms: u64,
}

pub struct PersistentWeightStore {
    path: PathBuf,
    persisted: Persisted,
}

impl PersistentWeightStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !path.exists() {
            let bytes = serde_json::to_vec_pretty(&Persisted::default())?;
            fs::write(&path, bytes)?;
        }

        let bytes = fs::read(&path)?;
        let persisted: Persisted = serde_json::from_slice(&bytes)?;
        debug!(
            path = %path.display(),
            has_criteria = persisted.ahp_criteria.is_some(),
            has_weights = persisted.ahp_weights.is_some(),
            "weight store opened"
        );
        Ok(Self { path, persisted })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<AhpWeights> {
        let criteria = self.persisted.ahp_criteria.clone()?;
        let weights = self.persisted.ahp_weights.clone()?;
        AhpWeights::new(criteria, weights).ok()
    }

    pub fn save(&mut self, weights: AhpWeights) -> Result<(), StorageError> {
        let checked = AhpWeights::new(weights.criteria, weights.weights)?;
        self.persisted = Persisted {
            ahp_criteria: Some(checked.criteria),
            ahp_weights: Some(checked.weights),
            updated_ms: now_ms(),
        };
        self.persist()
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.persisted = Persisted::default();
        self.persist()
    }

    pub fn stats(&self) -> serde_json::Value {
        serde_json::json!({
            "path": self.path,
            "criteria": self.persisted.ahp_criteria.as_ref().map_or(0, Vec::len),
            "has_weights": self.persisted.ahp_weights.is_some(),
            "updated_ms": self.persisted.updated_ms,
        })
    }

    fn persist(&self) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(&self.persisted)?;
        fs::write(&self.path, bytes)?;
        Ok(())
    }
}

impl WeightsBackend for PersistentWeightStore {
    fn load(&self) -> Option<AhpWeights> {
        Self::load(self)
    }

    fn save(&mut self, weights: AhpWeights) -> Result<(), StorageError> {
        Self::save(self, weights)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        Self::clear(self)
    }

    fn stats(&self) -> serde_json::Value {
        Self::stats(self)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
