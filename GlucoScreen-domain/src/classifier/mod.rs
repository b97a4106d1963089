//! Risk classifier contract
//!
//! The classifier is an externally trained binary model. It is loaded once at
//! startup and shared immutably behind `Arc<dyn RiskClassifier>`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::entities::FeatureVector;

pub mod forest;

pub use forest::ForestClassifier;

/// Classifier errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    /// The artifact could not be read
    #[error("Cannot read model artifact: {0}")]
    Io(String),

    /// The artifact is not well-formed JSON for the expected format
    #[error("Cannot parse model artifact: {0}")]
    Parse(String),

    /// The artifact parsed but is inconsistent
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// The feature vector cannot be scored
    #[error("Invalid features: {0}")]
    InvalidInput(String),
}

/// Identity of the loaded model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    pub tree_count: usize,
}

/// Calling contract of the binary risk classifier
pub trait RiskClassifier: Send + Sync {
    /// Class probabilities `[p0, p1]`, summing to 1
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], ClassifierError>;

    /// Class label, 1 when the positive class is more likely
    fn predict(&self, features: &FeatureVector) -> Result<u8, ClassifierError> {
        let [p0, p1] = self.predict_proba(features)?;
        Ok(if p1 > p0 { 1 } else { 0 })
    }

    fn model_info(&self) -> ModelInfo;
}
