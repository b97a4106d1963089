// Test doubles for the domain layer, available in tests and with the "mock" feature

// Re-export the storage doubles from the data layer
pub use gluco_screen_data::repository::tests::{sample_record, MockProfileStore, MockRecordStore};

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::classifier::{ClassifierError, ModelInfo, RiskClassifier};
use crate::entities::FeatureVector;
use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth, SystemStatus};

/// Classifier returning the same positive-class probability for every input
#[derive(Debug)]
pub struct FixedClassifier {
    p1: f64,
    calls: AtomicUsize,
}

impl FixedClassifier {
    pub fn with_probability(p1: f64) -> Self {
        Self {
            p1: p1.clamp(0.0, 1.0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always label 1, p1 = 0.9
    pub fn positive() -> Self {
        Self::with_probability(0.9)
    }

    /// Always label 0, p1 = 0.1
    pub fn negative() -> Self {
        Self::with_probability(0.1)
    }

    /// Number of `predict_proba` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RiskClassifier for FixedClassifier {
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if features.as_slice().iter().any(|v| !v.is_finite()) {
            return Err(ClassifierError::InvalidInput("non-finite feature".to_string()));
        }
        Ok([1.0 - self.p1, self.p1])
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: "fixed".to_string(),
            version: format!("p1={}", self.p1),
            tree_count: 0,
        }
    }
}

/// Health service with configurable component states
#[derive(Debug)]
pub struct MockHealthService {
    database_status: ComponentStatus,
    components: HashMap<String, HealthComponent>,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// All components healthy
    pub fn new() -> Self {
        Self {
            database_status: ComponentStatus::Healthy,
            components: HashMap::new(),
        }
    }

    pub fn with_degraded_database(mut self) -> Self {
        self.database_status = ComponentStatus::Degraded;
        self
    }

    pub fn with_unhealthy_database(mut self) -> Self {
        self.database_status = ComponentStatus::Unhealthy;
        self
    }

    /// Add a custom component with a specific status
    pub fn with_component(mut self, name: &str, status: ComponentStatus, details: Option<String>) -> Self {
        self.components.insert(name.to_string(), HealthComponent { status, details });
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let mut components = HashMap::new();
        components.insert(
            "database".to_string(),
            HealthComponent {
                status: self.database_status.clone(),
                details: match self.database_status {
                    ComponentStatus::Healthy => None,
                    ComponentStatus::Degraded => Some("Results are kept in memory".to_string()),
                    ComponentStatus::Unhealthy => Some("Database connection failed".to_string()),
                },
            },
        );
        components.insert(
            "classifier".to_string(),
            HealthComponent {
                status: ComponentStatus::Healthy,
                details: Some("fixed".to_string()),
            },
        );
        for (name, component) in &self.components {
            components.insert(name.clone(), component.clone());
        }

        SystemHealth::from_components(components, 0)
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.database_status {
            ComponentStatus::Healthy => Ok(true),
            ComponentStatus::Degraded => Ok(false),
            ComponentStatus::Unhealthy => Err("Database connection failed".to_string()),
        }
    }
}

/// Factory function to create a mock health service
pub fn create_mock_health_service() -> impl HealthServiceTrait {
    MockHealthService::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_classifier_counts_calls() {
        let classifier = FixedClassifier::positive();
        let features = FeatureVector([0.0; 8]);
        assert_eq!(classifier.predict(&features).unwrap(), 1);
        assert_eq!(classifier.calls(), 1);
        assert_eq!(FixedClassifier::negative().predict(&features).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mock_health_reflects_database() {
        let health = MockHealthService::new().with_unhealthy_database().get_system_health().await;
        assert_eq!(health.status, SystemStatus::Unhealthy);

        let health = MockHealthService::new().get_system_health().await;
        assert_eq!(health.status, SystemStatus::Healthy);
    }

    #[test]
    fn test_mock_database_status() {
        let degraded = MockHealthService::new().with_degraded_database();
        assert_eq!(tokio_test::block_on(degraded.check_database_status()), Ok(false));

        let down = MockHealthService::new().with_unhealthy_database();
        assert!(tokio_test::block_on(down.check_database_status()).is_err());
    }
}
