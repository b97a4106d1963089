//! Health checks for the storage backend and the loaded classifier

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use gluco_screen_data::database::{self, DatabasePool};

use crate::classifier::RiskClassifier;

/// System health status
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// One component with its status and optional details
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthComponent {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Overall health of the system
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SystemHealth {
    pub status: SystemStatus,
    pub version: String,
    pub uptime_seconds: u64,
    /// Component name to its health
    pub components: HashMap<String, HealthComponent>,
}

impl SystemHealth {
    /// Worst component status decides the system status
    pub fn from_components(components: HashMap<String, HealthComponent>, uptime_seconds: u64) -> Self {
        let status = if components.values().any(|c| c.status == ComponentStatus::Unhealthy) {
            SystemStatus::Unhealthy
        } else if components.values().any(|c| c.status == ComponentStatus::Degraded) {
            SystemStatus::Degraded
        } else {
            SystemStatus::Healthy
        };

        Self {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds,
            components,
        }
    }
}

#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;

    /// Ok(true) when the database answers, Ok(false) when results only live
    /// in process memory, Err when the database cannot be reached
    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Health of the database pool and the classifier
pub struct HealthService {
    classifier: Arc<dyn RiskClassifier>,
    pool: Option<DatabasePool>,
    started_at: Instant,
}

impl std::fmt::Debug for HealthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthService")
            .field("model", &self.classifier.model_info().name)
            .field("persistent", &self.pool.is_some())
            .finish()
    }
}

impl HealthService {
    pub fn new(classifier: Arc<dyn RiskClassifier>, pool: Option<DatabasePool>) -> Self {
        Self {
            classifier,
            pool,
            started_at: Instant::now(),
        }
    }

    fn classifier_component(&self) -> HealthComponent {
        let info = self.classifier.model_info();
        HealthComponent {
            status: ComponentStatus::Healthy,
            details: Some(format!("{} v{} ({} trees)", info.name, info.version, info.tree_count)),
        }
    }
}

#[async_trait]
impl HealthServiceTrait for HealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let database = match self.check_database_status().await {
            Ok(true) => HealthComponent {
                status: ComponentStatus::Healthy,
                details: self.pool.as_ref().map(database::describe_pool),
            },
            Ok(false) => HealthComponent {
                status: ComponentStatus::Degraded,
                details: Some("No database configured, results are kept in memory".to_string()),
            },
            Err(e) => HealthComponent {
                status: ComponentStatus::Unhealthy,
                details: Some(e),
            },
        };

        let components: HashMap<String, HealthComponent> = vec![
            ("database".to_string(), database),
            ("classifier".to_string(), self.classifier_component()),
        ]
        .into_iter()
        .collect();

        SystemHealth::from_components(components, self.started_at.elapsed().as_secs())
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        let Some(DatabasePool::SQLite(pool)) = self.pool.as_ref() else {
            return Ok(false);
        };

        let pool = pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get().map_err(|e| format!("Database connection error: {}", e))?;
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map(|_| true)
                .map_err(|e| format!("Database query failed: {}", e))
        })
        .await
        .map_err(|e| format!("Database check aborted: {}", e))?
    }
}
