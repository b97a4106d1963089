//! Administration: user management, result overview and dashboard figures.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tracing::{error, info, warn};

use gluco_screen_data::models::ProfileChanges;
use gluco_screen_data::repository::{storage_timestamp, ProfileStore, RecordStore, RepositoryError};

use crate::auth::access::normalize_email;
use crate::auth::gateway::AuthGateway;
use crate::auth::local::MIN_PASSWORD_LENGTH;
use crate::auth::session::Session;
use crate::entities::admin::{
    DailyGlucose, DashboardStats, PatientDetail, PatientResultRow, ResultFilter, UserSummary,
};
use crate::entities::conversions;
use crate::entities::screening::{ResultLabel, ScreeningRecord};
use crate::entities::user::{Role, UserProfile};
use crate::errors::ScreeningError;
use crate::services::risk_policy::status_for_record;

/// Records shown on a patient's detail page
pub const PATIENT_RECENT_RECORDS: usize = 10;

#[async_trait]
pub trait AdminServiceTrait: Send + Sync {
    async fn list_users(&self, actor: &Session) -> Result<Vec<UserSummary>, ScreeningError>;

    /// Set a user's role. Open sessions keep their role until refreshed.
    async fn change_role(&self, actor: &Session, email: &str, role: Role) -> Result<UserProfile, ScreeningError>;

    async fn reset_password(&self, actor: &Session, email: &str, new_password: &str) -> Result<(), ScreeningError>;

    /// Remove an identity and its profile. Screening records are kept.
    async fn delete_user(&self, actor: &Session, email: &str) -> Result<(), ScreeningError>;

    /// Every record, newest first, with status and patient name
    async fn results_overview(&self, actor: &Session, filter: ResultFilter) -> Result<Vec<PatientResultRow>, ScreeningError>;

    async fn patient_detail(&self, actor: &Session, email: &str) -> Result<PatientDetail, ScreeningError>;

    async fn dashboard(&self, actor: &Session) -> Result<DashboardStats, ScreeningError>;
}

pub struct AdminService<R: RecordStore, P: ProfileStore, G: AuthGateway> {
    records: R,
    profiles: P,
    gateway: G,
}

impl<R: RecordStore, P: ProfileStore, G: AuthGateway> AdminService<R, P, G> {
    pub fn new(records: R, profiles: P, gateway: G) -> Self {
        Self { records, profiles, gateway }
    }

    fn map_repo_error(&self, err: RepositoryError) -> ScreeningError {
        error!("Admin store error: {}", err);
        ScreeningError::from(err)
    }

    fn ensure_admin(actor: &Session) -> Result<(), ScreeningError> {
        if actor.role == Role::Admin {
            Ok(())
        } else {
            warn!("Non-admin {} attempted an admin operation", actor.email);
            Err(ScreeningError::AuthorizationError(
                "This operation requires the admin role".to_string(),
            ))
        }
    }

    async fn profiles_by_email(&self) -> Result<HashMap<String, UserProfile>, ScreeningError> {
        let stored = self.profiles.list().await.map_err(|e| self.map_repo_error(e))?;
        Ok(stored
            .into_iter()
            .map(conversions::convert_to_domain_profile)
            .map(|p| (p.email.clone(), p))
            .collect())
    }

    async fn all_records(&self) -> Result<Vec<ScreeningRecord>, ScreeningError> {
        let stored = self.records.query_all().await.map_err(|e| self.map_repo_error(e))?;
        Ok(conversions::convert_to_domain_records(stored))
    }

    /// Profiles united with identities only seen in results, sorted by email
    async fn user_union(&self) -> Result<Vec<UserSummary>, ScreeningError> {
        let mut users: BTreeMap<String, UserSummary> = self
            .profiles_by_email()
            .await?
            .into_values()
            .map(|p| {
                let summary = UserSummary {
                    email: p.email.clone(),
                    name: p.full_name(),
                    role: p.role,
                    has_profile: true,
                };
                (p.email, summary)
            })
            .collect();

        let seen = self.records.distinct_users().await.map_err(|e| self.map_repo_error(e))?;
        for email in seen {
            users.entry(email.clone()).or_insert_with(|| UserSummary {
                email,
                name: UserSummary::NO_PROFILE_NAME.to_string(),
                role: Role::User,
                has_profile: false,
            });
        }

        Ok(users.into_values().collect())
    }
}

#[async_trait]
impl<R: RecordStore, P: ProfileStore, G: AuthGateway> AdminServiceTrait for AdminService<R, P, G> {
    async fn list_users(&self, actor: &Session) -> Result<Vec<UserSummary>, ScreeningError> {
        Self::ensure_admin(actor)?;
        self.user_union().await
    }

    async fn change_role(&self, actor: &Session, email: &str, role: Role) -> Result<UserProfile, ScreeningError> {
        Self::ensure_admin(actor)?;
        let email = normalize_email(email);

        let changes = ProfileChanges {
            role: Some(role.as_str().to_string()),
            updated_at: Some(storage_timestamp()),
            ..Default::default()
        };
        let stored = self.profiles.merge(&email, changes).await.map_err(|e| self.map_repo_error(e))?;

        info!("{} changed role of {} to {}", actor.email, email, role);
        Ok(conversions::convert_to_domain_profile(stored))
    }

    async fn reset_password(&self, actor: &Session, email: &str, new_password: &str) -> Result<(), ScreeningError> {
        Self::ensure_admin(actor)?;
        let email = normalize_email(email);

        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ScreeningError::ValidationError(format!(
                "Password must be at least {} characters", MIN_PASSWORD_LENGTH
            )));
        }

        let uid = self
            .gateway
            .find_uid(&email)
            .await?
            .ok_or_else(|| ScreeningError::NotFound(format!("No account for {}", email)))?;
        self.gateway.update_password(&uid, new_password).await?;

        info!("{} reset the password of {}", actor.email, email);
        Ok(())
    }

    async fn delete_user(&self, actor: &Session, email: &str) -> Result<(), ScreeningError> {
        Self::ensure_admin(actor)?;
        let email = normalize_email(email);

        if email.eq_ignore_ascii_case(&actor.email) {
            return Err(ScreeningError::AuthorizationError(
                "Admins cannot delete their own account".to_string(),
            ));
        }

        let profile = self.profiles.get(&email).await.map_err(|e| self.map_repo_error(e))?;
        if profile.as_ref().map(|p| Role::from_stored(&p.role)) == Some(Role::Admin) {
            return Err(ScreeningError::AuthorizationError(
                "Admin accounts cannot be deleted".to_string(),
            ));
        }

        let uid = self.gateway.find_uid(&email).await?;
        if uid.is_none() && profile.is_none() {
            return Err(ScreeningError::NotFound(format!("No account for {}", email)));
        }

        match uid {
            Some(uid) => self.gateway.delete_user(&uid).await?,
            None => warn!("{} has a profile but no identity, removing the profile only", email),
        }
        self.profiles.delete(&email).await.map_err(|e| self.map_repo_error(e))?;

        info!("{} deleted user {}", actor.email, email);
        Ok(())
    }

    async fn results_overview(&self, actor: &Session, filter: ResultFilter) -> Result<Vec<PatientResultRow>, ScreeningError> {
        Self::ensure_admin(actor)?;

        let patients: HashMap<String, UserProfile> = self
            .profiles_by_email()
            .await?
            .into_iter()
            .filter(|(_, p)| p.role != Role::Admin)
            .collect();
        let search = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let mut rows: Vec<PatientResultRow> = self
            .all_records()
            .await?
            .into_iter()
            .rev()
            .map(|record| {
                let patient_name = match patients.get(&record.user_email) {
                    Some(profile) => profile.full_name(),
                    None if !record.user_name.is_empty() => record.user_name.clone(),
                    None => UserProfile::UNSPECIFIED_NAME.to_string(),
                };
                PatientResultRow {
                    status: status_for_record(record.result, record.glucose),
                    patient_name,
                    record,
                }
            })
            .collect();

        if let Some(needle) = search {
            rows.retain(|row| {
                row.patient_name.to_lowercase().contains(&needle)
                    || row.record.user_email.to_lowercase().contains(&needle)
            });
        }
        if let Some(status) = filter.status {
            rows.retain(|row| row.status == status);
        }

        Ok(rows)
    }

    async fn patient_detail(&self, actor: &Session, email: &str) -> Result<PatientDetail, ScreeningError> {
        Self::ensure_admin(actor)?;
        let email = normalize_email(email);

        let profile = self.profiles.get(&email).await.map_err(|e| self.map_repo_error(e))?;
        let stored = self
            .records
            .query_by_user(&email, None, None)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        if profile.is_none() && stored.is_empty() {
            return Err(ScreeningError::NotFound(format!("No patient {}", email)));
        }

        let mut recent_records = conversions::convert_to_domain_records(stored);
        recent_records.reverse();
        recent_records.truncate(PATIENT_RECENT_RECORDS);

        Ok(PatientDetail {
            profile: profile
                .map(conversions::convert_to_domain_profile)
                .unwrap_or_else(|| UserProfile::default_for(&email)),
            recent_records,
        })
    }

    async fn dashboard(&self, actor: &Session) -> Result<DashboardStats, ScreeningError> {
        Self::ensure_admin(actor)?;

        let total_users = self.user_union().await?.len();
        let records = self.all_records().await?;

        let mut days: BTreeMap<chrono::NaiveDate, (i64, usize)> = BTreeMap::new();
        for record in &records {
            let entry = days.entry(record.recorded_at.date_naive()).or_insert((0, 0));
            entry.0 += record.glucose as i64;
            entry.1 += 1;
        }

        Ok(DashboardStats {
            total_users,
            total_predictions: records.len(),
            risk_count: records.iter().filter(|r| r.result == ResultLabel::Risk).count(),
            daily_mean_glucose: days
                .into_iter()
                .map(|(day, (sum, count))| DailyGlucose {
                    day,
                    mean_glucose: sum as f64 / count as f64,
                    count,
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::gateway::{GatewayError, MockAuthGateway};
    use crate::entities::screening::RiskStatus;
    use chrono::{Duration, Utc};
    use gluco_screen_data::models::{StoredScreeningRecord, StoredUserProfile};
    use gluco_screen_data::repository::tests::{sample_record, MockProfileStore, MockRecordStore};
    use mockall::predicate::eq;

    fn session(email: &str, role: Role) -> Session {
        let now = Utc::now();
        Session {
            session_id: format!("sid-{}", email),
            email: email.to_string(),
            role,
            issued_at: now,
            expires_at: now + Duration::minutes(15),
        }
    }

    fn admin() -> Session {
        session("root@example.com", Role::Admin)
    }

    fn profile(email: &str, name: &str, role: &str) -> StoredUserProfile {
        let mut p = StoredUserProfile::new(email);
        p.name = Some(name.to_string());
        p.role = role.to_string();
        p
    }

    fn record(email: &str, glucose: i32, result: &str, at: &str) -> StoredScreeningRecord {
        let mut r = sample_record(email, glucose).into_stored(format!("{}-{}", email, at), at.to_string());
        r.result = result.to_string();
        r
    }

    fn fixture(gateway: MockAuthGateway) -> AdminService<MockRecordStore, MockProfileStore, MockAuthGateway> {
        let records = MockRecordStore::with_records(vec![
            record("ana@example.com", 95, "no-risk", "2024-05-01T08:00:00.000Z"),
            record("ana@example.com", 140, "risk", "2024-05-01T20:00:00.000Z"),
            record("bo@example.com", 110, "risk", "2024-05-02T09:00:00.000Z"),
            record("ghost@example.com", 100, "no-risk", "2024-05-03T09:00:00.000Z"),
        ]);
        let profiles = MockProfileStore::with_profiles(vec![
            profile("ana@example.com", "Ana", "user"),
            profile("bo@example.com", "Bo", "user"),
            profile("root@example.com", "Root", "admin"),
        ]);
        AdminService::new(records, profiles, gateway)
    }

    #[tokio::test]
    async fn test_non_admin_is_rejected() {
        let service = fixture(MockAuthGateway::new());
        let user = session("ana@example.com", Role::User);
        let err = service.list_users(&user).await.unwrap_err();
        assert!(matches!(err, ScreeningError::AuthorizationError(_)));
    }

    #[tokio::test]
    async fn test_list_users_includes_identities_without_profile() {
        let service = fixture(MockAuthGateway::new());
        let users = service.list_users(&admin()).await.unwrap();

        assert_eq!(users.len(), 4);
        let ghost = users.iter().find(|u| u.email == "ghost@example.com").unwrap();
        assert_eq!(ghost.name, "new user (no profile)");
        assert_eq!(ghost.role, Role::User);
        assert!(!ghost.has_profile);
    }

    #[tokio::test]
    async fn test_change_role_creates_missing_profile() {
        let service = fixture(MockAuthGateway::new());
        let profile = service
            .change_role(&admin(), "ghost@example.com", Role::Admin)
            .await
            .unwrap();
        assert_eq!(profile.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_change_role_matches_stored_email_case() {
        let service = fixture(MockAuthGateway::new());
        let profile = service
            .change_role(&admin(), " Ana@Example.COM ", Role::Admin)
            .await
            .unwrap();
        assert_eq!(profile.email, "ana@example.com");
        assert_eq!(profile.name, "Ana");
        assert_eq!(profile.role, Role::Admin);

        let users = service.list_users(&admin()).await.unwrap();
        assert_eq!(users.len(), 4);
    }

    #[tokio::test]
    async fn test_mixed_case_target_reaches_identity() {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_find_uid()
            .with(eq("bo@example.com"))
            .returning(|_| Ok(Some("uid-bo".to_string())));
        gateway
            .expect_update_password()
            .with(eq("uid-bo"), eq("s3cret!"))
            .times(1)
            .returning(|_, _| Ok(()));
        let service = fixture(gateway);

        service.reset_password(&admin(), "BO@example.com", "s3cret!").await.unwrap();

        let detail = service.patient_detail(&admin(), "Bo@Example.com").await.unwrap();
        assert_eq!(detail.profile.name, "Bo");
        assert_eq!(detail.recent_records.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_password() {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_find_uid()
            .with(eq("ana@example.com"))
            .returning(|_| Ok(Some("uid-ana".to_string())));
        gateway
            .expect_find_uid()
            .with(eq("nobody@example.com"))
            .returning(|_| Ok(None));
        gateway
            .expect_update_password()
            .with(eq("uid-ana"), eq("s3cret!"))
            .times(1)
            .returning(|_, _| Ok(()));
        let service = fixture(gateway);

        service.reset_password(&admin(), "ana@example.com", "s3cret!").await.unwrap();

        let err = service.reset_password(&admin(), "ana@example.com", "123").await.unwrap_err();
        assert!(matches!(err, ScreeningError::ValidationError(_)));

        let err = service.reset_password(&admin(), "nobody@example.com", "s3cret!").await.unwrap_err();
        assert!(matches!(err, ScreeningError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_user_guards_admins() {
        let service = fixture(MockAuthGateway::new());

        let err = service.delete_user(&admin(), "root@example.com").await.unwrap_err();
        assert!(matches!(err, ScreeningError::AuthorizationError(_)));

        let other_admin = session("ops@example.com", Role::Admin);
        let err = service.delete_user(&other_admin, "root@example.com").await.unwrap_err();
        assert!(matches!(err, ScreeningError::AuthorizationError(_)));
    }

    #[tokio::test]
    async fn test_delete_user_keeps_records() {
        let mut gateway = MockAuthGateway::new();
        gateway.expect_find_uid().returning(|_| Ok(Some("uid-bo".to_string())));
        gateway
            .expect_delete_user()
            .with(eq("uid-bo"))
            .times(1)
            .returning(|_| Ok(()));
        let service = fixture(gateway);

        service.delete_user(&admin(), "bo@example.com").await.unwrap();

        assert!(service.profiles.get("bo@example.com").await.unwrap().is_none());
        assert_eq!(service.records.len(), 4);
    }

    #[tokio::test]
    async fn test_delete_unknown_user_is_not_found() {
        let mut gateway = MockAuthGateway::new();
        gateway.expect_find_uid().returning(|_| Ok(None));
        let service = fixture(gateway);

        let err = service.delete_user(&admin(), "nobody@example.com").await.unwrap_err();
        assert!(matches!(err, ScreeningError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_gateway_outage_is_persistence_error() {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_find_uid()
            .returning(|_| Err(GatewayError::Unavailable("timeout".to_string())));
        let service = fixture(gateway);

        let err = service.reset_password(&admin(), "ana@example.com", "s3cret!").await.unwrap_err();
        assert!(matches!(err, ScreeningError::PersistenceError(_)));
    }

    #[tokio::test]
    async fn test_results_overview_filters() {
        let service = fixture(MockAuthGateway::new());

        let rows = service.results_overview(&admin(), ResultFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].record.user_email, "ghost@example.com");
        assert_eq!(rows[0].patient_name, "Test User");

        let rows = service
            .results_overview(&admin(), ResultFilter { search: Some("ANA".to_string()), status: None })
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.patient_name == "Ana"));

        let rows = service
            .results_overview(&admin(), ResultFilter { search: None, status: Some(RiskStatus::HighRisk) })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.glucose, 140);
    }

    #[tokio::test]
    async fn test_patient_detail_is_newest_first() {
        let service = fixture(MockAuthGateway::new());
        let detail = service.patient_detail(&admin(), "ana@example.com").await.unwrap();
        assert_eq!(detail.profile.name, "Ana");
        assert_eq!(detail.recent_records[0].glucose, 140);

        let err = service.patient_detail(&admin(), "nobody@example.com").await.unwrap_err();
        assert!(matches!(err, ScreeningError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_dashboard() {
        let service = fixture(MockAuthGateway::new());
        let stats = service.dashboard(&admin()).await.unwrap();

        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.total_predictions, 4);
        assert_eq!(stats.risk_count, 2);
        assert_eq!(stats.daily_mean_glucose.len(), 3);
        assert_eq!(stats.daily_mean_glucose[0].mean_glucose, 117.5);
        assert_eq!(stats.daily_mean_glucose[0].count, 2);
    }
}
