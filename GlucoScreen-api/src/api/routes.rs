use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use gluco_screen_data::database::DatabasePool;
use gluco_screen_data::repository::{InMemoryStorage, ProfileRepository, ResultRepository};
use gluco_screen_domain::auth::{auth_middleware, authorize, configure_auth, AccessControlService, AccessControlTrait, AuthGateway};
use gluco_screen_domain::classifier::RiskClassifier;
use gluco_screen_domain::errors::ScreeningError;
use gluco_screen_domain::health::{HealthService, HealthServiceTrait};
use gluco_screen_domain::services::{
    AdminService, AdminServiceTrait, ProfileService, ProfileServiceTrait, ScreeningService, ScreeningServiceTrait,
};

use crate::api::handlers::{admin, auth, health, profile, screening};
use crate::openapi::configure_swagger_routes;

pub type SharedAccessControl = Arc<dyn AccessControlTrait>;
pub type SharedScreeningService = Arc<dyn ScreeningServiceTrait>;
pub type SharedProfileService = Arc<dyn ProfileServiceTrait>;
pub type SharedAdminService = Arc<dyn AdminServiceTrait>;
pub type SharedHealthService = Arc<dyn HealthServiceTrait>;

/// Services shared by every handler
#[derive(Clone, FromRef)]
pub struct AppState {
    pub access: SharedAccessControl,
    pub screening: SharedScreeningService,
    pub profiles: SharedProfileService,
    pub admin: SharedAdminService,
    pub health: SharedHealthService,
}

/// Account created at startup with the admin role
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

impl AppState {
    /// Wire the services over one set of stores.
    ///
    /// With a pool every repository uses SQLite; without one they share a
    /// single in-process store so results and profiles stay consistent.
    pub async fn assemble(
        classifier: Arc<dyn RiskClassifier>,
        gateway: Arc<dyn AuthGateway>,
        pool: Option<DatabasePool>,
        admin_account: Option<AdminBootstrap>,
    ) -> Result<Self, ScreeningError> {
        let (records, profiles) = match pool.clone() {
            Some(pool) => (ResultRepository::with_pool(pool.clone()), ProfileRepository::with_pool(pool)),
            None => {
                info!("No database pool, keeping results and profiles in memory");
                let shared = InMemoryStorage::new();
                (
                    ResultRepository::with_storage(shared.clone()),
                    ProfileRepository::with_storage(shared),
                )
            }
        };

        let access = AccessControlService::new(gateway.clone(), profiles.clone());
        if let Some(account) = admin_account {
            access.ensure_admin_account(&account.email, &account.password).await?;
            info!("Admin account {} is ready", account.email);
        }

        Ok(Self {
            access: Arc::new(access),
            screening: Arc::new(ScreeningService::new(records.clone(), classifier.clone())),
            profiles: Arc::new(ProfileService::new(profiles.clone())),
            admin: Arc::new(AdminService::new(records, profiles, gateway)),
            health: Arc::new(HealthService::new(classifier, pool)),
        })
    }
}

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    debug!("Creating application router");

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh));

    let session_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::current_session))
        .layer(middleware::from_fn(auth_middleware));

    let api_routes = Router::new()
        .route("/screenings/assess", post(screening::assess))
        .route("/screenings", post(screening::submit))
        .route("/screenings/history", get(screening::history))
        .route("/screenings/summary", get(screening::summary))
        .route("/profile", get(profile::get_profile).put(profile::update_profile))
        .layer(middleware::from_fn(auth_middleware));

    // Authentication must happen before authorization, so it is the outer layer
    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/:email/role", put(admin::change_role))
        .route("/users/:email/password", put(admin::reset_password))
        .route("/users/:email", axum::routing::delete(admin::delete_user))
        .route("/results", get(admin::results_overview))
        .route("/results/export", get(admin::export_results))
        .route("/patients/:email", get(admin::patient_detail))
        .route("/dashboard", get(admin::dashboard))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authorize::require_role::<AppState>("admin"),
        ))
        .layer(middleware::from_fn(auth_middleware));

    let app = Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .nest("/api/v1", api_routes)
        .nest("/api/v1/admin", admin_routes)
        .with_state(state)
        .merge(configure_swagger_routes());

    debug!("Routes configured");

    configure_auth(app).layer(TraceLayer::new_for_http())
}
