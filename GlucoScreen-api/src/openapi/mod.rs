use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Swagger UI at `/api-docs`, OpenAPI JSON at `/api-docs/openapi.json`
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health_check,

        crate::api::handlers::auth::register,
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::refresh,
        crate::api::handlers::auth::logout,
        crate::api::handlers::auth::current_session,

        crate::api::handlers::screening::assess,
        crate::api::handlers::screening::submit,
        crate::api::handlers::screening::history,
        crate::api::handlers::screening::summary,

        crate::api::handlers::profile::get_profile,
        crate::api::handlers::profile::update_profile,

        crate::api::handlers::admin::list_users,
        crate::api::handlers::admin::change_role,
        crate::api::handlers::admin::reset_password,
        crate::api::handlers::admin::delete_user,
        crate::api::handlers::admin::results_overview,
        crate::api::handlers::admin::export_results,
        crate::api::handlers::admin::patient_detail,
        crate::api::handlers::admin::dashboard
    ),
    components(
        schemas(
            crate::api::handlers::error::ErrorResponse,
            crate::entities::auth::PublicRegistrationRequest,
            crate::entities::auth::PublicLoginRequest,
            crate::entities::auth::PublicTokenRefreshRequest,
            crate::entities::auth::PublicSessionResponse,
            crate::entities::screening::PublicScreeningRequest,
            crate::entities::screening::HistoryQueryParams,
            crate::entities::admin::PublicRoleChangeRequest,
            crate::entities::admin::PublicPasswordResetRequest,
            crate::entities::admin::ResultsQueryParams,

            gluco_screen_domain::auth::Session,
            gluco_screen_domain::entities::Role,
            gluco_screen_domain::entities::UserProfile,
            gluco_screen_domain::entities::ProfileUpdate,
            gluco_screen_domain::entities::BloodType,
            gluco_screen_domain::entities::Gender,
            gluco_screen_domain::entities::FamilyHistory,
            gluco_screen_domain::entities::SymptomFlags,
            gluco_screen_domain::entities::ScreeningOutcome,
            gluco_screen_domain::entities::RiskAssessment,
            gluco_screen_domain::entities::Recommendation,
            gluco_screen_domain::entities::RecommendationKind,
            gluco_screen_domain::entities::RiskStatus,
            gluco_screen_domain::entities::ResultLabel,
            gluco_screen_domain::entities::BmiCategory,
            gluco_screen_domain::entities::ScreeningReport,
            gluco_screen_domain::entities::ScreeningRecord,
            gluco_screen_domain::entities::HistorySummary,
            gluco_screen_domain::entities::TrendPoint,
            gluco_screen_domain::entities::UserSummary,
            gluco_screen_domain::entities::PatientResultRow,
            gluco_screen_domain::entities::PatientDetail,
            gluco_screen_domain::entities::DailyGlucose,
            gluco_screen_domain::entities::DashboardStats,
            gluco_screen_domain::health::SystemHealth,
            gluco_screen_domain::health::HealthComponent,
            gluco_screen_domain::health::ComponentStatus,
            gluco_screen_domain::health::SystemStatus
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Service health"),
        (name = "Authentication", description = "Registration, login and sessions"),
        (name = "screening", description = "Diabetes risk screening and history"),
        (name = "profile", description = "The caller's own profile"),
        (name = "admin", description = "User management, results and dashboard (admin role)")
    ),
    info(
        title = "GlucoScreen API",
        version = "0.1.0",
        description = "Diabetes risk screening: questionnaire scoring, history and administration",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;
