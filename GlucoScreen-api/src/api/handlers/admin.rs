use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::{info, instrument};
use validator::Validate;

use gluco_screen_domain::auth::Session;
use gluco_screen_domain::entities::{DashboardStats, PatientDetail, PatientResultRow, UserProfile, UserSummary};
use gluco_screen_domain::export::export_results_csv;

use crate::api::handlers::error::ErrorResponse;
use crate::api::routes::SharedAdminService;
use crate::entities::admin::{PublicPasswordResetRequest, PublicRoleChangeRequest, ResultsQueryParams};

/// Every known identity: profiles plus emails only seen in results
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    responses(
        (status = 200, description = "Users", body = [UserSummary]),
        (status = 403, description = "Admin role required", body = ErrorResponse),
    ),
    tag = "admin",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = %actor.email))]
pub async fn list_users(
    State(admin): State<SharedAdminService>,
    Extension(actor): Extension<Session>,
) -> Result<Json<Vec<UserSummary>>, ErrorResponse> {
    Ok(Json(admin.list_users(&actor).await?))
}

/// Set a user's role; it reaches their sessions on the next refresh
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{email}/role",
    params(("email" = String, Path, description = "Target account email")),
    request_body = PublicRoleChangeRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 403, description = "Admin role required", body = ErrorResponse),
    ),
    tag = "admin",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = %actor.email, target = %email))]
pub async fn change_role(
    State(admin): State<SharedAdminService>,
    Extension(actor): Extension<Session>,
    Path(email): Path<String>,
    Json(request): Json<PublicRoleChangeRequest>,
) -> Result<Json<UserProfile>, ErrorResponse> {
    let profile = admin.change_role(&actor, &email, request.role).await?;
    info!("Role of {} set to {}", email, profile.role);
    Ok(Json(profile))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{email}/password",
    params(("email" = String, Path, description = "Target account email")),
    request_body = PublicPasswordResetRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Password too short", body = ErrorResponse),
        (status = 404, description = "Unknown account", body = ErrorResponse),
    ),
    tag = "admin",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = %actor.email, target = %email))]
pub async fn reset_password(
    State(admin): State<SharedAdminService>,
    Extension(actor): Extension<Session>,
    Path(email): Path<String>,
    Json(request): Json<PublicPasswordResetRequest>,
) -> Result<StatusCode, ErrorResponse> {
    request.validate()?;
    admin.reset_password(&actor, &email, &request.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove an account and its profile; screening records are kept
#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{email}",
    params(("email" = String, Path, description = "Target account email")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Cannot delete yourself or another admin", body = ErrorResponse),
        (status = 404, description = "Unknown account", body = ErrorResponse),
    ),
    tag = "admin",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = %actor.email, target = %email))]
pub async fn delete_user(
    State(admin): State<SharedAdminService>,
    Extension(actor): Extension<Session>,
    Path(email): Path<String>,
) -> Result<StatusCode, ErrorResponse> {
    admin.delete_user(&actor, &email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// All results, newest first, with derived status and patient name
#[utoipa::path(
    get,
    path = "/api/v1/admin/results",
    params(ResultsQueryParams),
    responses(
        (status = 200, description = "Result rows", body = [PatientResultRow]),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
    ),
    tag = "admin",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = %actor.email))]
pub async fn results_overview(
    State(admin): State<SharedAdminService>,
    Extension(actor): Extension<Session>,
    Query(params): Query<ResultsQueryParams>,
) -> Result<Json<Vec<PatientResultRow>>, ErrorResponse> {
    let filter = params.to_filter()?;
    Ok(Json(admin.results_overview(&actor, filter).await?))
}

/// The filtered results as a CSV download (UTF-8 with BOM)
#[utoipa::path(
    get,
    path = "/api/v1/admin/results/export",
    params(ResultsQueryParams),
    responses(
        (status = 200, description = "CSV report", body = String, content_type = "text/csv"),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
    ),
    tag = "admin",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = %actor.email))]
pub async fn export_results(
    State(admin): State<SharedAdminService>,
    Extension(actor): Extension<Session>,
    Query(params): Query<ResultsQueryParams>,
) -> Result<Response, ErrorResponse> {
    let filter = params.to_filter()?;
    let file_name = ResultsQueryParams::export_file_name(&filter);

    let rows = admin.results_overview(&actor, filter).await?;
    let body = export_results_csv(&rows)?;
    info!("Exported {} rows as {}", rows.len(), file_name);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        body,
    )
        .into_response())
}

/// Profile and latest records of one patient
#[utoipa::path(
    get,
    path = "/api/v1/admin/patients/{email}",
    params(("email" = String, Path, description = "Patient email")),
    responses(
        (status = 200, description = "Patient detail", body = PatientDetail),
        (status = 403, description = "Admin role required", body = ErrorResponse),
    ),
    tag = "admin",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = %actor.email, target = %email))]
pub async fn patient_detail(
    State(admin): State<SharedAdminService>,
    Extension(actor): Extension<Session>,
    Path(email): Path<String>,
) -> Result<Json<PatientDetail>, ErrorResponse> {
    Ok(Json(admin.patient_detail(&actor, &email).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    responses(
        (status = 200, description = "Dashboard figures", body = DashboardStats),
        (status = 403, description = "Admin role required", body = ErrorResponse),
    ),
    tag = "admin",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(actor = %actor.email))]
pub async fn dashboard(
    State(admin): State<SharedAdminService>,
    Extension(actor): Extension<Session>,
) -> Result<Json<DashboardStats>, ErrorResponse> {
    Ok(Json(admin.dashboard(&actor).await?))
}
