use axum::{extract::State, Extension, Json};
use tracing::instrument;

use gluco_screen_domain::auth::Session;
use gluco_screen_domain::entities::{ProfileUpdate, UserProfile};

use crate::api::handlers::error::ErrorResponse;
use crate::api::routes::SharedProfileService;

/// The caller's profile, with defaults when none was saved yet
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 503, description = "Profile store unavailable", body = ErrorResponse),
    ),
    tag = "profile",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(email = %session.email))]
pub async fn get_profile(
    State(profiles): State<SharedProfileService>,
    Extension(session): Extension<Session>,
) -> Result<Json<UserProfile>, ErrorResponse> {
    Ok(Json(profiles.get_profile(&session.email).await?))
}

/// Update the caller's own profile. The role cannot be changed here.
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Invalid profile data", body = ErrorResponse),
    ),
    tag = "profile",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(email = %session.email))]
pub async fn update_profile(
    State(profiles): State<SharedProfileService>,
    Extension(session): Extension<Session>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, ErrorResponse> {
    Ok(Json(profiles.update_profile(&session.email, update).await?))
}
