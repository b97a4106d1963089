use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::{info, instrument};
use validator::Validate;

use gluco_screen_domain::auth::Session;
use gluco_screen_domain::entities::UserProfile;
use gluco_screen_domain::errors::ScreeningError;

use crate::api::handlers::error::ErrorResponse;
use crate::api::routes::SharedAccessControl;
use crate::entities::auth::{
    PublicLoginRequest, PublicRegistrationRequest, PublicSessionResponse, PublicTokenRefreshRequest,
};

/// Create an account with the `user` role
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = PublicRegistrationRequest,
    responses(
        (status = 201, description = "Account created", body = UserProfile),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 503, description = "Identity provider unavailable", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
#[instrument(skip(access, request), fields(email = %request.email))]
pub async fn register(
    State(access): State<SharedAccessControl>,
    Json(request): Json<PublicRegistrationRequest>,
) -> Result<(StatusCode, Json<UserProfile>), ErrorResponse> {
    request.validate()?;

    match access.register(&request.email, &request.password).await {
        Ok(profile) => {
            info!("Registered {}", profile.email);
            Ok((StatusCode::CREATED, Json(profile)))
        }
        Err(ScreeningError::AuthError(message)) => Err(ErrorResponse::conflict(message)),
        Err(e) => Err(e.into()),
    }
}

/// Open a session
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = PublicLoginRequest,
    responses(
        (status = 200, description = "Session opened", body = PublicSessionResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
#[instrument(skip(access, request), fields(email = %request.email))]
pub async fn login(
    State(access): State<SharedAccessControl>,
    Json(request): Json<PublicLoginRequest>,
) -> Result<Json<PublicSessionResponse>, ErrorResponse> {
    request.validate()?;
    let opened = access.login(&request.email, &request.password).await?;
    Ok(Json(opened.into()))
}

/// Exchange a refresh token for a new session with the current role
#[utoipa::path(
    post,
    path = "/auth/refresh",
    request_body = PublicTokenRefreshRequest,
    responses(
        (status = 200, description = "New session", body = PublicSessionResponse),
        (status = 401, description = "Invalid, expired or used refresh token", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn refresh(
    State(access): State<SharedAccessControl>,
    Json(request): Json<PublicTokenRefreshRequest>,
) -> Result<Json<PublicSessionResponse>, ErrorResponse> {
    request.validate()?;
    let renewed = access.refresh(&request.refresh_token).await?;
    Ok(Json(renewed.into()))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    ),
    tag = "Authentication",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(email = %session.email))]
pub async fn logout(
    State(access): State<SharedAccessControl>,
    Extension(session): Extension<Session>,
) -> StatusCode {
    access.logout(&session);
    StatusCode::NO_CONTENT
}

/// The session behind the bearer token
#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Current session", body = Session),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    ),
    tag = "Authentication",
    security(("bearer" = []))
)]
pub async fn current_session(
    State(access): State<SharedAccessControl>,
    Extension(session): Extension<Session>,
) -> Json<Session> {
    let role = access.current_role(&session);
    Json(Session { role, ..session })
}
