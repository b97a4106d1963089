use axum::{
    extract::{Query, State},
    Extension, Json,
};
use tracing::{info, instrument, warn};
use validator::Validate;

use gluco_screen_domain::auth::Session;
use gluco_screen_domain::entities::{
    DateRange, HistorySummary, ScreeningInput, ScreeningOutcome, ScreeningRecord, ScreeningReport, Submitter,
};

use crate::api::handlers::error::ErrorResponse;
use crate::api::routes::{SharedProfileService, SharedScreeningService};
use crate::entities::screening::{HistoryQueryParams, PublicScreeningRequest};

fn parse_range(params: &HistoryQueryParams) -> Result<DateRange, ErrorResponse> {
    Ok(DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref())?)
}

/// Score a questionnaire without saving it
#[utoipa::path(
    post,
    path = "/api/v1/screenings/assess",
    request_body = PublicScreeningRequest,
    responses(
        (status = 200, description = "Risk assessment", body = ScreeningOutcome),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    ),
    tag = "screening",
    security(("bearer" = []))
)]
#[instrument(skip_all)]
pub async fn assess(
    State(screening): State<SharedScreeningService>,
    Json(request): Json<PublicScreeningRequest>,
) -> Result<Json<ScreeningOutcome>, ErrorResponse> {
    request.validate()?;
    let input = ScreeningInput::from(request);
    Ok(Json(screening.assess(&input).await?))
}

/// Score a questionnaire and append it to the caller's history.
///
/// A failed save still returns the assessment, with `saved: false`.
#[utoipa::path(
    post,
    path = "/api/v1/screenings",
    request_body = PublicScreeningRequest,
    responses(
        (status = 200, description = "Assessment and save status", body = ScreeningReport),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    ),
    tag = "screening",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(email = %session.email))]
pub async fn submit(
    State(screening): State<SharedScreeningService>,
    State(profiles): State<SharedProfileService>,
    Extension(session): Extension<Session>,
    Json(request): Json<PublicScreeningRequest>,
) -> Result<Json<ScreeningReport>, ErrorResponse> {
    request.validate()?;

    // The record carries the name on file; an unreachable profile store must not block a screening
    let name = match profiles.get_profile(&session.email).await {
        Ok(profile) => profile.full_name(),
        Err(e) => {
            warn!("Submitting without profile name: {}", e);
            String::new()
        }
    };

    let submitter = Submitter {
        email: session.email.clone(),
        name,
        role: session.role,
    };
    let report = screening.submit(submitter, request.into()).await?;
    info!(
        "Screening for {}: {} (saved: {})",
        session.email, report.outcome.assessment.status, report.saved
    );
    Ok(Json(report))
}

/// The caller's screenings, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/screenings/history",
    params(HistoryQueryParams),
    responses(
        (status = 200, description = "Screening history", body = [ScreeningRecord]),
        (status = 400, description = "Invalid date range", body = ErrorResponse),
        (status = 503, description = "Result store unavailable", body = ErrorResponse),
    ),
    tag = "screening",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(email = %session.email))]
pub async fn history(
    State(screening): State<SharedScreeningService>,
    Extension(session): Extension<Session>,
    Query(params): Query<HistoryQueryParams>,
) -> Result<Json<Vec<ScreeningRecord>>, ErrorResponse> {
    let range = parse_range(&params)?;
    Ok(Json(screening.history(&session.email, range).await?))
}

/// Counts and glucose/BMI trends of the caller's screenings
#[utoipa::path(
    get,
    path = "/api/v1/screenings/summary",
    params(HistoryQueryParams),
    responses(
        (status = 200, description = "History summary", body = HistorySummary),
        (status = 400, description = "Invalid date range", body = ErrorResponse),
        (status = 503, description = "Result store unavailable", body = ErrorResponse),
    ),
    tag = "screening",
    security(("bearer" = []))
)]
#[instrument(skip_all, fields(email = %session.email))]
pub async fn summary(
    State(screening): State<SharedScreeningService>,
    Extension(session): Extension<Session>,
    Query(params): Query<HistoryQueryParams>,
) -> Result<Json<HistorySummary>, ErrorResponse> {
    let range = parse_range(&params)?;
    Ok(Json(screening.history_summary(&session.email, range).await?))
}
