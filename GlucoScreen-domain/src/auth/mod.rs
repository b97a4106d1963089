//! Authentication module for the GlucoScreen API
//!
//! Sessions are carried by signed JWTs. Credentials are checked by an
//! identity provider behind the `AuthGateway` trait; roles come from the
//! profile store.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::logging::{log_auth_event, AuthEvent, AuthEventType};
use crate::auth::token::{SecurityError, TokenType};

// JWT signing and validation
pub mod token;

// Revoked sessions
pub mod token_blacklist;

// Audit trail
pub mod logging;

// Session values and lifecycle
pub mod session;

// Identity provider contract and its implementations
pub mod gateway;
pub mod local;
pub mod firebase;

// Login, registration, refresh and logout
pub mod access;

// Role checks for routes
pub mod authorize;

pub use access::{AccessControlService, AccessControlTrait};
pub use gateway::{AuthGateway, GatewayError, GatewayIdentity};
pub use session::{Session, SessionTokens};

/// Claims carried by access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (email)
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Session id, shared by the access and refresh token of one session
    pub sid: String,
    /// Role snapshot at issue time
    pub role: String,
    /// `access` or `refresh`
    pub typ: String,
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "auth_error",
            "message": message
        })),
    )
        .into_response()
}

/// Authentication middleware for protected routes.
///
/// Resolves the bearer access token into a `Session` and stores it in the
/// request extensions for handlers and `require_role`.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Response {
    let request_path = req.uri().path().to_string();
    let start_time = std::time::Instant::now();

    let failure = |details: &str, user: Option<&str>, path: String| {
        log_auth_event(
            AuthEvent::new(AuthEventType::TokenValidation, user, false)
                .with_details(details.to_string())
                .with_resource(path)
                .with_duration(start_time.elapsed().as_millis() as u64)
                .with_auth_method("jwt"),
        );
    };

    let bearer = match req.headers().get(header::AUTHORIZATION).map(|v| v.to_str()) {
        Some(Ok(value)) => match value.strip_prefix("Bearer ") {
            Some(token) => token.trim().to_string(),
            None => {
                warn!("Authorization header does not contain Bearer token");
                failure("Authorization header does not contain Bearer token", None, request_path);
                return unauthorized("Bearer token required");
            }
        },
        Some(Err(_)) => {
            warn!("Invalid Authorization header format");
            failure("Invalid Authorization header format", None, request_path);
            return unauthorized("Invalid Authorization header");
        }
        None => {
            debug!("Missing Authorization header");
            failure("Missing Authorization header", None, request_path);
            return unauthorized("Authentication required");
        }
    };

    let claims = match token::validate_token(&bearer, TokenType::Access) {
        Ok(claims) => claims,
        Err(e) => {
            let message = match e {
                SecurityError::TokenExpired => "Session has expired",
                SecurityError::TokenRevoked => "Session has ended",
                _ => "Invalid session token",
            };
            warn!("Token rejected for {}: {}", request_path, e);
            failure(&e.to_string(), None, request_path);
            return unauthorized(message);
        }
    };

    let session = match Session::from_claims(&claims) {
        Ok(session) => session,
        Err(e) => {
            failure(&e.to_string(), Some(&claims.sub), request_path);
            return unauthorized("Invalid session token");
        }
    };

    debug!("Session {} resolved for {}", session.session_id, session.email);
    log_auth_event(
        AuthEvent::new(AuthEventType::TokenValidation, Some(&session.email), true)
            .with_resource(request_path)
            .with_duration(start_time.elapsed().as_millis() as u64)
            .with_auth_method("jwt"),
    );

    req.extensions_mut().insert(session);
    next.run(req).await
}

/// Apply CORS and security headers to the application
pub fn configure_auth(app: axum::Router) -> axum::Router {
    use axum::http::{HeaderName, HeaderValue, Method};
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::set_header::SetResponseHeaderLayer;

    let auth_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_DISPOSITION])
        .max_age(std::time::Duration::from_secs(3600));

    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=63072000; includeSubDomains; preload"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(
                "default-src 'self'; script-src 'self' 'unsafe-inline'; connect-src 'self'; img-src 'self' data:; style-src 'self' 'unsafe-inline'; frame-ancestors 'none'; form-action 'self'; base-uri 'self'",
            ),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=(), interest-cohort=()"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("x-permitted-cross-domain-policies"),
            HeaderValue::from_static("none"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ));

    app.layer(auth_cors).layer(security_headers)
}
