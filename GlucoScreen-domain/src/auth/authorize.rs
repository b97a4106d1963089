use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use futures::future::BoxFuture;
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::logging::{log_access_denied, log_auth_event, AuthEvent, AuthEventType};
use crate::auth::session::Session;

/// Middleware for role-based access control
///
/// Lets the request through when the session placed by `auth_middleware`
/// holds any of the required roles, otherwise answers 403.
pub async fn require_roles<S, I>(
    _state: State<S>,
    req: Request<Body>,
    next: Next,
    required_roles: I,
) -> Response
where
    I: IntoIterator<Item = String>,
{
    let required_roles: Vec<String> = required_roles.into_iter().collect();
    let request_path = req.uri().path().to_string();

    match req.extensions().get::<Session>() {
        Some(session) => {
            let role = session.role.as_str();
            if required_roles.iter().any(|r| r == role) {
                debug!("{} has required role for {}", session.email, request_path);
                next.run(req).await
            } else {
                warn!(
                    "{} ({}) lacks required roles {:?} for {}",
                    session.email, role, required_roles, request_path
                );
                log_access_denied(&session.email, &request_path, &required_roles);

                (
                    StatusCode::FORBIDDEN,
                    Json(json!({
                        "error": "forbidden",
                        "message": "You don't have the required permissions to access this resource",
                        "required_roles": required_roles
                    })),
                )
                    .into_response()
            }
        }
        None => {
            // auth_middleware must run first
            warn!("No session in request extensions for path: {}", request_path);
            log_auth_event(
                AuthEvent::new(AuthEventType::AccessDenied, None, false)
                    .with_details("Session missing in request extensions")
                    .with_resource(request_path)
                    .with_auth_method("rbac"),
            );

            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "auth_error",
                    "message": "Authentication required"
                })),
            )
                .into_response()
        }
    }
}

/// Middleware factory requiring one role.
///
/// ```ignore
/// let admin_routes = Router::new()
///     .route("/admin/users", get(list_users))
///     .layer(middleware::from_fn_with_state(state.clone(), require_role("admin")));
/// ```
pub fn require_role<S: Clone + Send + Sync + 'static>(
    role: &str,
) -> impl Fn(State<S>, Request<Body>, Next) -> BoxFuture<'static, Response> + Clone + Send + 'static {
    let role = role.to_string();
    move |state, req, next| {
        let roles = vec![role.clone()];
        Box::pin(async move { require_roles(state, req, next, roles).await })
    }
}

/// Middleware factory requiring any of several roles
pub fn require_any_role<S: Clone + Send + Sync + 'static>(
    roles: &[&str],
) -> impl Fn(State<S>, Request<Body>, Next) -> BoxFuture<'static, Response> + Clone + Send + 'static {
    let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
    move |state, req, next| {
        let roles = roles.clone();
        Box::pin(async move { require_roles(state, req, next, roles).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::Role;
    use axum::{body::to_bytes, middleware, routing::get, Router};
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    fn session(role: Role) -> Session {
        let now = Utc::now();
        Session {
            session_id: "sid-1".to_string(),
            email: "ana@example.com".to_string(),
            role,
            issued_at: now,
            expires_at: now + Duration::minutes(30),
        }
    }

    fn app(session: Option<Session>, guard: &[&str]) -> Router {
        let router = Router::new()
            .route("/guarded", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state((), require_any_role::<()>(guard)));

        match session {
            Some(session) => router.layer(middleware::from_fn(move |mut req: Request<Body>, next: Next| {
                let session = session.clone();
                async move {
                    req.extensions_mut().insert(session);
                    next.run(req).await
                }
            })),
            None => router,
        }
    }

    fn request() -> Request<Body> {
        Request::builder().uri("/guarded").body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_matching_role_passes() {
        let response = app(Some(session(Role::Admin)), &["admin"]).oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_any_of_several_roles() {
        let response = app(Some(session(Role::User)), &["admin", "user"]).oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_role_is_forbidden() {
        let response = app(Some(session(Role::User)), &["admin"]).oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "forbidden");
        assert_eq!(json["required_roles"][0], "admin");
    }

    #[tokio::test]
    async fn test_missing_session_is_unauthorized() {
        let response = app(None, &["admin"]).oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
