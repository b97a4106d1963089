use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use gluco_screen_api::api::routes::{AdminBootstrap, AppState};
use gluco_screen_api::create_app;
use gluco_screen_domain::auth::local::LocalAuthGateway;
use gluco_screen_domain::classifier::ForestClassifier;

const MODEL_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../models/diabetes_forest.json");
const ADMIN_EMAIL: &str = "root@example.com";
const ADMIN_PASSWORD: &str = "rootpass";

async fn test_app() -> Router {
    std::env::set_var("JWT_SECRET", "api-test-secret");
    std::env::set_var("JWT_ISSUER", "gluco-screen-test");

    let classifier = Arc::new(ForestClassifier::load(MODEL_PATH).unwrap());
    let state = AppState::assemble(
        classifier,
        Arc::new(LocalAuthGateway::new()),
        None,
        Some(AdminBootstrap {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        }),
    )
    .await
    .unwrap();

    create_app(state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, bytes) = send(app, method, uri, token, body).await;
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

async fn register(app: &Router, email: &str, password: &str) -> StatusCode {
    let body = json!({ "email": email, "password": password });
    send_json(app, Method::POST, "/auth/register", None, Some(body)).await.0
}

/// Returns (access_token, refresh_token)
async fn login(app: &Router, email: &str, password: &str) -> (String, String) {
    let body = json!({ "email": email, "password": password });
    let (status, json) = send_json(app, Method::POST, "/auth/login", None, Some(body)).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", json);
    (
        json["access_token"].as_str().unwrap().to_string(),
        json["refresh_token"].as_str().unwrap().to_string(),
    )
}

async fn patient(app: &Router) -> String {
    assert_eq!(register(app, "ana@example.com", "secret1").await, StatusCode::CREATED);
    login(app, "ana@example.com", "secret1").await.0
}

fn questionnaire(glucose: i32) -> Value {
    json!({
        "pregnancies": 0,
        "glucose": glucose,
        "blood_pressure": 80,
        "insulin": 0,
        "weight_kg": 70.0,
        "height_cm": 175.0,
        "age": 30,
        "family_history": "none",
        "symptoms": {}
    })
}

#[tokio::test]
async fn test_health_reports_classifier() {
    let app = test_app().await;
    let (status, json) = send_json(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["components"]["classifier"]["status"], "healthy");
}

#[tokio::test]
async fn test_registration_rules() {
    let app = test_app().await;

    assert_eq!(register(&app, "ana@example.com", "secret1").await, StatusCode::CREATED);
    assert_eq!(register(&app, "ana@example.com", "secret1").await, StatusCode::CONFLICT);
    assert_eq!(register(&app, "not-an-email", "secret1").await, StatusCode::BAD_REQUEST);
    assert_eq!(register(&app, "bo@example.com", "123").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_credentials_and_missing_token() {
    let app = test_app().await;
    register(&app, "ana@example.com", "secret1").await;

    let body = json!({ "email": "ana@example.com", "password": "wrong-password" });
    let (status, json) = send_json(&app, Method::POST, "/auth/login", None, Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "auth_error");

    let (status, _) = send_json(&app, Method::GET, "/api/v1/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_submit_and_history() {
    let app = test_app().await;
    let token = patient(&app).await;

    let (status, normal) =
        send_json(&app, Method::POST, "/api/v1/screenings", Some(&token), Some(questionnaire(95))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(normal["saved"], true);
    assert_eq!(normal["outcome"]["status"], "normal");
    assert_eq!(normal["record"]["result"], "no-risk");
    assert_eq!(normal["record"]["skin_thickness"], 20.0);

    let (_, high) =
        send_json(&app, Method::POST, "/api/v1/screenings", Some(&token), Some(questionnaire(130))).await;
    assert_eq!(high["outcome"]["status"], "high_risk");
    assert_eq!(high["outcome"]["result_label"], "risk");

    let (status, history) = send_json(&app, Method::GET, "/api/v1/screenings/history", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let glucose: Vec<i64> = history.as_array().unwrap().iter().map(|r| r["glucose"].as_i64().unwrap()).collect();
    assert_eq!(glucose, vec![95, 130]);

    let (_, summary) = send_json(&app, Method::GET, "/api/v1/screenings/summary", Some(&token), None).await;
    assert_eq!(summary["count"], 2);
    assert_eq!(summary["risk_count"], 1);
}

#[tokio::test]
async fn test_assess_does_not_persist() {
    let app = test_app().await;
    let token = patient(&app).await;

    let (status, outcome) =
        send_json(&app, Method::POST, "/api/v1/screenings/assess", Some(&token), Some(questionnaire(95))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["bmi_category"], "normal");

    let (_, history) = send_json(&app, Method::GET, "/api/v1/screenings/history", Some(&token), None).await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_questionnaire_suggests_defaults() {
    let app = test_app().await;
    let token = patient(&app).await;

    let (status, json) =
        send_json(&app, Method::POST, "/api/v1/screenings", Some(&token), Some(questionnaire(0))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
    assert!(json["message"].as_str().unwrap().contains("Glucose: 95"));

    let (_, history) = send_json(&app, Method::GET, "/api/v1/screenings/history", Some(&token), None).await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reversed_date_range_is_rejected() {
    let app = test_app().await;
    let token = patient(&app).await;

    let uri = "/api/v1/screenings/history?start_date=2024-06-01&end_date=2024-05-01";
    let (status, _) = send_json(&app, Method::GET, uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = test_app().await;
    let token = patient(&app).await;

    let (status, json) = send_json(&app, Method::GET, "/api/v1/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "forbidden");

    let (admin_token, _) = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (status, users) = send_json(&app, Method::GET, "/api/v1/admin/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(users.as_array().unwrap().iter().any(|u| u["email"] == "ana@example.com"));
}

#[tokio::test]
async fn test_role_change_applies_after_refresh() {
    let app = test_app().await;
    register(&app, "ana@example.com", "secret1").await;
    let (user_token, refresh_token) = login(&app, "ana@example.com", "secret1").await;
    let (admin_token, _) = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, _) = send_json(
        &app,
        Method::PUT,
        "/api/v1/admin/users/ana@example.com/role",
        Some(&admin_token),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The open session keeps its role snapshot
    let (status, _) = send_json(&app, Method::GET, "/api/v1/admin/dashboard", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, renewed) = send_json(
        &app,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renewed["role"], "admin");

    let new_token = renewed["access_token"].as_str().unwrap();
    let (status, _) = send_json(&app, Method::GET, "/api/v1/admin/dashboard", Some(new_token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_csv_export() {
    let app = test_app().await;
    let token = patient(&app).await;
    send_json(&app, Method::POST, "/api/v1/screenings", Some(&token), Some(questionnaire(130))).await;
    send_json(&app, Method::POST, "/api/v1/screenings", Some(&token), Some(questionnaire(95))).await;

    let (admin_token, _) = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (status, headers, body) = send(
        &app,
        Method::GET,
        "/api/v1/admin/results/export?status=high_risk",
        Some(&admin_token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment; filename=\"report_high_risk.csv\"");
    assert!(body.starts_with(b"\xEF\xBB\xBF"));

    let text = String::from_utf8(body[3..].to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("status,patient_name,result,glucose"));
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("high_risk,"));
}

#[tokio::test]
async fn test_admin_delete_rules() {
    let app = test_app().await;
    register(&app, "ana@example.com", "secret1").await;
    let (admin_token, _) = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, _) =
        send_json(&app, Method::DELETE, "/api/v1/admin/users/root@example.com", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        send_json(&app, Method::DELETE, "/api/v1/admin/users/ana@example.com", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let body = json!({ "email": "ana@example.com", "password": "secret1" });
    let (status, _) = send_json(&app, Method::POST, "/auth/login", None, Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        send_json(&app, Method::DELETE, "/api/v1/admin/users/ghost@example.com", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = test_app().await;
    let token = patient(&app).await;

    let (status, session) = send_json(&app, Method::GET, "/auth/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["role"], "user");

    let (status, _) = send_json(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(&app, Method::GET, "/api/v1/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update() {
    let app = test_app().await;
    let token = patient(&app).await;

    let update = json!({ "name": "Ana", "lastname": "Lima", "blood_type": "O" });
    let (status, profile) = send_json(&app, Method::PUT, "/api/v1/profile", Some(&token), Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Ana");
    assert_eq!(profile["role"], "user");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = test_app().await;
    let (status, json) = send_json(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/api/v1/screenings"].is_object());
}
