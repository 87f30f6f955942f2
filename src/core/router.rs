use axum::{http::StatusCode, middleware::from_fn_with_state, routing::get, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::core::config::Environment;
use crate::core::middleware;
use crate::features::auth::routes as auth_routes;
use crate::features::auth::{AuthService, JwtValidator};
use crate::features::reports::{routes as reports_routes, ReportService};
use crate::features::uploads::{routes as uploads_routes, UploadService};
use crate::shared::constants::UPLOADS_PATH;

/// Everything the HTTP layer needs, already wired
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub report_service: Arc<ReportService>,
    pub upload_service: Arc<UploadService>,
    pub jwt_validator: Arc<JwtValidator>,
    pub upload_dir: PathBuf,
    pub environment: Environment,
    pub cors_allowed_origins: Vec<String>,
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Build the application router (without Swagger UI)
pub fn build_router(state: AppState) -> Router {
    // Protected routes (require JWT authentication)
    let protected_routes = Router::new()
        .merge(auth_routes::protected_routes(Arc::clone(&state.auth_service)))
        .merge(reports_routes::routes(state.report_service))
        .merge(uploads_routes::routes(state.upload_service))
        .route_layer(from_fn_with_state(
            state.jwt_validator,
            middleware::auth_middleware,
        ));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .merge(auth_routes::public_routes(state.auth_service))
        .route("/health", get(health_check))
        .nest_service(UPLOADS_PATH, ServeDir::new(state.upload_dir));

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .layer(from_fn_with_state(
            state.environment,
            middleware::expose_error_detail,
        ))
        .layer(middleware::cors_layer(&state.cors_allowed_origins))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::TestApp;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::{json, Value};

    fn report_body(title: &str) -> Value {
        json!({
            "title": title,
            "description": "Loose manhole cover on the bike lane",
            "location": "Jl. Diponegoro 5",
            "type": "hazard",
            "locationDetails": { "city": "Bandung", "postalCode": "40115" }
        })
    }

    #[tokio::test]
    async fn test_health_and_request_id() {
        let app = TestApp::new().await;

        let response = app.server.get("/health").await;
        response.assert_status_ok();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_register_login_and_me() {
        let app = TestApp::new().await;

        let response = app
            .server
            .post("/api/auth/register")
            .json(&json!({
                "name": "Sari",
                "email": "sari@example.com",
                "password": "secret123"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["user"]["role"], "user");
        assert!(body["data"]["user"].get("passwordHash").is_none());

        let response = app
            .server
            .post("/api/auth/login")
            .json(&json!({ "email": "SARI@example.com", "password": "secret123" }))
            .await;
        response.assert_status_ok();
        let token = response.json::<Value>()["data"]["accessToken"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .server
            .get("/api/auth/me")
            .add_header(
                axum::http::header::AUTHORIZATION,
                TestApp::bearer(&token),
            )
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["data"]["email"], "sari@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_bad_request() {
        let app = TestApp::new().await;
        let body = json!({
            "name": "Budi",
            "email": "budi@example.com",
            "password": "secret123"
        });

        app.server
            .post("/api/auth/register")
            .json(&body)
            .await
            .assert_status(StatusCode::CREATED);

        let response = app.server.post("/api/auth/register").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["success"], false);
        assert_eq!(app.users.len(), 1);
    }

    #[tokio::test]
    async fn test_reports_require_token() {
        let app = TestApp::new().await;

        app.server
            .get("/api/reports")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        app.server
            .get("/api/reports")
            .add_header(
                axum::http::header::AUTHORIZATION,
                TestApp::bearer("not-a-token"),
            )
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_report_validation() {
        let app = TestApp::new().await;
        let (_, token) = app.user("warga@example.com").await;

        let response = app
            .server
            .post("/api/reports")
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&token))
            .json(&json!({ "location": "Somewhere" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["success"], false);
        assert_eq!(app.reports.len(), 0);
    }

    #[tokio::test]
    async fn test_report_lifecycle() {
        let app = TestApp::new().await;
        let (owner_id, owner) = app.user("owner@example.com").await;
        let (_, stranger) = app.user("stranger@example.com").await;
        let (admin_id, admin) = app.admin("admin@example.com").await;

        let response = app
            .server
            .post("/api/reports")
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&owner))
            .json(&report_body("Open manhole"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: Value = response.json();
        let id = created["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(created["data"]["userId"], owner_id.to_string());
        assert_eq!(created["data"]["status"], "pending");
        assert_eq!(created["data"]["locationDetails"]["postalCode"], "40115");

        app.server
            .get(&format!("/api/reports/{}", id))
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&stranger))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        app.server
            .put(&format!("/api/reports/{}", id))
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&owner))
            .json(&json!({ "status": "resolved" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        app.server
            .put(&format!("/api/reports/{}/verify", id))
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&owner))
            .json(&json!({ "status": "approved" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let response = app
            .server
            .put(&format!("/api/reports/{}/verify", id))
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&admin))
            .json(&json!({ "status": "approved", "comment": "Crew notified" }))
            .await;
        response.assert_status_ok();
        let verified: Value = response.json();
        assert_eq!(verified["data"]["status"], "verified");
        assert_eq!(verified["data"]["verificationStatus"], "approved");
        assert_eq!(verified["data"]["verifiedBy"], admin_id.to_string());
        assert_eq!(verified["data"]["adminComments"], "Crew notified");
        assert_eq!(
            verified["data"]["verificationHistory"]
                .as_array()
                .unwrap()
                .len(),
            1
        );

        app.server
            .delete(&format!("/api/reports/{}", id))
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&owner))
            .await
            .assert_status_ok();

        app.server
            .get(&format!("/api/reports/{}", id))
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&admin))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_verify_rejects_unknown_decision() {
        let app = TestApp::new().await;
        let (_, owner) = app.user("owner@example.com").await;
        let (_, admin) = app.admin("admin@example.com").await;

        let created: Value = app
            .server
            .post("/api/reports")
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&owner))
            .json(&report_body("Fallen sign"))
            .await
            .json();
        let id = created["data"]["id"].as_str().unwrap().to_string();

        app.server
            .put(&format!("/api/reports/{}/verify", id))
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&admin))
            .json(&json!({ "status": "pending" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_pagination_and_select() {
        let app = TestApp::new().await;
        let (_, owner) = app.user("owner@example.com").await;
        let (_, other) = app.user("other@example.com").await;

        for i in 0..15 {
            app.server
                .post("/api/reports")
                .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&owner))
                .json(&report_body(&format!("Report {}", i)))
                .await
                .assert_status(StatusCode::CREATED);
        }
        app.server
            .post("/api/reports")
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&other))
            .json(&report_body("Someone else's"))
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .server
            .get("/api/reports?page=2&limit=10&select=title,status")
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&owner))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();

        let items = body["data"].as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(body["meta"]["total"], 15);
        assert_eq!(body["meta"]["count"], 5);
        assert!(body["meta"]["pagination"].get("next").is_none());
        assert_eq!(body["meta"]["pagination"]["prev"]["page"], 1);

        let keys: Vec<&String> = items[0].as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert!(items[0].get("description").is_none());
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_filter() {
        let app = TestApp::new().await;
        let (_, owner) = app.user("owner@example.com").await;

        let response = app
            .server
            .get("/api/reports?secret[gt]=1")
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&owner))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_far_past_last_page_is_empty() {
        let app = TestApp::new().await;
        let (_, owner) = app.user("owner@example.com").await;

        app.server
            .post("/api/reports")
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&owner))
            .json(&report_body("Only one"))
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .server
            .get("/api/reports?page=9223372036854775807&limit=10")
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&owner))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
        assert_eq!(body["meta"]["total"], 1);
        assert!(body["meta"]["pagination"].get("next").is_none());
    }

    #[tokio::test]
    async fn test_malformed_report_id_uses_envelope() {
        let app = TestApp::new().await;
        let (_, owner) = app.user("owner@example.com").await;

        let response = app
            .server
            .get("/api/reports/not-a-uuid")
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&owner))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_upload_image_and_serve_it() {
        let app = TestApp::new().await;
        let (_, token) = app.user("uploader@example.com").await;

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"\x89PNG fake image".to_vec())
                .file_name("photo.png")
                .mime_type("image/png"),
        );
        let response = app
            .server
            .post("/api/upload")
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&token))
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        let filename = body["data"]["filename"].as_str().unwrap();
        assert!(body["data"]["url"]
            .as_str()
            .unwrap()
            .ends_with(&format!("/uploads/{}", filename)));

        let served = app.server.get(&format!("/uploads/{}", filename)).await;
        served.assert_status_ok();
        assert_eq!(served.as_bytes().as_ref(), b"\x89PNG fake image");
    }

    #[tokio::test]
    async fn test_upload_rejects_other_types() {
        let app = TestApp::new().await;
        let (_, token) = app.user("uploader@example.com").await;

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"GIF89a".to_vec())
                .file_name("anim.gif")
                .mime_type("image/gif"),
        );
        app.server
            .post("/api/upload")
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&token))
            .multipart(form)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        app.server
            .post("/api/upload")
            .add_header(axum::http::header::AUTHORIZATION, TestApp::bearer(&token))
            .multipart(MultipartForm::new().add_text("note", "no file here"))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
