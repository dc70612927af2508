// HTTP scenario tests for the auth API
// Runs the full router (logger, policy check, validation, error mapping) over the in-memory store

use super::*;
use auth::memory::MemoryCredentialStore;
use auth::models::SEEDED_ROLES;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};

// ============================================================================
// Test Helpers
// ============================================================================

/// Helper function to create a test app over a fresh seeded store
fn create_test_app() -> (TestServer, Arc<MemoryCredentialStore>) {
    let store = Arc::new(MemoryCredentialStore::seeded());
    let state = AppState::new(store.clone(), &test_jwt());

    (TestServer::new(create_router(state)).unwrap(), store)
}

fn test_jwt() -> JwtConfig {
    JwtConfig {
        key: "test_secret_key_for_testing_purposes".to_string(),
        expiry_minutes: 60,
    }
}

fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

fn credentials(username: &str, password: &str) -> Value {
    json!({ "username": username, "password": password })
}

/// Register a user and return its id
async fn register(server: &TestServer, username: &str) -> String {
    let body: Value = server
        .post("/api/auth/register")
        .json(&credentials(username, "secret1234"))
        .await
        .json();
    assert_eq!(body["isSuccess"], true, "registration failed: {}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}

/// Log a user in and return the token
async fn login(server: &TestServer, username: &str) -> String {
    let body: Value = server
        .post("/api/auth/login")
        .json(&credentials(username, "secret1234"))
        .await
        .json();
    assert_eq!(body["isSuccess"], true, "login failed: {}", body);
    body["data"].as_str().unwrap().to_string()
}

/// Assert an HTTP 200 failure envelope with the given code
fn assert_failure(response: &TestResponse, code: u64) -> Value {
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["isSuccess"], false);
    assert_eq!(body["code"], code);
    assert!(body["data"].is_null());
    assert!(body["serverDateTime"].is_string());
    body
}

// ============================================================================
// Register / Login
// ============================================================================

#[tokio::test]
async fn test_register_pascal_case_body_then_duplicate() {
    let (server, _) = create_test_app();
    let payload = json!({ "Username": "alice", "Password": "secret1234" });

    let response = server.post("/api/auth/register").json(&payload).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["isSuccess"], true);
    assert_eq!(body["message"], "Success.");
    assert!(body["data"]["id"].is_string());
    assert_eq!(body["data"]["username"], "alice");
    assert!(body["data"].get("passwordHash").is_none());

    let response = server.post("/api/auth/register").json(&payload).await;
    let body = assert_failure(&response, 801);
    assert_eq!(body["message"], "User already exists.");
}

#[tokio::test]
async fn test_register_field_validation() {
    let (server, store) = create_test_app();

    let response = server
        .post("/api/auth/register")
        .json(&credentials(&"a".repeat(21), "secret1234"))
        .await;

    let body = assert_failure(&response, 400);
    assert_eq!(body["message"], "Request body are invalid");
    assert!(body["exceptionMessage"]["username"].is_array());
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_validation_failure() {
    let (server, _) = create_test_app();

    let response = server
        .post("/api/auth/register")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    let body = assert_failure(&response, 400);
    assert!(body["exceptionMessage"]["body"].is_array());
}

#[tokio::test]
async fn test_login_success_returns_token() {
    let (server, _) = create_test_app();
    register(&server, "alice").await;

    let token = login(&server, "alice").await;
    assert_eq!(token.split('.').count(), 3);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (server, _) = create_test_app();
    register(&server, "alice").await;

    let response = server
        .post("/api/auth/login")
        .json(&credentials("alice", "wrong-password"))
        .await;

    let body = assert_failure(&response, 801);
    assert_eq!(body["message"], "Username or password is incorrect.");
}

#[tokio::test]
async fn test_login_unknown_user_matches_wrong_password() {
    let (server, _) = create_test_app();

    let response = server
        .post("/api/auth/login")
        .json(&credentials("nobody", "secret1234"))
        .await;

    let body = assert_failure(&response, 801);
    assert_eq!(body["message"], "Username or password is incorrect.");
}

// ============================================================================
// Renew
// ============================================================================

#[tokio::test]
async fn test_renew_with_valid_token() {
    let (server, _) = create_test_app();
    register(&server, "alice").await;
    let token = login(&server, "alice").await;

    let (name, value) = bearer(&token);
    let response = server.post("/api/auth/renew").add_header(name, value).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["isSuccess"], true);
    assert!(body["data"].is_string());
}

#[tokio::test]
async fn test_renew_without_token_is_401() {
    let (server, _) = create_test_app();

    let response = server.post("/api/auth/renew").expect_failure().await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["isSuccess"], false);
    assert_eq!(body["code"], 401);
}

#[tokio::test]
async fn test_renew_with_garbage_token_is_401() {
    let (server, _) = create_test_app();

    let (name, value) = bearer("not.a.token");
    let response = server
        .post("/api/auth/renew")
        .add_header(name, value)
        .expect_failure()
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Roles
// ============================================================================

#[tokio::test]
async fn test_get_roles_is_cacheable_and_seeded() {
    let (server, _) = create_test_app();

    let response = server.get("/api/auth/role").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header(header::CACHE_CONTROL), "public, max-age=60");
    let body: Value = response.json();
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["roleName"].as_str().unwrap())
        .collect();
    for (_, seeded) in SEEDED_ROLES {
        assert!(names.contains(&seeded), "missing seeded role {}", seeded);
    }
}

#[tokio::test]
async fn test_add_role_requires_bearer() {
    let (server, store) = create_test_app();

    let response = server
        .post("/api/auth/role/add")
        .json(&json!({ "roleName": "Cashier" }))
        .expect_failure()
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_add_role_capitalization() {
    let (server, _) = create_test_app();
    let user_id = register(&server, "alice").await;
    let token = login(&server, "alice").await;

    let (name, value) = bearer(&token);
    let response = server
        .post("/api/auth/role/add")
        .add_header(name, value)
        .json(&json!({ "roleName": "admin" }))
        .await;
    let body = assert_failure(&response, 400);
    assert!(body["exceptionMessage"]["roleName"].is_array());

    let (name, value) = bearer(&token);
    let response = server
        .post("/api/auth/role/add")
        .add_header(name, value)
        .json(&json!({ "RoleName": "Cashier" }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["isSuccess"], true);
    assert_eq!(body["data"]["roleName"], "Cashier");
    assert_eq!(body["data"]["createdByUserId"], user_id.as_str());
}

#[tokio::test]
async fn test_update_role_argument_failures() {
    let (server, _) = create_test_app();
    register(&server, "alice").await;
    let token = login(&server, "alice").await;
    let role = json!({ "roleName": "Barista" });

    let (name, value) = bearer(&token);
    let response = server
        .put("/api/auth/role/update")
        .add_header(name, value)
        .json(&role)
        .await;
    let body = assert_failure(&response, 400);
    assert_eq!(body["message"], "Missing required parameter.");

    let (name, value) = bearer(&token);
    let response = server
        .put("/api/auth/role/update")
        .add_query_param("id", "abc")
        .add_header(name, value)
        .json(&role)
        .await;
    assert_failure(&response, 803);

    let (name, value) = bearer(&token);
    let response = server
        .put("/api/auth/role/update")
        .add_query_param("id", uuid::Uuid::new_v4())
        .add_header(name, value)
        .json(&role)
        .await;
    let body = assert_failure(&response, 804);
    assert_eq!(body["message"], "Object [Role] is not found.");
}

#[tokio::test]
async fn test_update_then_delete_role() {
    let (server, _) = create_test_app();
    register(&server, "alice").await;
    let token = login(&server, "alice").await;

    let (name, value) = bearer(&token);
    let created: Value = server
        .post("/api/auth/role/add")
        .add_header(name, value)
        .json(&json!({ "roleName": "Cashier" }))
        .await
        .json();
    let role_id = created["data"]["id"].as_str().unwrap().to_string();

    let (name, value) = bearer(&token);
    let updated: Value = server
        .put("/api/auth/role/update")
        .add_query_param("id", &role_id)
        .add_header(name, value)
        .json(&json!({ "roleName": "Barista" }))
        .await
        .json();
    assert_eq!(updated["data"]["roleName"], "Barista");

    let (name, value) = bearer(&token);
    let deleted: Value = server
        .delete("/api/auth/role/delete")
        .add_query_param("id", &role_id)
        .add_header(name, value)
        .await
        .json();
    assert_eq!(deleted["isSuccess"], true);

    let (name, value) = bearer(&token);
    let response = server
        .delete("/api/auth/role/delete")
        .add_query_param("id", &role_id)
        .add_header(name, value)
        .await;
    assert_failure(&response, 804);
}

// ============================================================================
// Role assignment
// ============================================================================

#[tokio::test]
async fn test_assign_role_unknown_role_creates_nothing() {
    let (server, _) = create_test_app();
    let user_id = register(&server, "alice").await;

    let response = server
        .post("/api/auth/assignrole")
        .json(&json!({ "userId": user_id, "roleId": uuid::Uuid::new_v4() }))
        .await;
    let body = assert_failure(&response, 804);
    assert_eq!(body["message"], "Object [Role] is not found.");

    let links: Value = server.get("/api/auth/userroles").await.json();
    assert_eq!(links["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_assign_role_twice_is_conflict() {
    let (server, _) = create_test_app();
    let user_id = register(&server, "alice").await;
    let admin = SEEDED_ROLES[3].0.to_string();
    let payload = json!({ "UserId": user_id, "RoleId": admin });

    let first: Value = server.post("/api/auth/assignrole").json(&payload).await.json();
    assert_eq!(first["isSuccess"], true);
    assert_eq!(first["data"]["userId"], user_id.as_str());

    let response = server.post("/api/auth/assignrole").json(&payload).await;
    assert_failure(&response, 801);

    let links: Value = server.get("/api/auth/userroles").await.json();
    assert_eq!(links["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_assign_role_invalid_guid() {
    let (server, _) = create_test_app();

    let response = server
        .post("/api/auth/assignrole")
        .json(&json!({ "userId": "not-a-guid", "roleId": SEEDED_ROLES[0].0 }))
        .await;

    let body = assert_failure(&response, 803);
    assert_eq!(body["message"], "Object [User] (not-a-guid) guid is not valid.");
}

#[tokio::test]
async fn test_renewed_token_carries_new_role() {
    let (server, _) = create_test_app();
    let user_id = register(&server, "alice").await;
    let token = login(&server, "alice").await;

    server
        .post("/api/auth/assignrole")
        .json(&json!({ "userId": user_id, "roleId": SEEDED_ROLES[3].0 }))
        .await;

    let (name, value) = bearer(&token);
    let renewed: Value = server.post("/api/auth/renew").add_header(name, value).await.json();
    let renewed = renewed["data"].as_str().unwrap();

    let tokens = TokenService::new(&JwtConfig {
        key: "test_secret_key_for_testing_purposes".to_string(),
        expiry_minutes: 60,
    });
    let claims = tokens.verify(renewed).unwrap();
    assert_eq!(claims.role, vec!["Admin".to_string()]);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_get_users_pagination() {
    let (server, _) = create_test_app();
    register(&server, "alice").await;
    register(&server, "bob").await;
    register(&server, "carol").await;

    let response = server
        .get("/api/auth/user")
        .add_query_param("page", 2)
        .add_query_param("recordsPerPage", 2)
        .await;

    assert_eq!(response.header(header::CACHE_CONTROL), "public, max-age=60");
    let body: Value = response.json();
    assert_eq!(body["isSuccess"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["totalAmountRecords"], 3.0);
    assert_eq!(body["totalAmountPages"], 2.0);
    assert_eq!(body["currentPage"], 2.0);
    assert_eq!(body["recordsPerPage"], 2.0);
    assert_eq!(body["pageIndex"], 1);
}

#[tokio::test]
async fn test_get_users_without_paging_omits_pagination_fields() {
    let (server, _) = create_test_app();
    register(&server, "alice").await;

    let body: Value = server.get("/api/auth/user").await.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert!(body.get("totalAmountRecords").is_none());
}

#[tokio::test]
async fn test_get_user_by_id_requires_bearer() {
    let (server, _) = create_test_app();
    let user_id = register(&server, "alice").await;

    let response = server
        .get(&format!("/api/auth/user/{}", user_id))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let token = login(&server, "alice").await;
    let (name, value) = bearer(&token);
    let body: Value = server
        .get(&format!("/api/auth/user/{}", user_id))
        .add_header(name, value)
        .await
        .json();
    assert_eq!(body["data"]["username"], "alice");

    let (name, value) = bearer(&token);
    let response = server
        .get(&format!("/api/auth/user/{}", uuid::Uuid::new_v4()))
        .add_header(name, value)
        .await;
    assert_failure(&response, 804);
}

// ============================================================================
// Health / infrastructure failures
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let (server, store) = create_test_app();

    let live: Value = server.get("/health/live").await.json();
    assert_eq!(live["status"], "Healthy");

    let ready = server.get("/health/ready").await;
    assert_eq!(ready.status_code(), StatusCode::OK);

    store.set_offline(true);
    let ready = server.get("/health/ready").expect_failure().await;
    assert_eq!(ready.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(ready.json::<Value>()["status"], "Unhealthy");

    let live = server.get("/health/live").await;
    assert_eq!(live.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_store_outage_is_503_envelope() {
    let (server, store) = create_test_app();
    store.set_offline(true);

    let response = server.get("/api/auth/role").expect_failure().await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["isSuccess"], false);
    assert_eq!(body["code"], 503);
    assert_eq!(body["message"], "Server's unexpected error. Please contact Administrator.");
}

// ============================================================================
// Request log
// ============================================================================

/// Drive the router directly so every log line lands on this thread's subscriber
async fn send(app: &Router, request: axum::http::Request<axum::body::Body>) -> Value {
    use tower::ServiceExt;

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_post(uri: &str, body: &Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_passwords_and_tokens_kept_out_of_request_log() {
    use crate::logging::test_support::CapturedLogs;

    let logs = CapturedLogs::default();
    let _guard = tracing::subscriber::set_default(logs.subscriber());

    let store = Arc::new(MemoryCredentialStore::seeded());
    let app = create_router(AppState::new(store, &test_jwt()));
    let payload = credentials("alice", "Hunter2Secret");

    let registered = send(&app, json_post("/api/auth/register", &payload)).await;
    assert_eq!(registered["isSuccess"], true);

    let logged_in = send(&app, json_post("/api/auth/login", &payload)).await;
    let token = logged_in["data"].as_str().unwrap().to_string();

    let renew = axum::http::Request::builder()
        .method("POST")
        .uri("/api/auth/renew")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(axum::body::Body::empty())
        .unwrap();
    let renewed = send(&app, renew).await;
    let renewed_token = renewed["data"].as_str().unwrap().to_string();

    let output = logs.contents();
    assert!(output.contains("path=/api/auth/login"));
    assert!(output.contains("path=/api/auth/renew"));
    assert!(output.contains(r#""password":"[redacted]""#));
    assert!(!output.contains("Hunter2Secret"));
    assert!(!output.contains(&token));
    assert!(!output.contains(&renewed_token));
}
