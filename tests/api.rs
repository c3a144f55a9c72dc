//! End-to-end HTTP tests over the in-memory store.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use user_admin::{app_router, AppConfig, AppState};

fn app() -> Router {
    let config = AppConfig::from_lookup(|_| None).unwrap();
    app_router(AppState::in_memory(), &config)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, header::HeaderMap, Vec<u8>) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let res = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, headers, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn lists_are_empty_on_a_fresh_store() {
    let app = app();
    for uri in ["/api/user", "/api/user/role", "/api/user/privilege"] {
        let (status, body) = send_json(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body["data"], json!([]));
        assert_eq!(body["meta"]["count"], 0);
    }
}

#[tokio::test]
async fn create_then_partially_update_alice() {
    let app = app();
    let (status, headers, bytes) = send(
        &app,
        Method::POST,
        "/api/user",
        Some(json!({ "userName": "alice", "password": "secret", "email": "a@x.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_slice(&bytes).unwrap();
    let user = &created["data"];
    let id = user["id"].as_i64().unwrap();
    assert_eq!(headers[header::LOCATION], format!("/api/user/{}", id).as_str());
    assert_ne!(user["password"], "secret");
    assert!(user["createdDate"].is_string());

    let (status, updated) = send_json(
        &app,
        Method::PUT,
        &format!("/api/user/{}", id),
        Some(json!({ "id": 12345, "firstName": "Ann", "userName": "mallory", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["id"], id);

    let (status, fetched) = send_json(&app, Method::GET, &format!("/api/user/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let fetched = &fetched["data"];
    assert_eq!(fetched["firstName"], "Ann");
    assert_eq!(fetched["userName"], "alice");
    assert_eq!(fetched["password"], user["password"]);
    assert_eq!(fetched["createdDate"], user["createdDate"]);
}

#[tokio::test]
async fn created_role_is_listed_exactly_once() {
    let app = app();
    let (status, headers, _) = send(&app, Method::POST, "/api/user/role", Some(json!({ "roleName": "ADMIN" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(headers[header::LOCATION], "/api/user/role");

    let (_, roles) = send_json(&app, Method::GET, "/api/user/role", None).await;
    let admins = roles["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["roleName"] == "ADMIN")
        .count();
    assert_eq!(admins, 1);
}

#[tokio::test]
async fn duplicate_role_name_is_a_conflict() {
    let app = app();
    send(&app, Method::POST, "/api/user/role", Some(json!({ "roleName": "ADMIN" }))).await;
    let (status, body) = send_json(&app, Method::POST, "/api/user/role", Some(json!({ "roleName": "ADMIN" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn user_carries_roles_and_privileges() {
    let app = app();
    let (_, privilege) = send_json(
        &app,
        Method::POST,
        "/api/user/privilege",
        Some(json!({ "privilegeType": "READ" })),
    )
    .await;
    let privilege_id = privilege["data"]["id"].as_i64().unwrap();
    let (_, role) = send_json(
        &app,
        Method::POST,
        "/api/user/role",
        Some(json!({ "roleName": "VIEWER", "privileges": [{ "id": privilege_id }] })),
    )
    .await;
    let role_id = role["data"]["id"].as_i64().unwrap();
    assert_eq!(role["data"]["privileges"][0]["privilegeType"], "READ");

    let (status, user) = send_json(
        &app,
        Method::POST,
        "/api/user",
        Some(json!({ "userName": "bob", "password": "pw", "roles": [{ "id": role_id }] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["data"]["roles"][0]["roleName"], "VIEWER");
    assert_eq!(user["data"]["roles"][0]["privileges"][0]["privilegeType"], "READ");
}

#[tokio::test]
async fn unsaved_role_reference_is_a_bad_request() {
    let app = app();
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/user",
        Some(json!({ "userName": "bob", "password": "pw", "roles": [{ "roleName": "NEW" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn missing_user_is_not_found_for_get_and_update() {
    let app = app();
    let (status, body) = send_json(&app, Method::GET, "/api/user/41", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, _) = send_json(&app, Method::PUT, "/api/user/41", Some(json!({ "firstName": "Ann" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_reports_success_even_for_unknown_ids() {
    let app = app();
    let (status, headers, bytes) = send(&app, Method::DELETE, "/api/user/999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));
    assert_eq!(bytes, b"User successfully deleted!");

    let (_, created) = send_json(
        &app,
        Method::POST,
        "/api/user",
        Some(json!({ "userName": "carol", "password": "pw" })),
    )
    .await;
    let id = created["data"]["id"].as_i64().unwrap();
    let (status, _, _) = send(&app, Method::DELETE, &format!("/api/user/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send_json(&app, Method::GET, &format!("/api/user/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = app();
    let (status, doc) = send_json(&app, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "User Admin API");
    assert!(doc["paths"]["/api/user/{id}"]["put"].is_object());
    assert_eq!(doc["servers"][0]["url"], "http://localhost:3000");
}

#[tokio::test]
async fn readiness_reports_memory_backend() {
    let app = app();
    let (status, body) = send_json(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "memory");
}
