//! HTTP round trips through the full router: auth middleware, login,
//! token rotation and a couple of resource routes.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use console_server::db::models::{MenuCreate, PermissionCreate, RoleCreate, UserCreate};
use console_server::db::repository::{menu, permission, role, user};
use console_server::{Config, Server, ServerState};

async fn test_state() -> ServerState {
    let config = Config {
        db_path: ":memory:".to_string(),
        ..Config::from_env()
    };
    ServerState::initialize(&config).await.unwrap()
}

async fn seed_admin(state: &ServerState) -> i64 {
    let read = permission::create(
        state.pool(),
        PermissionCreate {
            name: "users.read".to_string(),
        },
    )
    .await
    .unwrap();
    let admin = role::create(
        state.pool(),
        RoleCreate {
            name: "admin".to_string(),
            permission_ids: vec![read.id],
        },
    )
    .await
    .unwrap();
    menu::create(
        state.pool(),
        MenuCreate {
            name: "Users".to_string(),
            icon: "user".to_string(),
            path: Some("/users".to_string()),
            sort: 1,
            parent_id: None,
            permission_ids: vec![read.id],
        },
    )
    .await
    .unwrap();
    user::create(
        state.pool(),
        UserCreate {
            email: "admin@example.com".to_string(),
            username: "admin".to_string(),
            password: Some("hunter22".to_string()),
            role_ids: vec![admin.role.id],
        },
    )
    .await
    .unwrap()
    .user
    .id
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> Value {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "username": username, "password": password }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

#[tokio::test]
async fn health_is_reachable_without_a_token() {
    let state = test_state().await;
    let app = Server::router(state);

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_routes_require_authentication() {
    let state = test_state().await;
    let app = Server::router(state);

    let response = app.oneshot(get("/api/users", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["code"], "E3001");
}

#[tokio::test]
async fn login_rejects_bad_credentials_uniformly() {
    let state = test_state().await;
    seed_admin(&state).await;
    let app = Server::router(state);

    // wrong password and unknown user read identically
    for (username, password) in [("admin", "wrong"), ("nobody", "hunter22")] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/auth/login",
                json!({ "username": username, "password": password }),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Invalid username or password");
    }
}

#[tokio::test]
async fn login_then_fetch_profile_and_navigation() {
    let state = test_state().await;
    seed_admin(&state).await;
    let app = Server::router(state);

    let tokens = login(&app, "admin", "hunter22").await;
    let access = tokens["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(get("/api/auth/user", Some(access)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["username"], "admin");
    assert!(profile.get("password").is_none());
    assert_eq!(profile["roles"][0]["name"], "admin");

    let response = app
        .clone()
        .oneshot(get("/api/menus/tree", Some(access)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let tree = body_json(response).await;
    assert_eq!(tree[0]["group"][0]["title"], "Users");
}

#[tokio::test]
async fn refresh_rotates_and_invalidates_the_old_token() {
    let state = test_state().await;
    seed_admin(&state).await;
    let app = Server::router(state);

    let tokens = login(&app, "admin", "hunter22").await;
    let refresh = tokens["refresh_token"].as_str().unwrap();
    let access = tokens["access_token"].as_str().unwrap();

    // an access token is not accepted on the refresh route
    let response = app
        .clone()
        .oneshot(get("/api/auth/refresh", Some(access)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get("/api/auth/refresh", Some(refresh)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert!(rotated["access_token"].as_str().is_some());

    // the consumed refresh token no longer matches the stored hash
    let response = app
        .clone()
        .oneshot(get("/api/auth/refresh", Some(refresh)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_the_refresh_token() {
    let state = test_state().await;
    seed_admin(&state).await;
    let app = Server::router(state);

    let tokens = login(&app, "admin", "hunter22").await;
    let access = tokens["access_token"].as_str().unwrap();
    let refresh = tokens["refresh_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(get("/api/auth/logout", Some(access)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/api/auth/refresh", Some(refresh)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn crud_round_trip_over_http() {
    let state = test_state().await;
    seed_admin(&state).await;
    let app = Server::router(state);

    let tokens = login(&app, "admin", "hunter22").await;
    let access = tokens["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/permissions",
            json!({ "name": "orders.read" }),
            Some(access),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();

    // duplicate create surfaces the conflict envelope
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/permissions",
            json!({ "name": "orders.read" }),
            Some(access),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["code"], "E0004");

    let response = app
        .clone()
        .oneshot(get(&format!("/api/permissions/{id}"), Some(access)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["name"], "orders.read");

    // a grant by name through the role route
    let roles = app
        .clone()
        .oneshot(get("/api/roles", Some(access)))
        .await
        .unwrap();
    let roles = body_json(roles).await;
    let role_id = roles[0]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/roles/{role_id}/permissions/orders.read"),
            json!({}),
            Some(access),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["permissions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn validation_errors_use_the_envelope() {
    let state = test_state().await;
    seed_admin(&state).await;
    let app = Server::router(state);

    let tokens = login(&app, "admin", "hunter22").await;
    let access = tokens["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users",
            json!({ "email": "not-an-email", "username": "bob" }),
            Some(access),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "E0002");
}
