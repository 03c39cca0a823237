//! Shared fixtures: an app wired to the in-memory store, seeded accounts,
//! and request plumbing for driving the router with `tower::oneshot`.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE};
use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use hoamai_server::auth::hash_password;
use hoamai_server::config::SessionKeys;
use hoamai_server::models::{AdminAccount, AdminRole, ParentAccount, TeacherAccount};
use hoamai_server::routes;
use hoamai_server::state::AppState;
use hoamai_server::store::{ContentStore, MemStore};

pub fn test_keys() -> SessionKeys {
    SessionKeys {
        admin: vec![1u8; 32],
        parent: vec![2u8; 32],
        teacher: vec![3u8; 32],
    }
}

pub fn test_state() -> (Arc<MemStore>, AppState) {
    let store = Arc::new(MemStore::new());
    let state = AppState::new(store.clone(), &test_keys(), false).expect("state");
    (store, state)
}

pub fn test_app() -> (Arc<MemStore>, AppState, Router) {
    let (store, state) = test_state();
    let app = routes::app(state.clone());
    (store, state, app)
}

pub async fn seed_admin(store: &MemStore, email: &str, password: &str) -> AdminAccount {
    let admin = AdminAccount {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: hash_password(password).expect("hash"),
        name: "Ngọc Lan".to_string(),
        role: AdminRole::Admin,
        is_active: true,
        last_login_at: None,
        created_at: Utc::now(),
    };
    store.create_admin(&admin).await.expect("seed admin");
    admin
}

pub async fn seed_parent(store: &MemStore, email: &str, password: &str) -> ParentAccount {
    let parent = ParentAccount {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: hash_password(password).expect("hash"),
        first_name: "Minh".to_string(),
        last_name: "Trần".to_string(),
        is_active: true,
        created_at: Utc::now(),
    };
    store.create_parent(&parent).await.expect("seed parent");
    parent
}

pub async fn seed_teacher(
    store: &MemStore,
    email: &str,
    password: &str,
    active: bool,
) -> TeacherAccount {
    let teacher = TeacherAccount {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: hash_password(password).expect("hash"),
        first_name: "Hương".to_string(),
        last_name: "Phạm".to_string(),
        is_active: active,
        created_at: Utc::now(),
    };
    store.create_teacher(&teacher).await.expect("seed teacher");
    teacher
}

/// Strips the attributes off a `Set-Cookie` header so it can be replayed as
/// a request `Cookie` header.
pub fn cookie_of(set_cookie: &HeaderValue) -> String {
    set_cookie
        .to_str()
        .expect("cookie is ascii")
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn send_json(method: &str, uri: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn post_json(uri: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    send_json("POST", uri, body, cookie)
}

/// Runs one request and returns status, headers, and the parsed JSON body
/// (null for empty or non-JSON bodies).
pub async fn call(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(req).await.expect("infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = hyper::body::to_bytes(response.into_body())
        .await
        .expect("body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

/// Logs in through the router and returns the replayable session cookie.
pub async fn login_cookie(app: &Router, login_uri: &str, email: &str, password: &str) -> String {
    let (status, headers, body) = call(
        app,
        post_json(
            login_uri,
            &serde_json::json!({ "email": email, "password": password }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    cookie_of(headers.get("set-cookie").expect("set-cookie on login"))
}
