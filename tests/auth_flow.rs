//! Login, logout, and session behavior across the three portals.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;
use hoamai_server::store::CredentialStore;

#[tokio::test]
async fn login_then_current_session_returns_the_account() {
    let (store, state) = test_state();
    let parent = seed_parent(&store, "me@example.com", "mat-khau-1").await;

    let set_cookie = state
        .parent_auth
        .login("me@example.com", "mat-khau-1")
        .await
        .expect("login");
    let cookie = cookie_of(&set_cookie);

    let session = state
        .parent_auth
        .current_session(Some(&cookie))
        .expect("session");
    assert!(session.is_logged_in);
    assert_eq!(session.parent_id, Some(parent.id));
    assert_eq!(session.email, "me@example.com");
}

#[tokio::test]
async fn inactive_account_is_rejected_even_with_correct_password() {
    let (store, state) = test_state();
    seed_teacher(&store, "gv@example.com", "mat-khau-1", false).await;

    let err = state
        .teacher_auth
        .login("gv@example.com", "mat-khau-1")
        .await
        .expect_err("must fail");
    assert!(matches!(
        err,
        hoamai_server::err::Error::AccountDisabled
    ));
}

#[tokio::test]
async fn unknown_email_and_wrong_password_are_indistinguishable() {
    let (store, _, app) = test_app();
    seed_parent(&store, "known@example.com", "dung-roi-1").await;

    let (status_a, _, body_a) = call(
        &app,
        post_json(
            "/parent/api/login",
            &json!({ "email": "unknown@example.com", "password": "whatever1" }),
            None,
        ),
    )
    .await;
    let (status_b, _, body_b) = call(
        &app,
        post_json(
            "/parent/api/login",
            &json!({ "email": "known@example.com", "password": "sai-mat-khau" }),
            None,
        ),
    )
    .await;

    assert_eq!(status_a, StatusCode::UNAUTHORIZED);
    assert_eq!(status_a, status_b);
    assert_eq!(body_a, body_b);
    assert_eq!(body_a["success"], json!(false));
}

#[tokio::test]
async fn logout_clears_the_session() {
    let (store, _, app) = test_app();
    seed_parent(&store, "me@example.com", "mat-khau-1").await;
    let cookie = login_cookie(&app, "/parent/api/login", "me@example.com", "mat-khau-1").await;

    let (status, _, _) = call(&app, get("/parent", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, headers, _) = call(&app, post_json("/parent/api/logout", &json!({}), Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    let cleared = headers.get("set-cookie").expect("clearing cookie");
    assert!(cleared.to_str().unwrap().contains("Max-Age=0"));

    // Replaying what the browser would keep after the clear yields no session.
    let cleared_pair = cookie_of(cleared);
    let (status, headers, _) = call(&app, get("/parent", Some(&cleared_pair))).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get("location").unwrap(), "/parent/login");
}

#[tokio::test]
async fn admin_login_stamps_last_login() {
    let (store, state) = test_state();
    let admin = seed_admin(&store, "qt@example.com", "mat-khau-1").await;
    assert!(admin.last_login_at.is_none());

    state
        .admin_auth
        .login("qt@example.com", "mat-khau-1")
        .await
        .expect("login");

    let stored: hoamai_server::models::AdminAccount =
        CredentialStore::find_by_email(store.as_ref(), "qt@example.com")
            .await
            .expect("store")
            .expect("admin exists");
    assert!(stored.last_login_at.is_some());
}

#[tokio::test]
async fn login_response_sets_cookie_but_no_data() {
    let (store, _, app) = test_app();
    seed_admin(&store, "qt@example.com", "mat-khau-1").await;

    let (status, headers, body) = call(
        &app,
        post_json(
            "/admin/api/login",
            &json!({ "email": "qt@example.com", "password": "mat-khau-1" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
    let set_cookie = headers.get("set-cookie").unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("hoamai_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Max-Age=604800"));
}

#[tokio::test]
async fn session_endpoint_returns_typed_fields() {
    let (store, _, app) = test_app();
    seed_admin(&store, "qt@example.com", "mat-khau-1").await;
    let cookie = login_cookie(&app, "/admin/api/login", "qt@example.com", "mat-khau-1").await;

    let (status, _, body) = call(&app, get("/admin/api/session", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["email"], json!("qt@example.com"));
    assert_eq!(body["data"]["isLoggedIn"], json!(true));
    assert_eq!(body["data"]["role"], json!("ADMIN"));
    assert!(body["data"]["adminId"].is_string());
    // The password hash must never appear in any payload.
    assert!(body["data"].get("passwordHash").is_none());
}
