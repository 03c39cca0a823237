//! Mutation handler behavior: validation order, uniqueness, derived fields,
//! and self-service scoping.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::*;
use hoamai_server::models::NewsletterSubscriber;
use hoamai_server::store::{ContentStore, CredentialStore, StoreError};

#[tokio::test]
async fn newsletter_duplicate_and_reactivation() {
    let (store, _, app) = test_app();

    let (status, _, body) = call(
        &app,
        post_json("/api/newsletter/subscribe", &json!({ "email": "ba@example.com" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], json!(true));

    // Same active email again is a conflict with the exact site message.
    let (status, _, body) = call(
        &app,
        post_json("/api/newsletter/subscribe", &json!({ "email": "ba@example.com" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("Email này đã được đăng ký."));

    // An unsubscribed email is reactivated in place, not duplicated.
    let unsubscribed = NewsletterSubscriber {
        id: Uuid::new_v4(),
        email: "cu@example.com".to_string(),
        is_active: false,
        subscribed_at: chrono::Utc::now(),
    };
    store.create_subscriber(&unsubscribed).await.unwrap();

    let (status, _, body) = call(
        &app,
        post_json("/api/newsletter/subscribe", &json!({ "email": "cu@example.com" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(unsubscribed.id.to_string()));
    assert_eq!(body["data"]["isActive"], json!(true));

    // Same row, same id, now active again.
    let row = store
        .subscriber_by_email("cu@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.id, unsubscribed.id);
    assert!(row.is_active);
}

#[tokio::test]
async fn password_change_mismatch_leaves_hash_unchanged() {
    let (store, _, app) = test_app();
    let parent = seed_parent(&store, "me@example.com", "mat-khau-1").await;
    let cookie = login_cookie(&app, "/parent/api/login", "me@example.com", "mat-khau-1").await;

    let (status, _, body) = call(
        &app,
        post_json(
            "/parent/api/password",
            &json!({
                "currentPassword": "mat-khau-1",
                "newPassword": "abcdef",
                "confirmPassword": "abcdeg",
            }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Mật khẩu xác nhận không khớp."));

    let stored: hoamai_server::models::ParentAccount =
        CredentialStore::find_by_email(store.as_ref(), "me@example.com")
            .await
            .unwrap()
            .unwrap();
    assert_eq!(stored.password_hash, parent.password_hash);
}

#[tokio::test]
async fn password_change_works_and_old_password_stops_working() {
    let (store, _, app) = test_app();
    seed_parent(&store, "me@example.com", "mat-khau-1").await;
    let cookie = login_cookie(&app, "/parent/api/login", "me@example.com", "mat-khau-1").await;

    let (status, _, _) = call(
        &app,
        post_json(
            "/parent/api/password",
            &json!({
                "currentPassword": "mat-khau-1",
                "newPassword": "mat-khau-2",
                "confirmPassword": "mat-khau-2",
            }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = call(
        &app,
        post_json(
            "/parent/api/login",
            &json!({ "email": "me@example.com", "password": "mat-khau-1" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    login_cookie(&app, "/parent/api/login", "me@example.com", "mat-khau-2").await;
}

#[tokio::test]
async fn wrong_current_password_is_rejected_before_any_write() {
    let (store, _, app) = test_app();
    let parent = seed_parent(&store, "me@example.com", "mat-khau-1").await;
    let cookie = login_cookie(&app, "/parent/api/login", "me@example.com", "mat-khau-1").await;

    let (status, _, body) = call(
        &app,
        post_json(
            "/parent/api/password",
            &json!({
                "currentPassword": "sai-mat-khau",
                "newPassword": "mat-khau-2",
                "confirmPassword": "mat-khau-2",
            }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Mật khẩu hiện tại không đúng."));

    let stored: hoamai_server::models::ParentAccount =
        CredentialStore::find_by_email(store.as_ref(), "me@example.com")
            .await
            .unwrap()
            .unwrap();
    assert_eq!(stored.password_hash, parent.password_hash);
}

#[tokio::test]
async fn blog_post_create_update_and_slug_conflict() {
    let (store, _, app) = test_app();
    seed_admin(&store, "qt@example.com", "mat-khau-1").await;
    let cookie = login_cookie(&app, "/admin/api/login", "qt@example.com", "mat-khau-1").await;

    // Draft: no publish timestamp.
    let (status, _, body) = call(
        &app,
        post_json(
            "/admin/api/posts",
            &json!({ "slug": "khai-giang", "title": "Khai giảng", "body": "Nội dung" }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["published"], json!(false));
    assert!(body["data"]["publishedAt"].is_null());
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // Same slug again is a conflict.
    let (status, _, body) = call(
        &app,
        post_json(
            "/admin/api/posts",
            &json!({ "slug": "khai-giang", "title": "Trùng", "body": "Nội dung" }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("Đường dẫn bài viết đã tồn tại."));

    // Publishing through update stamps the timestamp.
    let (status, _, body) = call(
        &app,
        send_json(
            "PUT",
            &format!("/admin/api/posts/{id}"),
            &json!({
                "slug": "khai-giang",
                "title": "Khai giảng",
                "body": "Nội dung",
                "published": true,
            }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["publishedAt"].is_string());

    // Now visible on the public API.
    let (status, _, body) = call(&app, get("/api/posts/khai-giang", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], json!("Khai giảng"));
}

#[tokio::test]
async fn delete_returns_no_data_and_missing_id_is_404() {
    let (store, _, app) = test_app();
    seed_admin(&store, "qt@example.com", "mat-khau-1").await;
    let cookie = login_cookie(&app, "/admin/api/login", "qt@example.com", "mat-khau-1").await;

    let (_, _, body) = call(
        &app,
        post_json(
            "/admin/api/posts",
            &json!({ "slug": "tam-biet", "title": "Tạm biệt", "body": "..." }),
            Some(&cookie),
        ),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _, body) = call(
        &app,
        send_json("DELETE", &format!("/admin/api/posts/{id}"), &json!({}), Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (status, _, _) = call(
        &app,
        send_json("DELETE", &format!("/admin/api/posts/{id}"), &json!({}), Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_same_slug_creates_leave_exactly_one_row() {
    let store = std::sync::Arc::new(hoamai_server::store::MemStore::new());

    let post = |slug: &str| hoamai_server::models::BlogPost {
        id: Uuid::new_v4(),
        slug: slug.to_string(),
        title: "Đua".to_string(),
        excerpt: None,
        body: "...".to_string(),
        published: false,
        published_at: None,
        created_at: chrono::Utc::now(),
    };

    let a = {
        let store = store.clone();
        let post = post("cung-slug");
        tokio::spawn(async move { store.create_post(&post).await })
    };
    let b = {
        let store = store.clone();
        let post = post("cung-slug");
        tokio::spawn(async move { store.create_post(&post).await })
    };
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one create may win");
    assert!([&a, &b]
        .iter()
        .any(|r| matches!(r, Err(StoreError::Duplicate))));
    assert!(store.post_by_slug("cung-slug").await.unwrap().is_some());
}

#[tokio::test]
async fn teacher_registration_waits_for_approval() {
    let (store, _, app) = test_app();
    seed_admin(&store, "qt@example.com", "mat-khau-1").await;

    let (status, _, body) = call(
        &app,
        post_json(
            "/teacher/api/register",
            &json!({
                "email": "gv@example.com",
                "password": "mat-khau-1",
                "confirmPassword": "mat-khau-1",
                "firstName": "Hương",
                "lastName": "Phạm",
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], json!(false));
    let teacher_id = body["data"]["id"].as_str().unwrap().to_string();

    // Not approved yet: login is refused.
    let (status, _, _) = call(
        &app,
        post_json(
            "/teacher/api/login",
            &json!({ "email": "gv@example.com", "password": "mat-khau-1" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin_cookie =
        login_cookie(&app, "/admin/api/login", "qt@example.com", "mat-khau-1").await;
    let (status, _, body) = call(
        &app,
        post_json(
            &format!("/admin/api/teachers/{teacher_id}/approve"),
            &json!({}),
            Some(&admin_cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], json!(true));

    login_cookie(&app, "/teacher/api/login", "gv@example.com", "mat-khau-1").await;
}

#[tokio::test]
async fn duplicate_registration_email_is_a_conflict() {
    let (store, _, app) = test_app();
    seed_parent(&store, "me@example.com", "mat-khau-1").await;

    let (status, _, body) = call(
        &app,
        post_json(
            "/parent/api/register",
            &json!({
                "email": "me@example.com",
                "password": "mat-khau-9",
                "confirmPassword": "mat-khau-9",
                "firstName": "Minh",
                "lastName": "Trần",
            }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("Email này đã được sử dụng."));
}

#[tokio::test]
async fn teacher_material_scoping() {
    let (store, _, app) = test_app();
    let _owner = seed_teacher(&store, "gv1@example.com", "mat-khau-1", true).await;
    let other = seed_teacher(&store, "gv2@example.com", "mat-khau-1", true).await;
    let cookie = login_cookie(&app, "/teacher/api/login", "gv1@example.com", "mat-khau-1").await;

    let (status, _, body) = call(
        &app,
        post_json(
            "/teacher/api/materials",
            &json!({ "title": "Bảng chữ cái", "url": "https://tailieu.example/abc.pdf" }),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let material_id = body["data"]["id"].as_str().unwrap().to_string();

    // The other teacher cannot deactivate it.
    let other_cookie =
        login_cookie(&app, "/teacher/api/login", "gv2@example.com", "mat-khau-1").await;
    let (status, _, _) = call(
        &app,
        send_json(
            "DELETE",
            &format!("/teacher/api/materials/{material_id}"),
            &json!({}),
            Some(&other_cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        store.materials_of_teacher(other.id).await.unwrap().len(),
        0
    );

    // The owner can.
    let (status, _, _) = call(
        &app,
        send_json(
            "DELETE",
            &format!("/teacher/api/materials/{material_id}"),
            &json!({}),
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn parent_sees_only_own_students() {
    let (store, _, app) = test_app();
    let mine = seed_parent(&store, "me@example.com", "mat-khau-1").await;
    let other = seed_parent(&store, "other@example.com", "mat-khau-1").await;

    for (first, parent_id) in [("An", mine.id), ("Bình", mine.id), ("Cúc", other.id)] {
        store
            .create_student(&hoamai_server::models::Student {
                id: Uuid::new_v4(),
                first_name: first.to_string(),
                last_name: "Trần".to_string(),
                parent_id,
                class_id: None,
                is_active: true,
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();
    }

    let cookie = login_cookie(&app, "/parent/api/login", "me@example.com", "mat-khau-1").await;
    let (status, _, body) = call(&app, get("/parent/api/students", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    let students = body["data"].as_array().unwrap();
    assert_eq!(students.len(), 2);
    assert!(students
        .iter()
        .all(|s| s["parentId"] == json!(mine.id.to_string())));
}

#[tokio::test]
async fn validation_runs_before_the_store_is_touched() {
    let (store, _, app) = test_app();
    seed_admin(&store, "qt@example.com", "mat-khau-1").await;
    let cookie = login_cookie(&app, "/admin/api/login", "qt@example.com", "mat-khau-1").await;

    let (status, _, body) = call(
        &app,
        post_json("/admin/api/posts", &json!({ "slug": "chi-co-slug" }), Some(&cookie)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 2); // title and body both missing
    assert_eq!(body["error"], details[0]["message"]);
    assert!(store.post_by_slug("chi-co-slug").await.unwrap().is_none());
}
