//! HTTP surface: the public content API plus the three portals. Every
//! mutation goes schema validation → authorization → business checks →
//! a single store write → the uniform result shape.

pub mod admin;
pub mod parent;
pub mod public;
pub mod teacher;

use axum::handler::Handler;
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use axum::routing::{delete, get, post, put};
use axum::{Extension, Router};

use crate::err;
use crate::state::AppState;

pub(crate) fn cookie_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(COOKIE).and_then(|value| value.to_str().ok())
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // public marketing site API
        .route("/api/posts", get(public::list_posts))
        .route("/api/posts/:slug", get(public::get_post))
        .route("/api/announcements", get(public::list_announcements))
        .route("/api/newsletter/subscribe", post(public::subscribe))
        // admin portal
        .route("/admin", get(admin::dashboard))
        .route("/admin/login", get(admin::login_page))
        .route("/admin/api/login", post(admin::login))
        .route("/admin/api/logout", post(admin::logout))
        .route("/admin/api/session", get(admin::session))
        .route("/admin/api/password", post(admin::change_password))
        .route("/admin/api/posts", post(admin::create_post))
        .route(
            "/admin/api/posts/:id",
            put(admin::update_post).delete(admin::delete_post),
        )
        .route("/admin/api/teachers/pending", get(admin::pending_teachers))
        .route("/admin/api/teachers/:id/approve", post(admin::approve_teacher))
        .route("/admin/api/teachers/:id", delete(admin::deactivate_teacher))
        .route("/admin/api/announcements", post(admin::create_announcement))
        .route(
            "/admin/api/announcements/:id",
            delete(admin::delete_announcement),
        )
        .route("/admin/api/classes", get(admin::list_classes).post(admin::create_class))
        .route("/admin/api/students", post(admin::create_student))
        .route("/admin/api/students/:id", delete(admin::deactivate_student))
        // parent portal
        .route("/parent", get(parent::dashboard))
        .route("/parent/login", get(parent::login_page))
        .route("/parent/api/register", post(parent::register))
        .route("/parent/api/login", post(parent::login))
        .route("/parent/api/logout", post(parent::logout))
        .route("/parent/api/password", post(parent::change_password))
        .route("/parent/api/students", get(parent::students))
        // teacher portal
        .route("/teacher", get(teacher::dashboard))
        .route("/teacher/login", get(teacher::login_page))
        .route("/teacher/api/register", post(teacher::register))
        .route("/teacher/api/login", post(teacher::login))
        .route("/teacher/api/logout", post(teacher::logout))
        .route("/teacher/api/password", post(teacher::change_password))
        .route(
            "/teacher/api/materials",
            get(teacher::list_materials).post(teacher::create_material),
        )
        .route("/teacher/api/materials/:id", delete(teacher::remove_material))
        .fallback(err::handler_404.into_service())
        .layer(Extension(state))
}
