//! Admin portal: staff authentication plus the dashboard's content and
//! people management mutations. Every API here requires an admin session;
//! the dashboard page redirects to the login page without one.

use axum::extract::Path;
use axum::http::HeaderMap;
use axum::response::Html;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::cookie_header;
use crate::auth::{
    handle_change_password, handle_login, handle_logout, AdminSessionData,
};
use crate::err::{done, proceeds, ApiOk, Error, Payload};
use crate::guard::{Authed, Portal};
use crate::models::{AdminAccount, Announcement, BlogPost, ClassGroup, Student, TeacherAccount};
use crate::state::AppState;
use crate::store::{ContentStore, StoreError};
use crate::validate::{Field, Kind, Schema};

const MSG_SLUG_TAKEN: &str = "Đường dẫn bài viết đã tồn tại.";
const MSG_POST_NOT_FOUND: &str = "Không tìm thấy bài viết.";
const MSG_TEACHER_NOT_FOUND: &str = "Không tìm thấy giáo viên.";

pub async fn login_page() -> Html<&'static str> {
    Html("<h1>Đăng nhập quản trị</h1>")
}

pub async fn dashboard(Portal(session): Portal<AdminAccount>) -> Html<String> {
    Html(format!("<h1>Bảng điều khiển — {}</h1>", session.name))
}

pub async fn login(
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Result<(HeaderMap, Json<ApiOk<()>>), Error> {
    handle_login(&state.admin_auth, raw).await
}

pub async fn logout(Extension(state): Extension<AppState>) -> (HeaderMap, Json<ApiOk<()>>) {
    handle_logout(&state.admin_auth)
}

pub async fn session(Authed(session): Authed<AdminAccount>) -> Payload<AdminSessionData> {
    proceeds(session)
}

pub async fn change_password(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Payload<()> {
    handle_change_password(&state.admin_auth, cookie_header(&headers), raw).await
}

const POST_SCHEMA: Schema = Schema {
    fields: &[
        Field {
            name: "slug",
            label: "đường dẫn",
            required: true,
            kind: Kind::Str { min: 1, max: 120 },
        },
        Field {
            name: "title",
            label: "tiêu đề",
            required: true,
            kind: Kind::Str { min: 1, max: 200 },
        },
        Field {
            name: "excerpt",
            label: "tóm tắt",
            required: false,
            kind: Kind::Str { min: 0, max: 500 },
        },
        Field {
            name: "body",
            label: "nội dung",
            required: true,
            kind: Kind::Str { min: 1, max: 50_000 },
        },
        Field {
            name: "published",
            label: "trạng thái đăng",
            required: false,
            kind: Kind::Bool,
        },
    ],
    equal_pairs: &[],
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostInput {
    slug: String,
    title: String,
    excerpt: Option<String>,
    body: String,
    published: Option<bool>,
}

pub async fn create_post(
    Authed(_session): Authed<AdminAccount>,
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Payload<BlogPost> {
    let input: PostInput = POST_SCHEMA.parse(raw)?;

    // Fast-path check for a friendlier message; the insert below is the
    // authoritative uniqueness gate.
    if state.store.post_by_slug(&input.slug).await?.is_some() {
        return Err(Error::conflict(MSG_SLUG_TAKEN));
    }

    let published = input.published.unwrap_or(false);
    let post = BlogPost {
        id: Uuid::new_v4(),
        slug: input.slug,
        title: input.title,
        excerpt: input.excerpt,
        body: input.body,
        published,
        published_at: published.then(Utc::now),
        created_at: Utc::now(),
    };
    match state.store.create_post(&post).await {
        Ok(()) => proceeds(post),
        Err(StoreError::Duplicate) => Err(Error::conflict(MSG_SLUG_TAKEN)),
        Err(err) => Err(err.into()),
    }
}

pub async fn update_post(
    Authed(_session): Authed<AdminAccount>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
    Json(raw): Json<Value>,
) -> Payload<BlogPost> {
    let input: PostInput = POST_SCHEMA.parse(raw)?;
    let existing = state
        .store
        .post_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found(MSG_POST_NOT_FOUND))?;

    let published = input.published.unwrap_or(false);
    // First publish stamps the timestamp; unpublishing clears it.
    let published_at = match (published, existing.published_at) {
        (false, _) => None,
        (true, Some(at)) => Some(at),
        (true, None) => Some(Utc::now()),
    };
    let post = BlogPost {
        id,
        slug: input.slug,
        title: input.title,
        excerpt: input.excerpt,
        body: input.body,
        published,
        published_at,
        created_at: existing.created_at,
    };
    match state.store.update_post(&post).await {
        Ok(()) => proceeds(post),
        Err(StoreError::Duplicate) => Err(Error::conflict(MSG_SLUG_TAKEN)),
        Err(StoreError::NotFound) => Err(Error::not_found(MSG_POST_NOT_FOUND)),
        Err(err) => Err(err.into()),
    }
}

pub async fn delete_post(
    Authed(_session): Authed<AdminAccount>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Payload<()> {
    match state.store.delete_post(id).await {
        Ok(()) => done(),
        Err(StoreError::NotFound) => Err(Error::not_found(MSG_POST_NOT_FOUND)),
        Err(err) => Err(err.into()),
    }
}

pub async fn pending_teachers(
    Authed(_session): Authed<AdminAccount>,
    Extension(state): Extension<AppState>,
) -> Payload<Vec<TeacherAccount>> {
    proceeds(state.store.pending_teachers().await?)
}

pub async fn approve_teacher(
    Authed(_session): Authed<AdminAccount>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Payload<TeacherAccount> {
    match state.store.set_teacher_active(id, true).await {
        Ok(teacher) => proceeds(teacher),
        Err(StoreError::NotFound) => Err(Error::not_found(MSG_TEACHER_NOT_FOUND)),
        Err(err) => Err(err.into()),
    }
}

pub async fn deactivate_teacher(
    Authed(_session): Authed<AdminAccount>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Payload<()> {
    match state.store.set_teacher_active(id, false).await {
        Ok(_) => done(),
        Err(StoreError::NotFound) => Err(Error::not_found(MSG_TEACHER_NOT_FOUND)),
        Err(err) => Err(err.into()),
    }
}

const ANNOUNCEMENT_SCHEMA: Schema = Schema {
    fields: &[
        Field {
            name: "title",
            label: "tiêu đề",
            required: true,
            kind: Kind::Str { min: 1, max: 200 },
        },
        Field {
            name: "body",
            label: "nội dung",
            required: true,
            kind: Kind::Str { min: 1, max: 5_000 },
        },
        Field {
            name: "pinned",
            label: "ghim",
            required: false,
            kind: Kind::Bool,
        },
    ],
    equal_pairs: &[],
};

#[derive(Debug, Deserialize)]
struct AnnouncementInput {
    title: String,
    body: String,
    pinned: Option<bool>,
}

pub async fn create_announcement(
    Authed(_session): Authed<AdminAccount>,
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Payload<Announcement> {
    let input: AnnouncementInput = ANNOUNCEMENT_SCHEMA.parse(raw)?;
    let announcement = Announcement {
        id: Uuid::new_v4(),
        title: input.title,
        body: input.body,
        pinned: input.pinned.unwrap_or(false),
        created_at: Utc::now(),
    };
    state.store.create_announcement(&announcement).await?;
    proceeds(announcement)
}

pub async fn delete_announcement(
    Authed(_session): Authed<AdminAccount>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Payload<()> {
    match state.store.delete_announcement(id).await {
        Ok(()) => done(),
        Err(StoreError::NotFound) => Err(Error::not_found("Không tìm thấy thông báo.")),
        Err(err) => Err(err.into()),
    }
}

const CLASS_SCHEMA: Schema = Schema {
    fields: &[
        Field {
            name: "name",
            label: "tên lớp",
            required: true,
            kind: Kind::Str { min: 1, max: 100 },
        },
        Field {
            name: "level",
            label: "trình độ",
            required: true,
            kind: Kind::OneOf(&["so_cap", "trung_cap", "cao_cap"]),
        },
        Field {
            name: "teacherId",
            label: "giáo viên",
            required: false,
            kind: Kind::Uuid,
        },
    ],
    equal_pairs: &[],
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassInput {
    name: String,
    level: String,
    teacher_id: Option<Uuid>,
}

pub async fn list_classes(
    Authed(_session): Authed<AdminAccount>,
    Extension(state): Extension<AppState>,
) -> Payload<Vec<ClassGroup>> {
    proceeds(state.store.classes().await?)
}

pub async fn create_class(
    Authed(_session): Authed<AdminAccount>,
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Payload<ClassGroup> {
    let input: ClassInput = CLASS_SCHEMA.parse(raw)?;
    let class = ClassGroup {
        id: Uuid::new_v4(),
        name: input.name,
        level: input.level,
        teacher_id: input.teacher_id,
        created_at: Utc::now(),
    };
    match state.store.create_class(&class).await {
        Ok(()) => proceeds(class),
        Err(StoreError::Duplicate) => Err(Error::conflict("Tên lớp đã tồn tại.")),
        Err(StoreError::ForeignKey) => Err(Error::not_found(MSG_TEACHER_NOT_FOUND)),
        Err(err) => Err(err.into()),
    }
}

const STUDENT_SCHEMA: Schema = Schema {
    fields: &[
        Field {
            name: "firstName",
            label: "tên",
            required: true,
            kind: Kind::Str { min: 1, max: 100 },
        },
        Field {
            name: "lastName",
            label: "họ",
            required: true,
            kind: Kind::Str { min: 1, max: 100 },
        },
        Field {
            name: "parentId",
            label: "phụ huynh",
            required: true,
            kind: Kind::Uuid,
        },
        Field {
            name: "classId",
            label: "lớp học",
            required: false,
            kind: Kind::Uuid,
        },
    ],
    equal_pairs: &[],
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StudentInput {
    first_name: String,
    last_name: String,
    parent_id: Uuid,
    class_id: Option<Uuid>,
}

pub async fn create_student(
    Authed(_session): Authed<AdminAccount>,
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Payload<Student> {
    let input: StudentInput = STUDENT_SCHEMA.parse(raw)?;
    let student = Student {
        id: Uuid::new_v4(),
        first_name: input.first_name,
        last_name: input.last_name,
        parent_id: input.parent_id,
        class_id: input.class_id,
        is_active: true,
        created_at: Utc::now(),
    };
    match state.store.create_student(&student).await {
        Ok(()) => proceeds(student),
        Err(StoreError::ForeignKey) => {
            Err(Error::not_found("Không tìm thấy phụ huynh hoặc lớp học."))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn deactivate_student(
    Authed(_session): Authed<AdminAccount>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Payload<()> {
    match state.store.deactivate_student(id).await {
        Ok(()) => done(),
        Err(StoreError::NotFound) => Err(Error::not_found("Không tìm thấy học sinh.")),
        Err(err) => Err(err.into()),
    }
}
