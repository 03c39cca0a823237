//! Teacher portal. Registration is open but the account starts inactive;
//! login works only after an admin approves it. Material mutations are
//! scoped to the session's teacher id.

use axum::extract::Path;
use axum::http::HeaderMap;
use axum::response::Html;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::cookie_header;
use crate::auth::{handle_change_password, handle_login, handle_logout, hash_password};
use crate::err::{done, proceeds, ApiOk, Error, Payload};
use crate::guard::{Authed, Portal};
use crate::models::{Material, TeacherAccount};
use crate::session::SessionPayload;
use crate::state::AppState;
use crate::store::{ContentStore, CredentialStore, Store, StoreError};
use crate::validate::{EqualPair, Field, Kind, Schema};

const MSG_EMAIL_TAKEN: &str = "Email này đã được sử dụng.";
const MSG_MATERIAL_NOT_FOUND: &str = "Không tìm thấy tài liệu.";

pub async fn login_page() -> Html<&'static str> {
    Html("<h1>Đăng nhập giáo viên</h1>")
}

pub async fn dashboard(Portal(session): Portal<TeacherAccount>) -> Html<String> {
    Html(format!(
        "<h1>Cổng giáo viên — {} {}</h1>",
        session.last_name, session.first_name
    ))
}

pub async fn login(
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Result<(HeaderMap, Json<ApiOk<()>>), Error> {
    handle_login(&state.teacher_auth, raw).await
}

pub async fn logout(Extension(state): Extension<AppState>) -> (HeaderMap, Json<ApiOk<()>>) {
    handle_logout(&state.teacher_auth)
}

pub async fn change_password(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Payload<()> {
    handle_change_password(&state.teacher_auth, cookie_header(&headers), raw).await
}

const REGISTER_SCHEMA: Schema = Schema {
    fields: &[
        Field {
            name: "email",
            label: "email",
            required: true,
            kind: Kind::Email,
        },
        Field {
            name: "password",
            label: "mật khẩu",
            required: true,
            kind: Kind::Str { min: 6, max: 100 },
        },
        Field {
            name: "confirmPassword",
            label: "mật khẩu xác nhận",
            required: true,
            kind: Kind::Str { min: 6, max: 100 },
        },
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
    ],
    equal_pairs: &[EqualPair {
        field: "confirmPassword",
        must_match: "password",
        message: "Mật khẩu xác nhận không khớp.",
    }],
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterInput {
    email: String,
    password: String,
    first_name: String,
    last_name: String,
}

/// New teacher accounts wait for admin approval before they can log in.
pub async fn register(
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Payload<TeacherAccount> {
    let input: RegisterInput = REGISTER_SCHEMA.parse(raw)?;

    // The store serves three account namespaces; name the one we mean.
    let existing = <dyn Store as CredentialStore<TeacherAccount>>::find_by_email(
        state.store.as_ref(),
        &input.email,
    )
    .await?;
    if existing.is_some() {
        return Err(Error::conflict(MSG_EMAIL_TAKEN));
    }

    let teacher = TeacherAccount {
        id: Uuid::new_v4(),
        email: input.email,
        password_hash: hash_password(&input.password)?,
        first_name: input.first_name,
        last_name: input.last_name,
        is_active: false,
        created_at: Utc::now(),
    };
    match state.store.create_teacher(&teacher).await {
        Ok(()) => proceeds(teacher),
        Err(StoreError::Duplicate) => Err(Error::conflict(MSG_EMAIL_TAKEN)),
        Err(err) => Err(err.into()),
    }
}

const MATERIAL_SCHEMA: Schema = Schema {
    fields: &[
        Field {
            name: "title",
            label: "tiêu đề",
            required: true,
            kind: Kind::Str { min: 1, max: 200 },
        },
        Field {
            name: "url",
            label: "liên kết",
            required: true,
            kind: Kind::Str { min: 1, max: 500 },
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
struct MaterialInput {
    title: String,
    url: String,
    class_id: Option<Uuid>,
}

pub async fn list_materials(
    Authed(session): Authed<TeacherAccount>,
    Extension(state): Extension<AppState>,
) -> Payload<Vec<Material>> {
    let teacher_id = session.account_id().ok_or(Error::Unauthorized)?;
    proceeds(state.store.materials_of_teacher(teacher_id).await?)
}

pub async fn create_material(
    Authed(session): Authed<TeacherAccount>,
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Payload<Material> {
    let teacher_id = session.account_id().ok_or(Error::Unauthorized)?;
    let input: MaterialInput = MATERIAL_SCHEMA.parse(raw)?;
    let material = Material {
        id: Uuid::new_v4(),
        title: input.title,
        url: input.url,
        class_id: input.class_id,
        uploaded_by: teacher_id,
        is_active: true,
        created_at: Utc::now(),
    };
    match state.store.create_material(&material).await {
        Ok(()) => proceeds(material),
        Err(StoreError::ForeignKey) => Err(Error::not_found("Không tìm thấy lớp học.")),
        Err(err) => Err(err.into()),
    }
}

/// Deactivation only touches the caller's own material; anyone else's id
/// reads as not found.
pub async fn remove_material(
    Authed(session): Authed<TeacherAccount>,
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Payload<()> {
    let teacher_id = session.account_id().ok_or(Error::Unauthorized)?;
    match state.store.deactivate_material(id, Some(teacher_id)).await {
        Ok(()) => done(),
        Err(StoreError::NotFound) => Err(Error::not_found(MSG_MATERIAL_NOT_FOUND)),
        Err(err) => Err(err.into()),
    }
}
