//! Parent portal: self-registration, authentication, and a parent's view of
//! their own children. Every read here is scoped to the session's parent id;
//! there is no way to address another parent's records.

use axum::http::HeaderMap;
use axum::response::Html;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::cookie_header;
use crate::auth::{handle_change_password, handle_login, handle_logout, hash_password};
use crate::err::{proceeds, ApiOk, Error, Payload};
use crate::guard::{Authed, Portal};
use crate::models::{ParentAccount, Student};
use crate::session::SessionPayload;
use crate::state::AppState;
use crate::store::{ContentStore, CredentialStore, Store, StoreError};
use crate::validate::{EqualPair, Field, Kind, Schema};

const MSG_EMAIL_TAKEN: &str = "Email này đã được sử dụng.";

pub async fn login_page() -> Html<&'static str> {
    Html("<h1>Đăng nhập phụ huynh</h1>")
}

pub async fn dashboard(Portal(session): Portal<ParentAccount>) -> Html<String> {
    Html(format!(
        "<h1>Cổng phụ huynh — {} {}</h1>",
        session.last_name, session.first_name
    ))
}

pub async fn login(
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Result<(HeaderMap, Json<ApiOk<()>>), Error> {
    handle_login(&state.parent_auth, raw).await
}

pub async fn logout(Extension(state): Extension<AppState>) -> (HeaderMap, Json<ApiOk<()>>) {
    handle_logout(&state.parent_auth)
}

pub async fn change_password(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Payload<()> {
    handle_change_password(&state.parent_auth, cookie_header(&headers), raw).await
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

/// Parents are active as soon as they register.
pub async fn register(
    Extension(state): Extension<AppState>,
    Json(raw): Json<Value>,
) -> Payload<ParentAccount> {
    let input: RegisterInput = REGISTER_SCHEMA.parse(raw)?;

    // The store serves three account namespaces; name the one we mean.
    let existing = <dyn Store as CredentialStore<ParentAccount>>::find_by_email(
        state.store.as_ref(),
        &input.email,
    )
    .await?;
    if existing.is_some() {
        return Err(Error::conflict(MSG_EMAIL_TAKEN));
    }

    let parent = ParentAccount {
        id: Uuid::new_v4(),
        email: input.email,
        password_hash: hash_password(&input.password)?,
        first_name: input.first_name,
        last_name: input.last_name,
        is_active: true,
        created_at: Utc::now(),
    };
    match state.store.create_parent(&parent).await {
        Ok(()) => proceeds(parent),
        Err(StoreError::Duplicate) => Err(Error::conflict(MSG_EMAIL_TAKEN)),
        Err(err) => Err(err.into()),
    }
}

pub async fn students(
    Authed(session): Authed<ParentAccount>,
    Extension(state): Extension<AppState>,
) -> Payload<Vec<Student>> {
    let parent_id = session.account_id().ok_or(Error::Unauthorized)?;
    proceeds(state.store.students_of_parent(parent_id).await?)
}
