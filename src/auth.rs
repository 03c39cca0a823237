//! Generic authentication service.
//!
//! The three portals (admin, parent, teacher) share one implementation
//! parameterized by the account type; each instance gets its own cookie
//! codec and store accessor. Login deliberately answers "unknown email" and
//! "wrong password" with the same error so the endpoint cannot be used to
//! enumerate accounts. There is no login rate limit here; if one is wanted
//! it belongs in front of the server, not in this service.

use std::sync::Arc;

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::Json;
use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::Pbkdf2;
use rand_core::OsRng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::err::{done, ApiOk, Error, Payload};
use crate::models::{AdminAccount, AdminRole, ParentAccount, TeacherAccount};
use crate::session::{SessionCodec, SessionPayload};
use crate::store::CredentialStore;
use crate::validate::{EqualPair, Field, Issue, Kind, Schema};

/// Cookie payload for the admin portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSessionData {
    pub admin_id: Option<Uuid>,
    pub email: String,
    pub name: String,
    pub role: AdminRole,
    pub is_logged_in: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentSessionData {
    pub parent_id: Option<Uuid>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_logged_in: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSessionData {
    pub teacher_id: Option<Uuid>,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_logged_in: bool,
}

impl SessionPayload for AdminSessionData {
    fn account_id(&self) -> Option<Uuid> {
        self.admin_id
    }
    fn email(&self) -> &str {
        &self.email
    }
    fn is_authenticated(&self) -> bool {
        self.is_logged_in && self.admin_id.is_some()
    }
}

impl SessionPayload for ParentSessionData {
    fn account_id(&self) -> Option<Uuid> {
        self.parent_id
    }
    fn email(&self) -> &str {
        &self.email
    }
    fn is_authenticated(&self) -> bool {
        self.is_logged_in && self.parent_id.is_some()
    }
}

impl SessionPayload for TeacherSessionData {
    fn account_id(&self) -> Option<Uuid> {
        self.teacher_id
    }
    fn email(&self) -> &str {
        &self.email
    }
    fn is_authenticated(&self) -> bool {
        self.is_logged_in && self.teacher_id.is_some()
    }
}

/// What the auth service needs to know about an account variant.
pub trait AccountRecord: Send + Sync + Sized + 'static {
    type Session: SessionPayload + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Admin logins stamp `last_login_at`; the other variants do not.
    const TRACKS_LAST_LOGIN: bool = false;

    fn id(&self) -> Uuid;
    fn password_hash(&self) -> &str;
    fn is_active(&self) -> bool;
    fn session(&self) -> Self::Session;
}

impl AccountRecord for AdminAccount {
    type Session = AdminSessionData;
    const TRACKS_LAST_LOGIN: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }
    fn password_hash(&self) -> &str {
        &self.password_hash
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
    fn session(&self) -> AdminSessionData {
        AdminSessionData {
            admin_id: Some(self.id),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            is_logged_in: true,
        }
    }
}

impl AccountRecord for ParentAccount {
    type Session = ParentSessionData;

    fn id(&self) -> Uuid {
        self.id
    }
    fn password_hash(&self) -> &str {
        &self.password_hash
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
    fn session(&self) -> ParentSessionData {
        ParentSessionData {
            parent_id: Some(self.id),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_logged_in: true,
        }
    }
}

impl AccountRecord for TeacherAccount {
    type Session = TeacherSessionData;

    fn id(&self) -> Uuid {
        self.id
    }
    fn password_hash(&self) -> &str {
        &self.password_hash
    }
    fn is_active(&self) -> bool {
        self.is_active
    }
    fn session(&self) -> TeacherSessionData {
        TeacherSessionData {
            teacher_id: Some(self.id),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_logged_in: true,
        }
    }
}

pub struct AuthService<A: AccountRecord> {
    codec: SessionCodec,
    store: Arc<dyn CredentialStore<A>>,
}

impl<A: AccountRecord> AuthService<A> {
    pub fn new(codec: SessionCodec, store: Arc<dyn CredentialStore<A>>) -> Self {
        Self { codec, store }
    }

    /// Verifies credentials and returns the `Set-Cookie` header for a fresh
    /// session. Unknown email and wrong password are indistinguishable to
    /// the caller; a disabled account is rejected even with the right
    /// password.
    pub async fn login(&self, email: &str, password: &str) -> Result<HeaderValue, Error> {
        let account = match self.store.find_by_email(email).await? {
            Some(account) => account,
            None => return Err(Error::InvalidCredentials),
        };
        if !account.is_active() {
            return Err(Error::AccountDisabled);
        }
        if !verify_password(password, account.password_hash())? {
            return Err(Error::InvalidCredentials);
        }
        if A::TRACKS_LAST_LOGIN {
            self.store.touch_last_login(account.id()).await?;
        }
        self.codec.issue(&account.session())
    }

    /// Logout is purely a cookie clear; there is no server-side session to
    /// revoke.
    pub fn logout(&self) -> HeaderValue {
        self.codec.clear()
    }

    /// Returns the session only when it decodes cleanly AND passes the
    /// authenticated check; never partial data.
    pub fn current_session(&self, cookie_header: Option<&str>) -> Option<A::Session> {
        self.codec
            .load::<A::Session>(cookie_header)
            .filter(SessionPayload::is_authenticated)
    }

    pub fn require_session(&self, cookie_header: Option<&str>) -> Result<A::Session, Error> {
        self.current_session(cookie_header).ok_or(Error::Unauthorized)
    }
}

pub fn hash_password(password: &str) -> Result<String, Error> {
    Pbkdf2
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|hash| hash.to_string())
        .map_err(Error::internal)
}

fn verify_password(password: &str, hash: &str) -> Result<bool, Error> {
    // A hash that does not parse is corrupt server data, not a bad login.
    let parsed = PasswordHash::new(hash).map_err(Error::internal)?;
    Ok(Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok())
}

pub const LOGIN_SCHEMA: Schema = Schema {
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
            kind: Kind::Str { min: 1, max: 100 },
        },
    ],
    equal_pairs: &[],
};

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

pub const CHANGE_PASSWORD_SCHEMA: Schema = Schema {
    fields: &[
        Field {
            name: "currentPassword",
            label: "mật khẩu hiện tại",
            required: true,
            kind: Kind::Str { min: 1, max: 100 },
        },
        Field {
            name: "newPassword",
            label: "mật khẩu mới",
            required: true,
            kind: Kind::Str { min: 6, max: 100 },
        },
        Field {
            name: "confirmPassword",
            label: "mật khẩu xác nhận",
            required: true,
            kind: Kind::Str { min: 6, max: 100 },
        },
    ],
    equal_pairs: &[EqualPair {
        field: "confirmPassword",
        must_match: "newPassword",
        message: "Mật khẩu xác nhận không khớp.",
    }],
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
    #[allow(dead_code)]
    pub confirm_password: String,
}

/// Shared login route body: validate, authenticate, set the cookie. Login
/// responses carry no data payload; the session travels in the cookie.
pub async fn handle_login<A: AccountRecord>(
    service: &AuthService<A>,
    raw: Value,
) -> Result<(HeaderMap, Json<ApiOk<()>>), Error> {
    let input: LoginInput = LOGIN_SCHEMA.parse(raw)?;
    let cookie = service.login(&input.email, &input.password).await?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok((headers, Json(ApiOk::empty())))
}

pub fn handle_logout<A: AccountRecord>(service: &AuthService<A>) -> (HeaderMap, Json<ApiOk<()>>) {
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, service.logout());
    (headers, Json(ApiOk::empty()))
}

/// Shared password-change route body. Validation (including the
/// confirmation match) runs before any store access, so a rejected request
/// leaves the stored hash untouched.
pub async fn handle_change_password<A: AccountRecord>(
    service: &AuthService<A>,
    cookie_header: Option<&str>,
    raw: Value,
) -> Payload<()> {
    let session = service.require_session(cookie_header)?;
    let input: ChangePasswordInput = CHANGE_PASSWORD_SCHEMA.parse(raw)?;

    let account = match service.store.find_by_email(session.email()).await? {
        Some(account) => account,
        // Account vanished while the cookie was still live.
        None => return Err(Error::Unauthorized),
    };
    if !verify_password(&input.current_password, account.password_hash())? {
        return Err(Error::validation(vec![Issue {
            field: "currentPassword",
            message: "Mật khẩu hiện tại không đúng.".to_string(),
        }]));
    }
    let new_hash = hash_password(&input.new_password)?;
    service.store.update_password(account.id(), &new_hash).await?;
    done()
}
