//! Shared application state: the store handle plus the three configured
//! authentication services. Built once at startup and cloned per request.

use std::sync::Arc;

use crate::auth::{AccountRecord, AuthService};
use crate::config::{SessionKeys, ADMIN_COOKIE, PARENT_COOKIE, TEACHER_COOKIE};
use crate::models::{AdminAccount, ParentAccount, TeacherAccount};
use crate::session::SessionCodec;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub admin_auth: Arc<AuthService<AdminAccount>>,
    pub parent_auth: Arc<AuthService<ParentAccount>>,
    pub teacher_auth: Arc<AuthService<TeacherAccount>>,
}

impl AppState {
    /// Fails when any session key is unusable; that is a boot error, the
    /// server must not come up with a broken codec.
    pub fn new<S: Store + 'static>(
        store: Arc<S>,
        keys: &SessionKeys,
        production: bool,
    ) -> anyhow::Result<Self> {
        let admin_codec = SessionCodec::new(ADMIN_COOKIE, &keys.admin, production)?;
        let parent_codec = SessionCodec::new(PARENT_COOKIE, &keys.parent, production)?;
        let teacher_codec = SessionCodec::new(TEACHER_COOKIE, &keys.teacher, production)?;
        Ok(Self {
            admin_auth: Arc::new(AuthService::new(admin_codec, store.clone())),
            parent_auth: Arc::new(AuthService::new(parent_codec, store.clone())),
            teacher_auth: Arc::new(AuthService::new(teacher_codec, store.clone())),
            store,
        })
    }
}

/// Binds an account variant to its auth service and login page, so the
/// route guards can be generic over the role.
pub trait RoleAuth: AccountRecord {
    const LOGIN_PAGE: &'static str;

    fn auth(state: &AppState) -> &Arc<AuthService<Self>>;
}

impl RoleAuth for AdminAccount {
    const LOGIN_PAGE: &'static str = "/admin/login";

    fn auth(state: &AppState) -> &Arc<AuthService<Self>> {
        &state.admin_auth
    }
}

impl RoleAuth for ParentAccount {
    const LOGIN_PAGE: &'static str = "/parent/login";

    fn auth(state: &AppState) -> &Arc<AuthService<Self>> {
        &state.parent_auth
    }
}

impl RoleAuth for TeacherAccount {
    const LOGIN_PAGE: &'static str = "/teacher/login";

    fn auth(state: &AppState) -> &Arc<AuthService<Self>> {
        &state.teacher_auth
    }
}
