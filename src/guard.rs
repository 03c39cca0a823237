//! Route guards, as extractors.
//!
//! [`Portal`] protects portal pages: no valid session means a redirect to
//! that portal's login page before any protected content is rendered or any
//! identity-scoped data is fetched. [`Authed`] protects API mutations: no
//! valid session means a 401 with the uniform error body, so a handler can
//! never silently run without an actor.

use axum::async_trait;
use axum::extract::{FromRequest, RequestParts};
use axum::http::header::COOKIE;
use axum::response::Redirect;

use crate::err::Error;
use crate::state::{AppState, RoleAuth};

fn cookie_header<B>(req: &RequestParts<B>) -> Option<&str> {
    req.headers().get(COOKIE).and_then(|value| value.to_str().ok())
}

fn state<B>(req: &RequestParts<B>) -> Result<AppState, Error> {
    req.extensions()
        .get::<AppState>()
        .cloned()
        .ok_or_else(|| Error::internal("AppState extension missing"))
}

pub struct Authed<A: RoleAuth>(pub A::Session);

#[async_trait]
impl<B: Send, A: RoleAuth> FromRequest<B> for Authed<A> {
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let state = state(req)?;
        A::auth(&state)
            .current_session(cookie_header(req))
            .map(Authed)
            .ok_or(Error::Unauthorized)
    }
}

pub struct Portal<A: RoleAuth>(pub A::Session);

#[async_trait]
impl<B: Send, A: RoleAuth> FromRequest<B> for Portal<A> {
    type Rejection = Redirect;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let state =
            state(req).map_err(|_| Redirect::to(A::LOGIN_PAGE))?;
        A::auth(&state)
            .current_session(cookie_header(req))
            .map(Portal)
            .ok_or_else(|| Redirect::to(A::LOGIN_PAGE))
    }
}
