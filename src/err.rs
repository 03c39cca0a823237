//! Error taxonomy and the uniform API result shape.
//!
//! Every endpoint answers with `{ "success": true, "data": ... }` or
//! `{ "success": false, "error": "...", "details": [...] }`. Error messages
//! are user-facing Vietnamese; internal failures are logged server-side and
//! never leak store or runtime detail to the client.

use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::validate::Issue;

pub const MSG_INVALID_CREDENTIALS: &str = "Email hoặc mật khẩu không chính xác.";
pub const MSG_ACCOUNT_DISABLED: &str = "Tài khoản chưa được kích hoạt hoặc đã bị vô hiệu hóa.";
pub const MSG_UNAUTHORIZED: &str = "Vui lòng đăng nhập.";
pub const MSG_INTERNAL: &str = "Đã xảy ra lỗi, vui lòng thử lại sau.";

#[derive(Debug)]
pub enum Error {
    Validation { message: String, details: Vec<Issue> },
    InvalidCredentials,
    AccountDisabled,
    Conflict { message: String },
    NotFound { message: String },
    Unauthorized,
    Internal,
}

impl Error {
    pub fn validation(details: Vec<Issue>) -> Self {
        let message = details
            .first()
            .map(|issue| issue.message.clone())
            .unwrap_or_else(|| crate::validate::MALFORMED_BODY.to_string());
        Error::Validation { message, details }
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Error::Conflict {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Error::NotFound {
            message: message.into(),
        }
    }

    /// Logs the underlying cause and degrades it to a generic message.
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        log::error!("internal error: {err}");
        Error::Internal
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Validation { message, .. } => message,
            Error::InvalidCredentials => MSG_INVALID_CREDENTIALS,
            Error::AccountDisabled => MSG_ACCOUNT_DISABLED,
            Error::Conflict { message } => message,
            Error::NotFound { message } => message,
            Error::Unauthorized => MSG_UNAUTHORIZED,
            Error::Internal => MSG_INTERNAL,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::AccountDisabled => StatusCode::FORBIDDEN,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<Issue>>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.message().to_string();
        let details = match self {
            Error::Validation { details, .. } if !details.is_empty() => Some(details),
            _ => None,
        };
        (
            status,
            Json(ErrorBody {
                success: false,
                error,
                details,
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiOk<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> ApiOk<T> {
    pub fn of(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }

    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
        }
    }
}

pub type Payload<T> = Result<Json<ApiOk<T>>, Error>;

/// Success with a data payload (creates and reads).
pub fn proceeds<T: Serialize>(data: T) -> Payload<T> {
    Ok(Json(ApiOk::of(data)))
}

/// Success without a data payload (deletes and void updates).
pub fn done<T: Serialize>() -> Payload<T> {
    Ok(Json(ApiOk::empty()))
}

pub async fn handler_404(path: Uri) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            success: false,
            error: format!("Không tìm thấy đường dẫn: {path}"),
            details: None,
        }),
    )
}
