use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::server::api::ValidationErrorResponse;
use crate::variants::ServiceError;

const LOG_TARGET: &str = "calciotto::server::error";

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Unprocessable(String),
    Validation(ValidationErrorResponse),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::MatchNotFound(_)
            | ServiceError::VariantNotFound(_)
            | ServiceError::NotSignedUp(_) => Self::NotFound(message),
            ServiceError::AlreadySignedUp(_) | ServiceError::StartersFull { .. } => {
                Self::Conflict(message)
            }
            ServiceError::NoStarters(_)
            | ServiceError::MissingRatings(_)
            | ServiceError::NotAStarter(_)
            | ServiceError::DuplicatePlayer(_)
            | ServiceError::Rating(_) => Self::Unprocessable(message),
            ServiceError::Storage(_) => Self::Internal(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation(validation) => (status, Json(validation)).into_response(),
            Self::Internal(message) => {
                error!(target: LOG_TARGET, %message, "internal server error");
                (status, Json(json!({ "status": "error", "message": message }))).into_response()
            }
            Self::NotFound(message)
            | Self::BadRequest(message)
            | Self::Conflict(message)
            | Self::Unprocessable(message) => {
                warn!(target: LOG_TARGET, status = status.as_u16(), %message, "request rejected");
                (status, Json(json!({ "status": "error", "message": message }))).into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
