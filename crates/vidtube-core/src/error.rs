use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::session::SessionError;
use crate::response::ApiResponse;

/// Error type for every handler; renders as the failure envelope.
#[derive(Debug, Error)]
pub enum VidtubeError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation errors")]
    ValidationErrors(Vec<FieldError>),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl VidtubeError {
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            VidtubeError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            VidtubeError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            VidtubeError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            VidtubeError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            VidtubeError::Validation(_) | VidtubeError::ValidationErrors(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            VidtubeError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            VidtubeError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            VidtubeError::Session(e) => (e.status_code(), e.error_code()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.classify().0
    }

    /// Machine-readable code placed in `error.code`.
    pub fn error_code(&self) -> &'static str {
        self.classify().1
    }

    fn public_message(&self) -> String {
        match self {
            VidtubeError::ValidationErrors(errs) => errs
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect::<Vec<_>>()
                .join("; "),
            // SQL text stays in the log.
            VidtubeError::Database(_) => "Database error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for VidtubeError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid {}", field)),
                    code: Some(e.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        VidtubeError::ValidationErrors(fields)
    }
}

/// `error` object of the failure envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

/// Field-level validation error.
///
/// ```json
/// { "field": "email", "message": "must be a valid email address", "code": "email" }
/// ```
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl axum::response::IntoResponse for VidtubeError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = self.classify();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let fields = match &self {
            VidtubeError::ValidationErrors(errs) => Some(errs.clone()),
            _ => None,
        };
        let body: ApiResponse<()> = ApiResponse::failure(ErrorDetail {
            code: code.to_string(),
            message: self.public_message(),
            fields,
        });

        (status, axum::Json(body)).into_response()
    }
}
