use axum::http::StatusCode;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ErrorDetail;

/// Standard API response wrapper.
///
/// All vidtube endpoints return this format:
/// ```json
/// {
///   "success": true,
///   "data": { ... },
///   "message": "User logged in successfully"
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response with data.
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Create a `201 Created` response with data.
    pub fn created(data: T) -> Self {
        ApiResponse {
            status: StatusCode::CREATED,
            ..Self::success(data)
        }
    }

    /// Attach a human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Create an error response.
    pub fn failure(error: ErrorDetail) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: None,
            error: Some(error),
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// Status code this response is sent with.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        (self.status, axum::Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_keeps_payload_and_sets_status() {
        let res = ApiResponse::created(5).with_message("made");
        assert_eq!(res.status(), StatusCode::CREATED);
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 5);
        assert_eq!(json["message"], "made");
        assert!(json.get("error").is_none());
        assert!(json.get("status").is_none());
    }

    #[test]
    fn failure_omits_data() {
        let res: ApiResponse<()> = ApiResponse::failure(ErrorDetail {
            code: "NOT_FOUND".to_string(),
            message: "missing".to_string(),
            fields: None,
        });
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json.get("data").is_none());
    }
}
