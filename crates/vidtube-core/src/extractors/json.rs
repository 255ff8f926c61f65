use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::VidtubeError;

/// JSON body whose rejections use the vidtube error envelope.
///
/// The `Content-Type` header is not checked; a body that does not parse
/// into `T` is a 422.
///
/// ```rust,ignore
/// async fn create_tweet(Json(payload): Json<TweetRequest>) -> Result<ApiResponse<TweetResponse>, VidtubeError> {
///     // ...
/// }
/// ```
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = VidtubeError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| VidtubeError::BadRequest(format!("Failed to read body: {}", e)))?;

        serde_json::from_slice(&body)
            .map(Json)
            .map_err(|e| VidtubeError::Validation(format!("Invalid JSON: {}", e)))
    }
}
