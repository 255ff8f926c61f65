use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::error::VidtubeError;

/// Page-based pagination query parameters (`?page=2&limit=10`).
///
/// Usage in handlers:
/// ```rust,ignore
/// async fn list_comments(pagination: Pagination) -> impl IntoResponse {
///     // pagination.page (1-based), pagination.limit
/// }
/// ```
#[derive(Debug, Clone, Copy, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// 1-based page number (default: 1)
    #[serde(default = "default_page")]
    pub page: u64,

    /// Items per page (default: 10, max: 50)
    #[serde(default = "default_limit")]
    pub limit: u64,
}

pub const MAX_LIMIT: u64 = 50;

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    10
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination { page: 1, limit: 10 }
    }
}

impl Pagination {
    /// Zero-based page index as SeaORM's paginator expects it.
    pub fn page_index(&self) -> u64 {
        self.page.saturating_sub(1)
    }

    /// Reject out-of-range values instead of silently clamping them.
    pub fn validated(self, max_limit: u64) -> Result<Self, VidtubeError> {
        if self.page < 1 {
            return Err(VidtubeError::BadRequest("Invalid page number".to_string()));
        }
        if self.limit < 1 || self.limit > max_limit {
            return Err(VidtubeError::BadRequest(format!(
                "Invalid limit, maximum limit is {}",
                max_limit
            )));
        }
        Ok(self)
    }
}

impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = VidtubeError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or("");
        let pagination: Pagination = serde_urlencoded::from_str(query)
            .map_err(|e| VidtubeError::BadRequest(format!("Invalid pagination: {}", e)))?;
        pagination.validated(MAX_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_index_is_zero_based() {
        let p = Pagination { page: 3, limit: 10 };
        assert_eq!(p.page_index(), 2);
    }

    #[test]
    fn validated_rejects_out_of_range() {
        assert!(Pagination { page: 0, limit: 10 }.validated(20).is_err());
        assert!(Pagination { page: 1, limit: 21 }.validated(20).is_err());
        assert!(Pagination { page: 1, limit: 0 }.validated(20).is_err());
        assert!(Pagination { page: 2, limit: 20 }.validated(20).is_ok());
    }
}
