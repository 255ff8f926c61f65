use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// User entity - a principal that owns channels, videos and sessions.
///
/// Pure data: credential minting and rotation live in
/// [`SessionManager`](crate::auth::SessionManager).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Lowercased, unique
    #[sea_orm(unique)]
    pub username: String,

    /// Lowercased, unique
    #[sea_orm(unique)]
    pub email: String,

    pub fullname: String,

    pub avatar_url: String,
    pub avatar_key: String,

    pub cover_image_url: Option<String>,
    pub cover_image_key: Option<String>,

    #[serde(skip_serializing)]
    pub password_hash: String,

    /// SHA-256 digest of the single live refresh credential, if any.
    #[serde(skip_serializing)]
    pub refresh_token_hash: Option<String>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Public user data (safe to return in API responses).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Model> for UserResponse {
    fn from(user: Model) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            fullname: user.fullname,
            avatar: user.avatar_url,
            cover_image: user.cover_image_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Compact owner card embedded in video, playlist and subscription listings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: Uuid,
    pub username: String,
    pub fullname: String,
    pub avatar: String,
}

impl From<&Model> for OwnerSummary {
    fn from(user: &Model) -> Self {
        OwnerSummary {
            id: user.id,
            username: user.username.clone(),
            fullname: user.fullname.clone(),
            avatar: user.avatar_url.clone(),
        }
    }
}
