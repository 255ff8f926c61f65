use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::OwnerSummary;

/// Video entity - metadata for an uploaded video; the bytes live in the media store.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "videos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub owner_id: Uuid,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub video_url: String,
    pub video_key: String,

    pub thumbnail_url: String,
    pub thumbnail_key: String,

    /// Seconds
    pub duration: f64,

    pub views: i64,

    pub is_published: bool,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Unpublished videos are visible to their owner only.
    pub fn visible_to(&self, viewer: Option<Uuid>) -> bool {
        self.is_published || viewer == Some(self.owner_id)
    }
}

/// The JSON representation returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<Model> for VideoResponse {
    fn from(m: Model) -> Self {
        VideoResponse {
            id: m.id,
            owner_id: m.owner_id,
            title: m.title,
            description: m.description,
            video_file: m.video_url,
            thumbnail: m.thumbnail_url,
            duration: m.duration,
            views: m.views,
            is_published: m.is_published,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// A video card with its owner folded in (watch history, liked videos, playlists).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoWithOwner {
    #[serde(flatten)]
    pub video: VideoResponse,
    pub owner: Option<OwnerSummary>,
}
