use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::user::OwnerSummary;

/// Comment entity - a text comment on a video.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub video_id: Uuid,

    pub owner_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub video_id: Uuid,
    pub content: String,
    pub owner: Option<OwnerSummary>,
    pub likes: u64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
