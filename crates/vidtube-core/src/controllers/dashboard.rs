use axum::extract::State;
use axum::routing::get;
use axum::Router;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::VidtubeError;
use crate::extractors::AuthUser;
use crate::models::like::{self, Entity as Like};
use crate::models::video::{self, Entity as Video, VideoResponse};
use crate::response::ApiResponse;

use super::{subscriber_count, AppState};

/// Totals for the caller's channel. All zero for a new channel.
#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_videos: u64,
    pub total_views: i64,
    pub total_subscribers: u64,
    pub total_likes: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(channel_stats))
        .route("/videos", get(channel_videos))
}

/// Channel totals.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    responses(
        (status = 200, description = "Channel stats", body = ApiResponse<ChannelStats>)
    ),
    security(("bearer_auth" = [])),
    tag = "dashboard"
)]
pub async fn channel_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<ChannelStats>, VidtubeError> {
    let videos = Video::find()
        .filter(video::Column::OwnerId.eq(user_id))
        .all(&state.db)
        .await?;

    let total_videos = videos.len() as u64;
    let total_views = videos.iter().map(|v| v.views).sum();
    let video_ids: Vec<Uuid> = videos.iter().map(|v| v.id).collect();

    let total_likes = if video_ids.is_empty() {
        0
    } else {
        Like::find()
            .filter(like::Column::VideoId.is_in(video_ids))
            .count(&state.db)
            .await?
    };

    Ok(ApiResponse::success(ChannelStats {
        total_videos,
        total_views,
        total_subscribers: subscriber_count(&state.db, user_id).await?,
        total_likes,
    })
    .with_message("Channel stats fetched successfully"))
}

/// Every video on the caller's channel, published or not.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/videos",
    responses(
        (status = 200, description = "Channel videos", body = ApiResponse<Vec<VideoResponse>>)
    ),
    security(("bearer_auth" = [])),
    tag = "dashboard"
)]
pub async fn channel_videos(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<Vec<VideoResponse>>, VidtubeError> {
    let videos = Video::find()
        .filter(video::Column::OwnerId.eq(user_id))
        .order_by_desc(video::Column::CreatedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .map(VideoResponse::from)
        .collect();

    Ok(ApiResponse::success(videos).with_message("Channel videos fetched successfully"))
}
