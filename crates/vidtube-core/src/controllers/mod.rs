use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::multipart::{Multipart, MultipartRejection};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::SessionManager;
use crate::config::Config;
use crate::error::VidtubeError;
use crate::models::like::{self, Entity as Like};
use crate::models::subscription::{self, Entity as Subscription};
use crate::models::user::{self, Entity as User, OwnerSummary};
use crate::models::video::{self, Entity as Video, VideoResponse, VideoWithOwner};
use crate::storage::{MediaForm, StorageBackend};

/// Shared application state available in all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub sessions: SessionManager,
    pub storage: Arc<dyn StorageBackend>,
}

pub mod comments;
pub mod dashboard;
pub mod healthcheck;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

/// One page of a listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T: Serialize> {
    pub items: Vec<T>,
    pub page: u64,
    pub limit: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// Acknowledgement body for deletes and logout.
#[derive(Debug, Serialize, ToSchema)]
pub struct Empty {}

/// Parse a path identifier, answering 400 for anything that is not a UUID.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, VidtubeError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| VidtubeError::BadRequest(format!("Invalid {} id", what)))
}

/// Reject callers that do not own the resource.
pub(crate) fn ensure_owner(owner_id: Uuid, caller: Uuid, what: &str) -> Result<(), VidtubeError> {
    if owner_id != caller {
        return Err(VidtubeError::Forbidden(format!(
            "You are not the owner of this {}",
            what
        )));
    }
    Ok(())
}

/// Read a multipart body under the configured upload limit.
pub(crate) async fn read_form(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<MediaForm, VidtubeError> {
    let multipart = multipart.map_err(|e| VidtubeError::BadRequest(e.body_text()))?;
    MediaForm::parse(multipart, state.config.max_upload_size).await
}

pub(crate) fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Load users by id for embedding as owner cards.
pub(crate) async fn owners_by_id(
    db: &DatabaseConnection,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, OwnerSummary>, VidtubeError> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = User::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(users
        .iter()
        .map(|u| (u.id, OwnerSummary::from(u)))
        .collect())
}

/// Attach owner cards to a list of videos, keeping their order.
pub(crate) async fn with_owners(
    db: &DatabaseConnection,
    videos: Vec<video::Model>,
) -> Result<Vec<VideoWithOwner>, VidtubeError> {
    let owners = owners_by_id(db, videos.iter().map(|v| v.owner_id)).await?;
    Ok(videos
        .into_iter()
        .map(|v| VideoWithOwner {
            owner: owners.get(&v.owner_id).cloned(),
            video: VideoResponse::from(v),
        })
        .collect())
}

/// Load videos by id, keeping the order of `ids` and dropping ones that are
/// gone or that `viewer` may not see.
pub(crate) async fn videos_in_order(
    db: &DatabaseConnection,
    ids: &[Uuid],
    viewer: Uuid,
) -> Result<Vec<video::Model>, VidtubeError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut found: HashMap<Uuid, video::Model> = Video::find()
        .filter(video::Column::Id.is_in(ids.to_vec()))
        .all(db)
        .await?
        .into_iter()
        .filter(|v| v.visible_to(Some(viewer)))
        .map(|v| (v.id, v))
        .collect();
    Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
}

pub(crate) async fn subscriber_count(
    db: &DatabaseConnection,
    channel_id: Uuid,
) -> Result<u64, VidtubeError> {
    Ok(Subscription::find()
        .filter(subscription::Column::ChannelId.eq(channel_id))
        .count(db)
        .await?)
}

pub(crate) async fn is_subscribed(
    db: &DatabaseConnection,
    subscriber_id: Uuid,
    channel_id: Uuid,
) -> Result<bool, VidtubeError> {
    Ok(Subscription::find()
        .filter(subscription::Column::SubscriberId.eq(subscriber_id))
        .filter(subscription::Column::ChannelId.eq(channel_id))
        .count(db)
        .await?
        > 0)
}

/// Like counts keyed by target id for one of the like target columns.
pub(crate) async fn like_counts(
    db: &DatabaseConnection,
    target: like::Column,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, u64>, VidtubeError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let likes = Like::find().filter(target.is_in(ids)).all(db).await?;

    let mut counts = HashMap::new();
    for l in likes {
        let id = match target {
            like::Column::VideoId => l.video_id,
            like::Column::CommentId => l.comment_id,
            like::Column::TweetId => l.tweet_id,
            _ => None,
        };
        if let Some(id) = id {
            *counts.entry(id).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

pub(crate) fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 { 0 } else { total.div_ceil(limit) }
}
