use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Path, RawQuery, State};
use axum::routing::{get, patch};
use axum::Router;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::VidtubeError;
use crate::extractors::{AuthUser, MaybeAuthUser};
use crate::models::comment::{self, Entity as Comment};
use crate::models::like::{self, Entity as Like};
use crate::models::playlist_video::{self, Entity as PlaylistVideo};
use crate::models::video::{self, Entity as Video, VideoResponse, VideoWithOwner};
use crate::models::watch_history::{self, Entity as WatchHistory};
use crate::models::user::Entity as User;
use crate::response::ApiResponse;
use crate::storage::{discard, store_upload, StoredMedia};

use super::{
    ensure_owner, is_subscribed, now, parse_id, read_form, subscriber_count, total_pages,
    with_owners, AppState, Empty, Paged,
};

const VIDEO_TYPES: &[&str] = &["video/"];
const IMAGE_TYPES: &[&str] = &["image/"];
const MAX_PAGE_SIZE: u64 = 20;

// ── Request / Response types ──

/// Query string for `GET /videos`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Case-insensitive title filter
    pub query: Option<String>,
    /// createdAt | views | duration | title
    pub sort_by: Option<String>,
    /// asc | desc
    pub sort_type: Option<String>,
    /// Only this channel's videos
    pub user_id: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    10
}

/// Channel card on the watch page.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCard {
    pub id: Uuid,
    pub username: String,
    pub fullname: String,
    pub avatar: String,
    pub subscribers_count: u64,
    pub is_subscribed: bool,
}

/// Everything the watch page needs.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: VideoResponse,
    pub likes: u64,
    pub is_liked: bool,
    pub comments_count: u64,
    pub owner: Option<ChannelCard>,
}

// ── Routes ──

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_videos).post(publish_video))
        .route(
            "/{video_id}",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/toggle/publish/{video_id}", patch(toggle_publish))
}

pub(crate) async fn find_video(state: &AppState, id: Uuid) -> Result<video::Model, VidtubeError> {
    Video::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| VidtubeError::NotFound("Video not found".to_string()))
}

/// Like [`find_video`], but an unpublished video is a 404 for anyone except
/// its owner.
pub(crate) async fn find_visible_video(
    state: &AppState,
    id: Uuid,
    viewer: Option<Uuid>,
) -> Result<video::Model, VidtubeError> {
    let video = find_video(state, id).await?;
    if !video.visible_to(viewer) {
        return Err(VidtubeError::NotFound("Video not found".to_string()));
    }
    Ok(video)
}

fn sort_column(sort_by: Option<&str>) -> Result<video::Column, VidtubeError> {
    match sort_by.unwrap_or("createdAt") {
        "createdAt" => Ok(video::Column::CreatedAt),
        "views" => Ok(video::Column::Views),
        "duration" => Ok(video::Column::Duration),
        "title" => Ok(video::Column::Title),
        other => Err(VidtubeError::BadRequest(format!(
            "Invalid sortBy '{}'. Allowed: createdAt, views, duration, title",
            other
        ))),
    }
}

fn sort_order(sort_type: Option<&str>) -> Result<Order, VidtubeError> {
    match sort_type.unwrap_or("desc").to_lowercase().as_str() {
        "asc" => Ok(Order::Asc),
        "desc" => Ok(Order::Desc),
        other => Err(VidtubeError::BadRequest(format!(
            "Invalid sortType '{}'. Allowed: asc, desc",
            other
        ))),
    }
}

// ── Handlers ──

/// List published videos, optionally filtered by title or channel.
#[utoipa::path(
    get,
    path = "/api/v1/videos",
    params(VideoListQuery),
    responses(
        (status = 200, description = "Page of videos", body = ApiResponse<Paged<VideoWithOwner>>),
        (status = 400, description = "Invalid paging or sort parameters")
    ),
    tag = "videos"
)]
pub async fn list_videos(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    RawQuery(query): RawQuery,
) -> Result<ApiResponse<Paged<VideoWithOwner>>, VidtubeError> {
    let params: VideoListQuery = serde_urlencoded::from_str(query.as_deref().unwrap_or(""))
        .map_err(|e| VidtubeError::BadRequest(format!("Invalid query: {}", e)))?;

    if params.page < 1 {
        return Err(VidtubeError::BadRequest("Invalid page number".to_string()));
    }
    if params.limit < 1 || params.limit > MAX_PAGE_SIZE {
        return Err(VidtubeError::BadRequest(format!(
            "Invalid limit, maximum limit is {}",
            MAX_PAGE_SIZE
        )));
    }
    let column = sort_column(params.sort_by.as_deref())?;
    let order = sort_order(params.sort_type.as_deref())?;

    let mut select = Video::find();

    let channel = match params.user_id.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => Some(parse_id(raw, "user")?),
        None => None,
    };
    match channel {
        Some(channel) => {
            select = select.filter(video::Column::OwnerId.eq(channel));
            if viewer != Some(channel) {
                select = select.filter(video::Column::IsPublished.eq(true));
            }
        }
        None => select = select.filter(video::Column::IsPublished.eq(true)),
    }

    if let Some(q) = params.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col(video::Column::Title)))
                .like(format!("%{}%", q.to_lowercase())),
        );
    }

    let paginator = select
        .order_by(column, order)
        .order_by_desc(video::Column::Id)
        .paginate(&state.db, params.limit);
    let total_items = paginator.num_items().await?;
    let videos = paginator.fetch_page(params.page - 1).await?;

    Ok(ApiResponse::success(Paged {
        items: with_owners(&state.db, videos).await?,
        page: params.page,
        limit: params.limit,
        total_items,
        total_pages: total_pages(total_items, params.limit),
    })
    .with_message("Videos fetched successfully"))
}

/// Publish a video (multipart: videoFile, thumbnail, title, description, duration).
#[utoipa::path(
    post,
    path = "/api/v1/videos",
    responses(
        (status = 201, description = "Video published", body = ApiResponse<VideoResponse>),
        (status = 400, description = "Missing field or file")
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn publish_video(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<VideoResponse>, VidtubeError> {
    let mut form = read_form(&state, multipart).await?;

    let title = form.required_text("title")?;
    let description = form.required_text("description")?;
    let duration = match form.text("duration") {
        Some(raw) => raw
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or_else(|| VidtubeError::BadRequest("Invalid duration".to_string()))?,
        None => 0.0,
    };
    let video_part = form
        .take_file("videoFile")
        .ok_or_else(|| VidtubeError::BadRequest("Video file is required".to_string()))?;
    let thumbnail_part = form
        .take_file("thumbnail")
        .ok_or_else(|| VidtubeError::BadRequest("Thumbnail is required".to_string()))?;

    let storage = state.storage.as_ref();
    let video_file = store_upload(storage, &video_part, VIDEO_TYPES).await?;
    let thumbnail = match store_upload(storage, &thumbnail_part, IMAGE_TYPES).await {
        Ok(media) => media,
        Err(e) => {
            discard(storage, &video_file.key).await;
            return Err(e);
        }
    };

    let now = now();
    let new_video = video::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(user_id),
        title: Set(title),
        description: Set(description),
        video_url: Set(video_file.url.clone()),
        video_key: Set(video_file.key.clone()),
        thumbnail_url: Set(thumbnail.url.clone()),
        thumbnail_key: Set(thumbnail.key.clone()),
        duration: Set(duration),
        views: Set(0),
        is_published: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match new_video.insert(&state.db).await {
        Ok(video) => {
            tracing::info!(video_id = %video.id, owner_id = %user_id, "published video");
            Ok(ApiResponse::created(VideoResponse::from(video))
                .with_message("Video published successfully"))
        }
        Err(e) => {
            discard(storage, &video_file.key).await;
            discard(storage, &thumbnail.key).await;
            Err(e.into())
        }
    }
}

/// Watch a video: counts a view and records it in the caller's history.
#[utoipa::path(
    get,
    path = "/api/v1/videos/{video_id}",
    params(("video_id" = String, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video with owner and counts", body = ApiResponse<VideoDetail>),
        (status = 404, description = "Video not found")
    ),
    tag = "videos"
)]
pub async fn get_video(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<VideoDetail>, VidtubeError> {
    let video_id = parse_id(&video_id, "video")?;
    let mut video = find_visible_video(&state, video_id, viewer).await?;

    Video::update_many()
        .col_expr(video::Column::Views, Expr::col(video::Column::Views).add(1))
        .filter(video::Column::Id.eq(video_id))
        .exec(&state.db)
        .await?;
    video.views += 1;

    if let Some(viewer) = viewer {
        watch_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(viewer),
            video_id: Set(video_id),
            watched_at: Set(now()),
        }
        .insert(&state.db)
        .await?;
    }

    let likes = Like::find()
        .filter(like::Column::VideoId.eq(video_id))
        .count(&state.db)
        .await?;
    let is_liked = match viewer {
        Some(viewer) => {
            Like::find()
                .filter(like::Column::VideoId.eq(video_id))
                .filter(like::Column::LikedBy.eq(viewer))
                .count(&state.db)
                .await?
                > 0
        }
        None => false,
    };
    let comments_count = Comment::find()
        .filter(comment::Column::VideoId.eq(video_id))
        .count(&state.db)
        .await?;

    let owner = match User::find_by_id(video.owner_id).one(&state.db).await? {
        Some(owner) => Some(ChannelCard {
            subscribers_count: subscriber_count(&state.db, owner.id).await?,
            is_subscribed: match viewer {
                Some(viewer) => is_subscribed(&state.db, viewer, owner.id).await?,
                None => false,
            },
            id: owner.id,
            username: owner.username,
            fullname: owner.fullname,
            avatar: owner.avatar_url,
        }),
        None => None,
    };

    Ok(ApiResponse::success(VideoDetail {
        video: VideoResponse::from(video),
        likes,
        is_liked,
        comments_count,
        owner,
    })
    .with_message("Video fetched successfully"))
}

/// Update title, description and/or thumbnail (owner only).
#[utoipa::path(
    patch,
    path = "/api/v1/videos/{video_id}",
    params(("video_id" = String, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video updated", body = ApiResponse<VideoResponse>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn update_video(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<VideoResponse>, VidtubeError> {
    let video_id = parse_id(&video_id, "video")?;
    let mut form = read_form(&state, multipart).await?;

    let title = form.text("title");
    let description = form.text("description");
    let thumbnail_part = form.take_file("thumbnail");
    if title.is_none() && description.is_none() && thumbnail_part.is_none() {
        return Err(VidtubeError::BadRequest(
            "Provide a title, description or thumbnail to update".to_string(),
        ));
    }

    let video = find_video(&state, video_id).await?;
    ensure_owner(video.owner_id, user_id, "video")?;

    let thumbnail: Option<StoredMedia> = match &thumbnail_part {
        Some(part) => Some(store_upload(state.storage.as_ref(), part, IMAGE_TYPES).await?),
        None => None,
    };
    let previous_thumbnail = video.thumbnail_key.clone();

    let mut active: video::ActiveModel = video.into();
    if let Some(title) = title {
        active.title = Set(title);
    }
    if let Some(description) = description {
        active.description = Set(description);
    }
    if let Some(media) = &thumbnail {
        active.thumbnail_url = Set(media.url.clone());
        active.thumbnail_key = Set(media.key.clone());
    }
    active.updated_at = Set(now());
    let video = active.update(&state.db).await?;

    if thumbnail.is_some() {
        discard(state.storage.as_ref(), &previous_thumbnail).await;
    }
    Ok(ApiResponse::success(VideoResponse::from(video)).with_message("Video updated successfully"))
}

/// Delete a video with its comments, likes, playlist entries and history (owner only).
#[utoipa::path(
    delete,
    path = "/api/v1/videos/{video_id}",
    params(("video_id" = String, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video deleted", body = ApiResponse<Empty>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn delete_video(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Empty>, VidtubeError> {
    let video_id = parse_id(&video_id, "video")?;
    let video = find_video(&state, video_id).await?;
    ensure_owner(video.owner_id, user_id, "video")?;

    let comment_ids: Vec<Uuid> = Comment::find()
        .filter(comment::Column::VideoId.eq(video_id))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();
    if !comment_ids.is_empty() {
        Like::delete_many()
            .filter(like::Column::CommentId.is_in(comment_ids))
            .exec(&state.db)
            .await?;
    }
    Comment::delete_many()
        .filter(comment::Column::VideoId.eq(video_id))
        .exec(&state.db)
        .await?;
    Like::delete_many()
        .filter(like::Column::VideoId.eq(video_id))
        .exec(&state.db)
        .await?;
    PlaylistVideo::delete_many()
        .filter(playlist_video::Column::VideoId.eq(video_id))
        .exec(&state.db)
        .await?;
    WatchHistory::delete_many()
        .filter(watch_history::Column::VideoId.eq(video_id))
        .exec(&state.db)
        .await?;
    Video::delete_by_id(video_id).exec(&state.db).await?;

    discard(state.storage.as_ref(), &video.video_key).await;
    discard(state.storage.as_ref(), &video.thumbnail_key).await;

    tracing::info!(%video_id, "deleted video");
    Ok(ApiResponse::success(Empty {}).with_message("Video deleted successfully"))
}

/// Flip the published flag (owner only).
#[utoipa::path(
    patch,
    path = "/api/v1/videos/toggle/publish/{video_id}",
    params(("video_id" = String, Path, description = "Video id")),
    responses(
        (status = 200, description = "Publish status toggled", body = ApiResponse<VideoResponse>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = [])),
    tag = "videos"
)]
pub async fn toggle_publish(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<VideoResponse>, VidtubeError> {
    let video_id = parse_id(&video_id, "video")?;
    let video = find_video(&state, video_id).await?;
    ensure_owner(video.owner_id, user_id, "video")?;

    let published = !video.is_published;
    let mut active: video::ActiveModel = video.into();
    active.is_published = Set(published);
    active.updated_at = Set(now());
    let video = active.update(&state.db).await?;

    Ok(ApiResponse::success(VideoResponse::from(video))
        .with_message("Video publish status toggled successfully"))
}
