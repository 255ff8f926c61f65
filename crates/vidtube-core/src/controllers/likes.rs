use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::VidtubeError;
use crate::extractors::AuthUser;
use crate::models::comment::Entity as Comment;
use crate::models::like::{self, Entity as Like};
use crate::models::tweet::Entity as Tweet;
use crate::models::video::{Entity as Video, VideoWithOwner};
use crate::response::ApiResponse;

use super::{now, parse_id, videos_in_order, with_owners, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeStatus {
    pub liked: bool,
}

/// What a like points at.
#[derive(Debug, Clone, Copy)]
enum Target {
    Video(Uuid),
    Comment(Uuid),
    Tweet(Uuid),
}

impl Target {
    fn id(self) -> Uuid {
        match self {
            Target::Video(id) | Target::Comment(id) | Target::Tweet(id) => id,
        }
    }

    fn column(self) -> like::Column {
        match self {
            Target::Video(_) => like::Column::VideoId,
            Target::Comment(_) => like::Column::CommentId,
            Target::Tweet(_) => like::Column::TweetId,
        }
    }

    async fn exists_for(self, state: &AppState, viewer: Uuid) -> Result<bool, VidtubeError> {
        Ok(match self {
            Target::Video(id) => Video::find_by_id(id)
                .one(&state.db)
                .await?
                .is_some_and(|v| v.visible_to(Some(viewer))),
            Target::Comment(id) => Comment::find_by_id(id).one(&state.db).await?.is_some(),
            Target::Tweet(id) => Tweet::find_by_id(id).one(&state.db).await?.is_some(),
        })
    }

    fn label(self) -> &'static str {
        match self {
            Target::Video(_) => "Video",
            Target::Comment(_) => "Comment",
            Target::Tweet(_) => "Tweet",
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/toggle/v/{video_id}", post(toggle_video_like))
        .route("/toggle/c/{comment_id}", post(toggle_comment_like))
        .route("/toggle/t/{tweet_id}", post(toggle_tweet_like))
        .route("/videos", get(liked_videos))
}

/// Remove the caller's like on `target` if present, otherwise add one.
async fn toggle(state: &AppState, user_id: Uuid, target: Target) -> Result<bool, VidtubeError> {
    if !target.exists_for(state, user_id).await? {
        return Err(VidtubeError::NotFound(format!("{} not found", target.label())));
    }

    let existing = Like::find()
        .filter(like::Column::LikedBy.eq(user_id))
        .filter(target.column().eq(target.id()))
        .one(&state.db)
        .await?;

    if let Some(existing) = existing {
        Like::delete_by_id(existing.id).exec(&state.db).await?;
        return Ok(false);
    }

    let (video_id, comment_id, tweet_id) = match target {
        Target::Video(id) => (Some(id), None, None),
        Target::Comment(id) => (None, Some(id), None),
        Target::Tweet(id) => (None, None, Some(id)),
    };
    like::ActiveModel {
        id: Set(Uuid::new_v4()),
        liked_by: Set(user_id),
        video_id: Set(video_id),
        comment_id: Set(comment_id),
        tweet_id: Set(tweet_id),
        created_at: Set(now()),
    }
    .insert(&state.db)
    .await?;
    Ok(true)
}

fn status(liked: bool) -> ApiResponse<LikeStatus> {
    let message = if liked { "Liked" } else { "Like removed" };
    ApiResponse::success(LikeStatus { liked }).with_message(message)
}

/// Like or unlike a video.
#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/v/{video_id}",
    params(("video_id" = String, Path, description = "Video id")),
    responses(
        (status = 200, description = "New like state", body = ApiResponse<LikeStatus>),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = [])),
    tag = "likes"
)]
pub async fn toggle_video_like(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<LikeStatus>, VidtubeError> {
    let target = Target::Video(parse_id(&video_id, "video")?);
    Ok(status(toggle(&state, user_id, target).await?))
}

/// Like or unlike a comment.
#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/c/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment id")),
    responses(
        (status = 200, description = "New like state", body = ApiResponse<LikeStatus>),
        (status = 404, description = "Comment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "likes"
)]
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<LikeStatus>, VidtubeError> {
    let target = Target::Comment(parse_id(&comment_id, "comment")?);
    Ok(status(toggle(&state, user_id, target).await?))
}

/// Like or unlike a tweet.
#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/t/{tweet_id}",
    params(("tweet_id" = String, Path, description = "Tweet id")),
    responses(
        (status = 200, description = "New like state", body = ApiResponse<LikeStatus>),
        (status = 404, description = "Tweet not found")
    ),
    security(("bearer_auth" = [])),
    tag = "likes"
)]
pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<LikeStatus>, VidtubeError> {
    let target = Target::Tweet(parse_id(&tweet_id, "tweet")?);
    Ok(status(toggle(&state, user_id, target).await?))
}

/// Videos the caller has liked, most recent like first.
#[utoipa::path(
    get,
    path = "/api/v1/likes/videos",
    responses(
        (status = 200, description = "Liked videos", body = ApiResponse<Vec<VideoWithOwner>>)
    ),
    security(("bearer_auth" = [])),
    tag = "likes"
)]
pub async fn liked_videos(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<Vec<VideoWithOwner>>, VidtubeError> {
    let ids: Vec<Uuid> = Like::find()
        .filter(like::Column::LikedBy.eq(user_id))
        .filter(like::Column::VideoId.is_not_null())
        .order_by_desc(like::Column::CreatedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .filter_map(|l| l.video_id)
        .collect();

    let videos = videos_in_order(&state.db, &ids, user_id).await?;
    Ok(ApiResponse::success(with_owners(&state.db, videos).await?)
        .with_message("Liked videos fetched successfully"))
}
