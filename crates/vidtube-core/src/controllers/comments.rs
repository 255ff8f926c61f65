use axum::extract::{Path, State};
use axum::routing::{get, patch};
use axum::Router;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::VidtubeError;
use crate::extractors::{AuthUser, Json, MaybeAuthUser, Pagination};
use crate::models::comment::{self, CommentResponse, Entity as Comment};
use crate::models::like::{self, Entity as Like};
use crate::models::user::OwnerSummary;
use crate::response::ApiResponse;

use super::videos::find_visible_video;
use super::{
    ensure_owner, like_counts, now, owners_by_id, parse_id, total_pages, AppState, Empty, Paged,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub content: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{video_id}", get(list_comments).post(add_comment))
        .route("/c/{comment_id}", patch(update_comment).delete(delete_comment))
}

fn response(c: comment::Model, owner: Option<OwnerSummary>, likes: u64) -> CommentResponse {
    CommentResponse {
        id: c.id,
        video_id: c.video_id,
        content: c.content,
        owner,
        likes,
        created_at: c.created_at,
        updated_at: c.updated_at,
    }
}

fn content_of(payload: CommentRequest) -> Result<String, VidtubeError> {
    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(VidtubeError::BadRequest("Comment content is required".to_string()));
    }
    Ok(content)
}

async fn find_comment(state: &AppState, id: Uuid) -> Result<comment::Model, VidtubeError> {
    Comment::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| VidtubeError::NotFound("Comment not found".to_string()))
}

/// Comments on a video, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/comments/{video_id}",
    params(("video_id" = String, Path, description = "Video id"), Pagination),
    responses(
        (status = 200, description = "Page of comments", body = ApiResponse<Paged<CommentResponse>>),
        (status = 404, description = "Video not found")
    ),
    tag = "comments"
)]
pub async fn list_comments(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(video_id): Path<String>,
    pagination: Pagination,
) -> Result<ApiResponse<Paged<CommentResponse>>, VidtubeError> {
    let video_id = parse_id(&video_id, "video")?;
    find_visible_video(&state, video_id, viewer).await?;

    let paginator = Comment::find()
        .filter(comment::Column::VideoId.eq(video_id))
        .order_by_desc(comment::Column::CreatedAt)
        .paginate(&state.db, pagination.limit);
    let total_items = paginator.num_items().await?;
    let comments = paginator.fetch_page(pagination.page_index()).await?;

    let owners = owners_by_id(&state.db, comments.iter().map(|c| c.owner_id)).await?;
    let likes = like_counts(
        &state.db,
        like::Column::CommentId,
        comments.iter().map(|c| c.id).collect(),
    )
    .await?;

    let items = comments
        .into_iter()
        .map(|c| {
            let owner = owners.get(&c.owner_id).cloned();
            let count = likes.get(&c.id).copied().unwrap_or(0);
            response(c, owner, count)
        })
        .collect();

    Ok(ApiResponse::success(Paged {
        items,
        page: pagination.page,
        limit: pagination.limit,
        total_items,
        total_pages: total_pages(total_items, pagination.limit),
    })
    .with_message("Comments fetched successfully"))
}

/// Comment on a video.
#[utoipa::path(
    post,
    path = "/api/v1/comments/{video_id}",
    params(("video_id" = String, Path, description = "Video id")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = ApiResponse<CommentResponse>),
        (status = 404, description = "Video not found")
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(video_id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> Result<ApiResponse<CommentResponse>, VidtubeError> {
    let video_id = parse_id(&video_id, "video")?;
    let content = content_of(payload)?;
    find_visible_video(&state, video_id, Some(user_id)).await?;

    let now = now();
    let comment = comment::ActiveModel {
        id: Set(Uuid::new_v4()),
        video_id: Set(video_id),
        owner_id: Set(user_id),
        content: Set(content),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    let owner = owners_by_id(&state.db, [user_id]).await?.remove(&user_id);
    Ok(ApiResponse::created(response(comment, owner, 0)).with_message("Comment added successfully"))
}

/// Edit a comment (owner only).
#[utoipa::path(
    patch,
    path = "/api/v1/comments/c/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment id")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = ApiResponse<CommentResponse>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Comment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn update_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(comment_id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> Result<ApiResponse<CommentResponse>, VidtubeError> {
    let comment_id = parse_id(&comment_id, "comment")?;
    let content = content_of(payload)?;
    let comment = find_comment(&state, comment_id).await?;
    ensure_owner(comment.owner_id, user_id, "comment")?;

    let mut active: comment::ActiveModel = comment.into();
    active.content = Set(content);
    active.updated_at = Set(now());
    let comment = active.update(&state.db).await?;

    let likes = Like::find()
        .filter(like::Column::CommentId.eq(comment_id))
        .count(&state.db)
        .await?;
    let owner = owners_by_id(&state.db, [user_id]).await?.remove(&user_id);
    Ok(ApiResponse::success(response(comment, owner, likes))
        .with_message("Comment updated successfully"))
}

/// Delete a comment and its likes (owner only).
#[utoipa::path(
    delete,
    path = "/api/v1/comments/c/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment deleted", body = ApiResponse<Empty>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Comment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<Empty>, VidtubeError> {
    let comment_id = parse_id(&comment_id, "comment")?;
    let comment = find_comment(&state, comment_id).await?;
    ensure_owner(comment.owner_id, user_id, "comment")?;

    Like::delete_many()
        .filter(like::Column::CommentId.eq(comment_id))
        .exec(&state.db)
        .await?;
    Comment::delete_by_id(comment_id).exec(&state.db).await?;

    Ok(ApiResponse::success(Empty {}).with_message("Comment deleted successfully"))
}
