use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Router;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::VidtubeError;
use crate::extractors::{AuthUser, Json};
use crate::models::playlist::{self, Entity as Playlist, PlaylistDetail, PlaylistResponse};
use crate::models::playlist_video::{self, Entity as PlaylistVideo};
use crate::models::user::{Entity as User, OwnerSummary};
use crate::models::video::VideoResponse;
use crate::response::ApiResponse;

use super::videos::find_visible_video;
use super::{ensure_owner, now, owners_by_id, parse_id, videos_in_order, AppState, Empty};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePlaylistRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route("/user/{user_id}", get(user_playlists))
        .route(
            "/{playlist_id}",
            get(get_playlist)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
        .route("/add/{video_id}/{playlist_id}", patch(add_video))
        .route("/remove/{video_id}/{playlist_id}", patch(remove_video))
}

async fn find_playlist(state: &AppState, id: Uuid) -> Result<playlist::Model, VidtubeError> {
    Playlist::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| VidtubeError::NotFound("Playlist not found".to_string()))
}

async fn member_ids(state: &AppState, playlist_id: Uuid) -> Result<Vec<Uuid>, VidtubeError> {
    Ok(PlaylistVideo::find()
        .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
        .order_by_asc(playlist_video::Column::AddedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|m| m.video_id)
        .collect())
}

fn summary(p: playlist::Model, owner: Option<OwnerSummary>, total_videos: u64) -> PlaylistResponse {
    PlaylistResponse {
        id: p.id,
        name: p.name,
        description: p.description,
        owner,
        total_videos,
        created_at: p.created_at,
        updated_at: p.updated_at,
    }
}

/// Playlist with the videos `viewer` may see.
async fn detail(
    state: &AppState,
    playlist: playlist::Model,
    viewer: Uuid,
) -> Result<PlaylistDetail, VidtubeError> {
    let ids = member_ids(state, playlist.id).await?;
    let videos: Vec<VideoResponse> = videos_in_order(&state.db, &ids, viewer)
        .await?
        .into_iter()
        .map(VideoResponse::from)
        .collect();
    let owner = owners_by_id(&state.db, [playlist.owner_id])
        .await?
        .remove(&playlist.owner_id);

    Ok(PlaylistDetail {
        playlist: summary(playlist, owner, videos.len() as u64),
        videos,
    })
}

/// Create a playlist.
#[utoipa::path(
    post,
    path = "/api/v1/playlist",
    request_body = CreatePlaylistRequest,
    responses(
        (status = 201, description = "Playlist created", body = ApiResponse<PlaylistResponse>),
        (status = 400, description = "Name is required")
    ),
    security(("bearer_auth" = [])),
    tag = "playlists"
)]
pub async fn create_playlist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreatePlaylistRequest>,
) -> Result<ApiResponse<PlaylistResponse>, VidtubeError> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(VidtubeError::BadRequest("Playlist name is required".to_string()));
    }

    let now = now();
    let playlist = playlist::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(user_id),
        name: Set(name),
        description: Set(payload.description.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    let owner = owners_by_id(&state.db, [user_id]).await?.remove(&user_id);
    Ok(ApiResponse::created(summary(playlist, owner, 0))
        .with_message("Playlist created successfully"))
}

/// A user's playlists.
#[utoipa::path(
    get,
    path = "/api/v1/playlist/user/{user_id}",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Playlists", body = ApiResponse<Vec<PlaylistResponse>>),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "playlists"
)]
pub async fn user_playlists(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<PlaylistResponse>>, VidtubeError> {
    let user_id = parse_id(&user_id, "user")?;
    let owner = User::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| VidtubeError::NotFound("User not found".to_string()))?;
    let owner = OwnerSummary::from(&owner);

    let playlists = Playlist::find()
        .filter(playlist::Column::OwnerId.eq(user_id))
        .order_by_desc(playlist::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let mut items = Vec::with_capacity(playlists.len());
    for p in playlists {
        let total = PlaylistVideo::find()
            .filter(playlist_video::Column::PlaylistId.eq(p.id))
            .count(&state.db)
            .await?;
        items.push(summary(p, Some(owner.clone()), total));
    }
    Ok(ApiResponse::success(items).with_message("Playlists fetched successfully"))
}

/// A playlist with its videos.
#[utoipa::path(
    get,
    path = "/api/v1/playlist/{playlist_id}",
    params(("playlist_id" = String, Path, description = "Playlist id")),
    responses(
        (status = 200, description = "Playlist", body = ApiResponse<PlaylistDetail>),
        (status = 404, description = "Playlist not found")
    ),
    security(("bearer_auth" = [])),
    tag = "playlists"
)]
pub async fn get_playlist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<PlaylistDetail>, VidtubeError> {
    let playlist = find_playlist(&state, parse_id(&playlist_id, "playlist")?).await?;
    Ok(ApiResponse::success(detail(&state, playlist, user_id).await?)
        .with_message("Playlist fetched successfully"))
}

/// Rename or re-describe a playlist (owner only).
#[utoipa::path(
    patch,
    path = "/api/v1/playlist/{playlist_id}",
    params(("playlist_id" = String, Path, description = "Playlist id")),
    request_body = UpdatePlaylistRequest,
    responses(
        (status = 200, description = "Playlist updated", body = ApiResponse<PlaylistDetail>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Playlist not found")
    ),
    security(("bearer_auth" = [])),
    tag = "playlists"
)]
pub async fn update_playlist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(playlist_id): Path<String>,
    Json(payload): Json<UpdatePlaylistRequest>,
) -> Result<ApiResponse<PlaylistDetail>, VidtubeError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let description = payload.description.map(|d| d.trim().to_string());
    if name.is_none() && description.is_none() {
        return Err(VidtubeError::BadRequest(
            "Provide a name or description to update".to_string(),
        ));
    }

    let playlist = find_playlist(&state, playlist_id).await?;
    ensure_owner(playlist.owner_id, user_id, "playlist")?;

    let mut active: playlist::ActiveModel = playlist.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(description) = description {
        active.description = Set(description);
    }
    active.updated_at = Set(now());
    let playlist = active.update(&state.db).await?;

    Ok(ApiResponse::success(detail(&state, playlist, user_id).await?)
        .with_message("Playlist updated successfully"))
}

/// Delete a playlist (owner only). Its videos are untouched.
#[utoipa::path(
    delete,
    path = "/api/v1/playlist/{playlist_id}",
    params(("playlist_id" = String, Path, description = "Playlist id")),
    responses(
        (status = 200, description = "Playlist deleted", body = ApiResponse<Empty>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Playlist not found")
    ),
    security(("bearer_auth" = [])),
    tag = "playlists"
)]
pub async fn delete_playlist(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<Empty>, VidtubeError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    let playlist = find_playlist(&state, playlist_id).await?;
    ensure_owner(playlist.owner_id, user_id, "playlist")?;

    PlaylistVideo::delete_many()
        .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
        .exec(&state.db)
        .await?;
    Playlist::delete_by_id(playlist_id).exec(&state.db).await?;

    Ok(ApiResponse::success(Empty {}).with_message("Playlist deleted successfully"))
}

/// Add a video to a playlist (owner only).
#[utoipa::path(
    patch,
    path = "/api/v1/playlist/add/{video_id}/{playlist_id}",
    params(
        ("video_id" = String, Path, description = "Video id"),
        ("playlist_id" = String, Path, description = "Playlist id")
    ),
    responses(
        (status = 200, description = "Video added", body = ApiResponse<PlaylistDetail>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Video or playlist not found"),
        (status = 409, description = "Video already in playlist")
    ),
    security(("bearer_auth" = [])),
    tag = "playlists"
)]
pub async fn add_video(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<PlaylistDetail>, VidtubeError> {
    let video_id = parse_id(&video_id, "video")?;
    let playlist_id = parse_id(&playlist_id, "playlist")?;

    let playlist = find_playlist(&state, playlist_id).await?;
    ensure_owner(playlist.owner_id, user_id, "playlist")?;
    find_visible_video(&state, video_id, Some(user_id)).await?;

    let present = PlaylistVideo::find()
        .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
        .filter(playlist_video::Column::VideoId.eq(video_id))
        .count(&state.db)
        .await?;
    if present > 0 {
        return Err(VidtubeError::Conflict(
            "Video is already in the playlist".to_string(),
        ));
    }

    playlist_video::ActiveModel {
        id: Set(Uuid::new_v4()),
        playlist_id: Set(playlist_id),
        video_id: Set(video_id),
        added_at: Set(now()),
    }
    .insert(&state.db)
    .await?;

    Ok(ApiResponse::success(detail(&state, playlist, user_id).await?)
        .with_message("Video added to playlist"))
}

/// Remove a video from a playlist (owner only).
#[utoipa::path(
    patch,
    path = "/api/v1/playlist/remove/{video_id}/{playlist_id}",
    params(
        ("video_id" = String, Path, description = "Video id"),
        ("playlist_id" = String, Path, description = "Playlist id")
    ),
    responses(
        (status = 200, description = "Video removed", body = ApiResponse<PlaylistDetail>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Playlist not found or video not in it")
    ),
    security(("bearer_auth" = [])),
    tag = "playlists"
)]
pub async fn remove_video(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<PlaylistDetail>, VidtubeError> {
    let video_id = parse_id(&video_id, "video")?;
    let playlist_id = parse_id(&playlist_id, "playlist")?;

    let playlist = find_playlist(&state, playlist_id).await?;
    ensure_owner(playlist.owner_id, user_id, "playlist")?;

    let removed = PlaylistVideo::delete_many()
        .filter(playlist_video::Column::PlaylistId.eq(playlist_id))
        .filter(playlist_video::Column::VideoId.eq(video_id))
        .exec(&state.db)
        .await?;
    if removed.rows_affected == 0 {
        return Err(VidtubeError::NotFound(
            "Video is not in the playlist".to_string(),
        ));
    }

    Ok(ApiResponse::success(detail(&state, playlist, user_id).await?)
        .with_message("Video removed from playlist"))
}
