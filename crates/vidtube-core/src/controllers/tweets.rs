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
use crate::models::like::{self, Entity as Like};
use crate::models::tweet::{self, Entity as Tweet, TweetResponse};
use crate::models::user::Entity as User;
use crate::response::ApiResponse;

use super::{ensure_owner, like_counts, now, parse_id, AppState, Empty};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TweetRequest {
    pub content: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_tweet))
        .route("/user/{user_id}", get(user_tweets))
        .route("/{tweet_id}", patch(update_tweet).delete(delete_tweet))
}

fn response(t: tweet::Model, likes: u64) -> TweetResponse {
    TweetResponse {
        id: t.id,
        owner_id: t.owner_id,
        content: t.content,
        likes,
        created_at: t.created_at,
        updated_at: t.updated_at,
    }
}

fn content_of(payload: TweetRequest) -> Result<String, VidtubeError> {
    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(VidtubeError::BadRequest("Tweet content is required".to_string()));
    }
    Ok(content)
}

async fn owned_tweet(
    state: &AppState,
    tweet_id: Uuid,
    user_id: Uuid,
) -> Result<tweet::Model, VidtubeError> {
    let tweet = Tweet::find_by_id(tweet_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| VidtubeError::NotFound("Tweet not found".to_string()))?;
    ensure_owner(tweet.owner_id, user_id, "tweet")?;
    Ok(tweet)
}

/// Post a tweet.
#[utoipa::path(
    post,
    path = "/api/v1/tweets",
    request_body = TweetRequest,
    responses(
        (status = 201, description = "Tweet created", body = ApiResponse<TweetResponse>),
        (status = 400, description = "Empty content")
    ),
    security(("bearer_auth" = [])),
    tag = "tweets"
)]
pub async fn create_tweet(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<TweetRequest>,
) -> Result<ApiResponse<TweetResponse>, VidtubeError> {
    let content = content_of(payload)?;

    let now = now();
    let tweet = tweet::ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(user_id),
        content: Set(content),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok(ApiResponse::created(response(tweet, 0)).with_message("Tweet created successfully"))
}

/// A user's tweets, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/tweets/user/{user_id}",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Tweets", body = ApiResponse<Vec<TweetResponse>>),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tweets"
)]
pub async fn user_tweets(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<TweetResponse>>, VidtubeError> {
    let user_id = parse_id(&user_id, "user")?;
    if User::find_by_id(user_id).one(&state.db).await?.is_none() {
        return Err(VidtubeError::NotFound("User not found".to_string()));
    }

    let tweets = Tweet::find()
        .filter(tweet::Column::OwnerId.eq(user_id))
        .order_by_desc(tweet::Column::CreatedAt)
        .all(&state.db)
        .await?;
    let likes = like_counts(
        &state.db,
        like::Column::TweetId,
        tweets.iter().map(|t| t.id).collect(),
    )
    .await?;

    let items = tweets
        .into_iter()
        .map(|t| {
            let count = likes.get(&t.id).copied().unwrap_or(0);
            response(t, count)
        })
        .collect();
    Ok(ApiResponse::success(items).with_message("Tweets fetched successfully"))
}

/// Edit a tweet (owner only).
#[utoipa::path(
    patch,
    path = "/api/v1/tweets/{tweet_id}",
    params(("tweet_id" = String, Path, description = "Tweet id")),
    request_body = TweetRequest,
    responses(
        (status = 200, description = "Tweet updated", body = ApiResponse<TweetResponse>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Tweet not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tweets"
)]
pub async fn update_tweet(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(tweet_id): Path<String>,
    Json(payload): Json<TweetRequest>,
) -> Result<ApiResponse<TweetResponse>, VidtubeError> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;
    let content = content_of(payload)?;
    let tweet = owned_tweet(&state, tweet_id, user_id).await?;

    let mut active: tweet::ActiveModel = tweet.into();
    active.content = Set(content);
    active.updated_at = Set(now());
    let tweet = active.update(&state.db).await?;

    let likes = Like::find()
        .filter(like::Column::TweetId.eq(tweet_id))
        .count(&state.db)
        .await?;
    Ok(ApiResponse::success(response(tweet, likes)).with_message("Tweet updated successfully"))
}

/// Delete a tweet and its likes (owner only).
#[utoipa::path(
    delete,
    path = "/api/v1/tweets/{tweet_id}",
    params(("tweet_id" = String, Path, description = "Tweet id")),
    responses(
        (status = 200, description = "Tweet deleted", body = ApiResponse<Empty>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Tweet not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tweets"
)]
pub async fn delete_tweet(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<Empty>, VidtubeError> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;
    owned_tweet(&state, tweet_id, user_id).await?;

    Like::delete_many()
        .filter(like::Column::TweetId.eq(tweet_id))
        .exec(&state.db)
        .await?;
    Tweet::delete_by_id(tweet_id).exec(&state.db).await?;

    Ok(ApiResponse::success(Empty {}).with_message("Tweet deleted successfully"))
}
