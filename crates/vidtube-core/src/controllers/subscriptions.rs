use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::VidtubeError;
use crate::extractors::AuthUser;
use crate::models::subscription::{self, Entity as Subscription};
use crate::models::user::{Entity as User, OwnerSummary};
use crate::response::ApiResponse;

use super::{now, owners_by_id, parse_id, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionStatus {
    pub subscribed: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/c/{channel_id}",
            get(channel_subscribers).post(toggle_subscription),
        )
        .route("/u/{subscriber_id}", get(subscribed_channels))
}

async fn ensure_user_exists(state: &AppState, id: Uuid, what: &str) -> Result<(), VidtubeError> {
    if User::find_by_id(id).one(&state.db).await?.is_none() {
        return Err(VidtubeError::NotFound(format!("{} not found", what)));
    }
    Ok(())
}

/// Users in `ids`, in that order.
async fn summaries(state: &AppState, ids: Vec<Uuid>) -> Result<Vec<OwnerSummary>, VidtubeError> {
    let mut found = owners_by_id(&state.db, ids.iter().copied()).await?;
    Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
}

/// Subscribe to or unsubscribe from a channel.
#[utoipa::path(
    post,
    path = "/api/v1/subscriptions/c/{channel_id}",
    params(("channel_id" = String, Path, description = "Channel (user) id")),
    responses(
        (status = 200, description = "New subscription state", body = ApiResponse<SubscriptionStatus>),
        (status = 400, description = "Cannot subscribe to yourself"),
        (status = 404, description = "Channel not found")
    ),
    security(("bearer_auth" = [])),
    tag = "subscriptions"
)]
pub async fn toggle_subscription(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<SubscriptionStatus>, VidtubeError> {
    let channel_id = parse_id(&channel_id, "channel")?;
    if channel_id == user_id {
        return Err(VidtubeError::BadRequest(
            "You cannot subscribe to your own channel".to_string(),
        ));
    }
    ensure_user_exists(&state, channel_id, "Channel").await?;

    let existing = Subscription::find()
        .filter(subscription::Column::SubscriberId.eq(user_id))
        .filter(subscription::Column::ChannelId.eq(channel_id))
        .one(&state.db)
        .await?;

    let subscribed = match existing {
        Some(existing) => {
            Subscription::delete_by_id(existing.id)
                .exec(&state.db)
                .await?;
            false
        }
        None => {
            subscription::ActiveModel {
                id: Set(Uuid::new_v4()),
                subscriber_id: Set(user_id),
                channel_id: Set(channel_id),
                created_at: Set(now()),
            }
            .insert(&state.db)
            .await?;
            true
        }
    };

    let message = if subscribed { "Subscribed" } else { "Unsubscribed" };
    Ok(ApiResponse::success(SubscriptionStatus { subscribed }).with_message(message))
}

/// Users subscribed to a channel.
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/c/{channel_id}",
    params(("channel_id" = String, Path, description = "Channel (user) id")),
    responses(
        (status = 200, description = "Subscribers", body = ApiResponse<Vec<OwnerSummary>>),
        (status = 404, description = "Channel not found")
    ),
    security(("bearer_auth" = [])),
    tag = "subscriptions"
)]
pub async fn channel_subscribers(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<Vec<OwnerSummary>>, VidtubeError> {
    let channel_id = parse_id(&channel_id, "channel")?;
    ensure_user_exists(&state, channel_id, "Channel").await?;

    let ids = Subscription::find()
        .filter(subscription::Column::ChannelId.eq(channel_id))
        .order_by_desc(subscription::Column::CreatedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|s| s.subscriber_id)
        .collect();

    Ok(ApiResponse::success(summaries(&state, ids).await?)
        .with_message("Subscribers fetched successfully"))
}

/// Channels a user is subscribed to.
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/u/{subscriber_id}",
    params(("subscriber_id" = String, Path, description = "Subscriber (user) id")),
    responses(
        (status = 200, description = "Subscribed channels", body = ApiResponse<Vec<OwnerSummary>>),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "subscriptions"
)]
pub async fn subscribed_channels(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(subscriber_id): Path<String>,
) -> Result<ApiResponse<Vec<OwnerSummary>>, VidtubeError> {
    let subscriber_id = parse_id(&subscriber_id, "subscriber")?;
    ensure_user_exists(&state, subscriber_id, "User").await?;

    let ids = Subscription::find()
        .filter(subscription::Column::SubscriberId.eq(subscriber_id))
        .order_by_desc(subscription::Column::CreatedAt)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|s| s.channel_id)
        .collect();

    Ok(ApiResponse::success(summaries(&state, ids).await?)
        .with_message("Subscribed channels fetched successfully"))
}
