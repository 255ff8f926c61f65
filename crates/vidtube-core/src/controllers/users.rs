use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Router;
use axum_extra::extract::cookie::CookieJar;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidateEmail};

use crate::auth::cookies::{clear_session_cookies, set_session_cookies, REFRESH_TOKEN_COOKIE};
use crate::auth::{hash_password, verify_password, CredentialPair, SessionError};
use crate::error::VidtubeError;
use crate::extractors::{AuthUser, Json};
use crate::models::subscription::{self, Entity as Subscription};
use crate::models::user::{self, Entity as User, UserResponse};
use crate::models::video::VideoWithOwner;
use crate::models::watch_history::{self, Entity as WatchHistory};
use crate::response::ApiResponse;
use crate::storage::{discard, store_upload};

use super::{
    is_subscribed, now, read_form, subscriber_count, videos_in_order, with_owners, AppState,
    Empty,
};

const IMAGE_TYPES: &[&str] = &["image/"];

// ── Request / Response types ──

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, message = "fullname is required"))]
    pub fullname: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
}

/// Public channel page.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: Uuid,
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub subscribers_count: u64,
    pub subscribed_to_count: u64,
    pub is_subscribed: bool,
}

// ── Routes ──

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route("/avatar", patch(update_avatar))
        .route("/cover-image", patch(update_cover_image))
        .route("/channel/{username}", get(channel_profile))
        .route("/watch-history", get(watch_history))
}

async fn load_user(state: &AppState, id: Uuid) -> Result<user::Model, VidtubeError> {
    User::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| VidtubeError::NotFound("User not found".to_string()))
}

fn check_password_length(state: &AppState, password: &str) -> Result<(), VidtubeError> {
    let min = state.config.session.min_password_length;
    if password.len() < min {
        return Err(VidtubeError::Validation(format!(
            "Password must be at least {} characters",
            min
        )));
    }
    Ok(())
}

// ── Handlers ──

/// Register a new user (multipart: fullname, email, username, password, avatar, coverImage).
#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    responses(
        (status = 201, description = "User registered", body = ApiResponse<UserResponse>),
        (status = 400, description = "Missing field or avatar"),
        (status = 409, description = "Username or email already taken")
    ),
    tag = "users"
)]
pub async fn register(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserResponse>, VidtubeError> {
    let mut form = read_form(&state, multipart).await?;

    let (Some(fullname), Some(email), Some(username), Some(password)) = (
        form.text("fullname"),
        form.text("email"),
        form.text("username"),
        form.text("password"),
    ) else {
        return Err(VidtubeError::BadRequest("All fields are required".to_string()));
    };
    let email = email.to_lowercase();
    let username = username.to_lowercase();

    if !email.validate_email() {
        return Err(VidtubeError::Validation(
            "email must be a valid email address".to_string(),
        ));
    }
    check_password_length(&state, &password)?;

    let existing = User::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(username.as_str()))
                .add(user::Column::Email.eq(email.as_str())),
        )
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(VidtubeError::Conflict(
            "User with email or username already exists".to_string(),
        ));
    }

    let avatar_part = form
        .take_file("avatar")
        .ok_or_else(|| VidtubeError::BadRequest("Avatar file is required".to_string()))?;
    let password_hash = hash_password(&password)?;

    let avatar = store_upload(state.storage.as_ref(), &avatar_part, IMAGE_TYPES).await?;
    let cover = match form.take_file("coverImage") {
        Some(part) => match store_upload(state.storage.as_ref(), &part, IMAGE_TYPES).await {
            Ok(media) => Some(media),
            Err(e) => {
                discard(state.storage.as_ref(), &avatar.key).await;
                return Err(e);
            }
        },
        None => None,
    };

    let now = now();
    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        fullname: Set(fullname),
        avatar_url: Set(avatar.url.clone()),
        avatar_key: Set(avatar.key.clone()),
        cover_image_url: Set(cover.as_ref().map(|c| c.url.clone())),
        cover_image_key: Set(cover.as_ref().map(|c| c.key.clone())),
        password_hash: Set(password_hash),
        refresh_token_hash: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let user = match new_user.insert(&state.db).await {
        Ok(user) => user,
        Err(e) => {
            discard(state.storage.as_ref(), &avatar.key).await;
            if let Some(cover) = &cover {
                discard(state.storage.as_ref(), &cover.key).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(user_id = %user.id, "registered user");
    Ok(ApiResponse::created(UserResponse::from(user)).with_message("User registered successfully"))
}

/// Log in with username or email and password.
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; credential cookies set", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Wrong password"),
        (status = 404, description = "User does not exist")
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), VidtubeError> {
    let identifiers: Vec<&str> = [payload.username.as_deref(), payload.email.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if identifiers.is_empty() {
        return Err(VidtubeError::BadRequest(
            "Username or email is required".to_string(),
        ));
    }

    // Either field may name the account; a wrong password stops the search.
    let mut attempt = Err(SessionError::NotFound);
    for identifier in identifiers {
        attempt = state
            .sessions
            .authenticate_by_secret(identifier, &payload.password)
            .await;
        if !matches!(attempt, Err(SessionError::NotFound)) {
            break;
        }
    }
    let issued = attempt?;
    let user = load_user(&state, issued.principal_id).await?;

    let jar = set_session_cookies(jar, &issued.credentials);
    let CredentialPair {
        access_token,
        refresh_token,
    } = issued.credentials;

    Ok((
        jar,
        ApiResponse::success(LoginResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token,
        })
        .with_message("User logged in successfully"),
    ))
}

/// Log out: revoke the refresh credential and clear both cookies.
#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<Empty>),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<Empty>), VidtubeError> {
    state.sessions.revoke(user_id).await?;
    Ok((
        clear_session_cookies(jar),
        ApiResponse::success(Empty {}).with_message("User logged out"),
    ))
}

/// Exchange the refresh credential (cookie, or `refreshToken` in the body) for a new pair.
#[utoipa::path(
    post,
    path = "/api/v1/users/refresh-token",
    request_body(content = RefreshRequest, description = "Only read when the refreshToken cookie is absent"),
    responses(
        (status = 200, description = "Rotated", body = ApiResponse<CredentialPair>),
        (status = 401, description = "Missing, invalid, or superseded refresh credential")
    ),
    tag = "users"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, ApiResponse<CredentialPair>), VidtubeError> {
    let presented = jar
        .get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            serde_json::from_slice::<RefreshRequest>(&body)
                .ok()
                .and_then(|r| r.refresh_token)
        })
        .ok_or(SessionError::Unauthenticated)?;

    let pair = state.sessions.rotate(&presented).await?;
    Ok((
        set_session_cookies(jar, &pair),
        ApiResponse::success(pair).with_message("Access token refreshed"),
    ))
}

/// Change the caller's password.
#[utoipa::path(
    post,
    path = "/api/v1/users/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<Empty>),
        (status = 400, description = "Old password is wrong")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<Empty>, VidtubeError> {
    let user = load_user(&state, user_id).await?;

    if !verify_password(&payload.old_password, &user.password_hash)? {
        return Err(VidtubeError::BadRequest("Invalid old password".to_string()));
    }
    check_password_length(&state, &payload.new_password)?;

    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.updated_at = Set(now());
    active.update(&state.db).await?;

    Ok(ApiResponse::success(Empty {}).with_message("Password changed successfully"))
}

/// The authenticated user.
#[utoipa::path(
    get,
    path = "/api/v1/users/current-user",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn current_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<UserResponse>, VidtubeError> {
    let user = load_user(&state, user_id).await?;
    Ok(ApiResponse::success(UserResponse::from(user)))
}

/// Update fullname and email.
#[utoipa::path(
    patch,
    path = "/api/v1/users/update-account",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = ApiResponse<UserResponse>),
        (status = 409, description = "Email already in use"),
        (status = 422, description = "Validation failed")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<ApiResponse<UserResponse>, VidtubeError> {
    let payload = UpdateAccountRequest {
        fullname: payload.fullname.trim().to_string(),
        email: payload.email.trim().to_lowercase(),
    };
    payload.validate()?;

    let taken = User::find()
        .filter(user::Column::Email.eq(payload.email.as_str()))
        .filter(user::Column::Id.ne(user_id))
        .count(&state.db)
        .await?;
    if taken > 0 {
        return Err(VidtubeError::Conflict("Email is already in use".to_string()));
    }

    let mut active: user::ActiveModel = load_user(&state, user_id).await?.into();
    active.fullname = Set(payload.fullname);
    active.email = Set(payload.email);
    active.updated_at = Set(now());
    let user = active.update(&state.db).await?;

    Ok(ApiResponse::success(UserResponse::from(user))
        .with_message("Account details updated successfully"))
}

/// Replace the avatar (multipart field `avatar`).
#[utoipa::path(
    patch,
    path = "/api/v1/users/avatar",
    responses(
        (status = 200, description = "Avatar updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Avatar file is missing")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_avatar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserResponse>, VidtubeError> {
    let mut form = read_form(&state, multipart).await?;
    let part = form
        .take_file("avatar")
        .ok_or_else(|| VidtubeError::BadRequest("Avatar file is missing".to_string()))?;

    let user = load_user(&state, user_id).await?;
    let media = store_upload(state.storage.as_ref(), &part, IMAGE_TYPES).await?;
    let previous_key = user.avatar_key.clone();

    let mut active: user::ActiveModel = user.into();
    active.avatar_url = Set(media.url);
    active.avatar_key = Set(media.key);
    active.updated_at = Set(now());
    let user = active.update(&state.db).await?;

    discard(state.storage.as_ref(), &previous_key).await;
    Ok(ApiResponse::success(UserResponse::from(user)).with_message("Avatar updated successfully"))
}

/// Replace the cover image (multipart field `coverImage`).
#[utoipa::path(
    patch,
    path = "/api/v1/users/cover-image",
    responses(
        (status = 200, description = "Cover image updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Cover image file is missing")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_cover_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UserResponse>, VidtubeError> {
    let mut form = read_form(&state, multipart).await?;
    let part = form
        .take_file("coverImage")
        .ok_or_else(|| VidtubeError::BadRequest("Cover image file is missing".to_string()))?;

    let user = load_user(&state, user_id).await?;
    let media = store_upload(state.storage.as_ref(), &part, IMAGE_TYPES).await?;
    let previous_key = user.cover_image_key.clone();

    let mut active: user::ActiveModel = user.into();
    active.cover_image_url = Set(Some(media.url));
    active.cover_image_key = Set(Some(media.key));
    active.updated_at = Set(now());
    let user = active.update(&state.db).await?;

    if let Some(key) = previous_key {
        discard(state.storage.as_ref(), &key).await;
    }
    Ok(ApiResponse::success(UserResponse::from(user))
        .with_message("Cover image updated successfully"))
}

/// Channel page with subscriber counts.
#[utoipa::path(
    get,
    path = "/api/v1/users/channel/{username}",
    params(("username" = String, Path, description = "Channel username")),
    responses(
        (status = 200, description = "Channel profile", body = ApiResponse<ChannelProfile>),
        (status = 404, description = "Channel does not exist")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn channel_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(username): Path<String>,
) -> Result<ApiResponse<ChannelProfile>, VidtubeError> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(VidtubeError::BadRequest("Username is missing".to_string()));
    }

    let channel = User::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(|| VidtubeError::NotFound("Channel does not exist".to_string()))?;

    let subscribers_count = subscriber_count(&state.db, channel.id).await?;
    let subscribed_to_count = Subscription::find()
        .filter(subscription::Column::SubscriberId.eq(channel.id))
        .count(&state.db)
        .await?;
    let is_subscribed = is_subscribed(&state.db, user_id, channel.id).await?;

    Ok(ApiResponse::success(ChannelProfile {
        id: channel.id,
        username: channel.username,
        fullname: channel.fullname,
        email: channel.email,
        avatar: channel.avatar_url,
        cover_image: channel.cover_image_url,
        subscribers_count,
        subscribed_to_count,
        is_subscribed,
    }))
}

/// Videos the caller has watched, most recent first.
#[utoipa::path(
    get,
    path = "/api/v1/users/watch-history",
    responses(
        (status = 200, description = "Watch history", body = ApiResponse<Vec<VideoWithOwner>>)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn watch_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<Vec<VideoWithOwner>>, VidtubeError> {
    let entries = WatchHistory::find()
        .filter(watch_history::Column::UserId.eq(user_id))
        .order_by_desc(watch_history::Column::WatchedAt)
        .all(&state.db)
        .await?;

    // Repeat views collapse onto the latest one.
    let mut ids: Vec<Uuid> = Vec::with_capacity(entries.len());
    for entry in entries {
        if !ids.contains(&entry.video_id) {
            ids.push(entry.video_id);
        }
    }

    let videos = videos_in_order(&state.db, &ids, user_id).await?;
    Ok(ApiResponse::success(with_owners(&state.db, videos).await?)
        .with_message("Watch history fetched successfully"))
}
