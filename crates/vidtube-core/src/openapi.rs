use utoipa::OpenApi;

use crate::auth::CredentialPair;
use crate::controllers::{
    comments::CommentRequest,
    dashboard::ChannelStats,
    healthcheck::HealthStatus,
    likes::LikeStatus,
    playlists::{CreatePlaylistRequest, UpdatePlaylistRequest},
    subscriptions::SubscriptionStatus,
    tweets::TweetRequest,
    users::{
        ChangePasswordRequest, ChannelProfile, LoginRequest, LoginResponse, RefreshRequest,
        UpdateAccountRequest,
    },
    videos::{ChannelCard, VideoDetail},
    Empty,
};
use crate::error::{ErrorDetail, FieldError};
use crate::models::comment::CommentResponse;
use crate::models::playlist::{PlaylistDetail, PlaylistResponse};
use crate::models::tweet::TweetResponse;
use crate::models::user::{OwnerSummary, UserResponse};
use crate::models::video::{VideoResponse, VideoWithOwner};

/// OpenAPI document for every `/api/v1` route.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "vidtube API",
        version = "0.3.0",
        description = "Video sharing backend: accounts, videos, comments, likes, playlists, subscriptions and tweets."
    ),
    paths(
        crate::controllers::healthcheck::healthcheck,
        crate::controllers::users::register,
        crate::controllers::users::login,
        crate::controllers::users::logout,
        crate::controllers::users::refresh_token,
        crate::controllers::users::change_password,
        crate::controllers::users::current_user,
        crate::controllers::users::update_account,
        crate::controllers::users::update_avatar,
        crate::controllers::users::update_cover_image,
        crate::controllers::users::channel_profile,
        crate::controllers::users::watch_history,
        crate::controllers::videos::list_videos,
        crate::controllers::videos::publish_video,
        crate::controllers::videos::get_video,
        crate::controllers::videos::update_video,
        crate::controllers::videos::delete_video,
        crate::controllers::videos::toggle_publish,
        crate::controllers::comments::list_comments,
        crate::controllers::comments::add_comment,
        crate::controllers::comments::update_comment,
        crate::controllers::comments::delete_comment,
        crate::controllers::likes::toggle_video_like,
        crate::controllers::likes::toggle_comment_like,
        crate::controllers::likes::toggle_tweet_like,
        crate::controllers::likes::liked_videos,
        crate::controllers::subscriptions::toggle_subscription,
        crate::controllers::subscriptions::channel_subscribers,
        crate::controllers::subscriptions::subscribed_channels,
        crate::controllers::tweets::create_tweet,
        crate::controllers::tweets::user_tweets,
        crate::controllers::tweets::update_tweet,
        crate::controllers::tweets::delete_tweet,
        crate::controllers::playlists::create_playlist,
        crate::controllers::playlists::user_playlists,
        crate::controllers::playlists::get_playlist,
        crate::controllers::playlists::update_playlist,
        crate::controllers::playlists::delete_playlist,
        crate::controllers::playlists::add_video,
        crate::controllers::playlists::remove_video,
        crate::controllers::dashboard::channel_stats,
        crate::controllers::dashboard::channel_videos,
    ),
    components(
        schemas(
            ErrorDetail,
            FieldError,
            Empty,
            HealthStatus,
            LoginRequest,
            LoginResponse,
            RefreshRequest,
            CredentialPair,
            ChangePasswordRequest,
            UpdateAccountRequest,
            UserResponse,
            OwnerSummary,
            ChannelProfile,
            VideoResponse,
            VideoWithOwner,
            VideoDetail,
            ChannelCard,
            CommentRequest,
            CommentResponse,
            LikeStatus,
            SubscriptionStatus,
            TweetRequest,
            TweetResponse,
            CreatePlaylistRequest,
            UpdatePlaylistRequest,
            PlaylistResponse,
            PlaylistDetail,
            ChannelStats,
        )
    ),
    tags(
        (name = "healthcheck", description = "Liveness"),
        (name = "users", description = "Accounts and sessions"),
        (name = "videos", description = "Video upload and playback metadata"),
        (name = "comments", description = "Video comments"),
        (name = "likes", description = "Likes on videos, comments and tweets"),
        (name = "subscriptions", description = "Channel subscriptions"),
        (name = "tweets", description = "Short channel posts"),
        (name = "playlists", description = "User playlists"),
        (name = "dashboard", description = "Channel statistics")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add JWT Bearer security scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_session_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/users/login",
            "/api/v1/users/logout",
            "/api/v1/users/refresh-token",
            "/api/v1/videos/{video_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
