use axum::Router;

use crate::controllers::{
    comments, dashboard, healthcheck, likes, playlists, subscriptions, tweets, users, videos,
    AppState,
};

/// Path prefix every API route lives under.
pub const API_PREFIX: &str = "/api/v1";

/// Build the versioned API routes.
pub fn build_routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/healthcheck", healthcheck::routes())
        .nest("/users", users::routes())
        .nest("/videos", videos::routes())
        .nest("/comments", comments::routes())
        .nest("/likes", likes::routes())
        .nest("/subscriptions", subscriptions::routes())
        .nest("/tweets", tweets::routes())
        .nest("/playlist", playlists::routes())
        .nest("/dashboard", dashboard::routes());

    Router::new().nest(API_PREFIX, api)
}
