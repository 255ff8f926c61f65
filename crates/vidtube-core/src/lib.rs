//! vidtube: REST backend for a video sharing platform.
//!
//! Accounts with rotating access/refresh sessions, video upload and playback
//! metadata, comments, likes, playlists, subscriptions and short posts, served
//! by axum over SeaORM.
//!
//! ```rust,no_run
//! use vidtube_core::{init_logging, App};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!     App::new().await?.run().await
//! }
//! ```

pub mod app;
pub mod auth;
pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod migrations;
pub mod models;
pub mod openapi;
pub mod response;
pub mod routing;
pub mod storage;
pub mod testing;

pub use app::App;
pub use auth::{SessionError, SessionManager};
pub use config::{Config, SessionConfig};
pub use error::VidtubeError;
pub use logging::{init_logging, init_logging_json, init_logging_with_level};
pub use response::ApiResponse;
pub use testing::{test_config, TestApp, TestClient, TestResponse, TestSession};
