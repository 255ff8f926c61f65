use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::auth::{SeaPrincipalStore, SessionManager};
use crate::config::Config;
use crate::controllers::AppState;
use crate::migrations::Migrator;
use crate::openapi::ApiDoc;
use crate::routing;
use crate::storage::{LocalStorage, StorageBackend};

const API_DOCS_PATH: &str = "/api-docs";

/// The vidtube application: config, database and media store, wired into an
/// axum router.
pub struct App {
    pub config: Config,
    pub db: DatabaseConnection,
    storage: Arc<dyn StorageBackend>,
}

impl App {
    /// Load [`Config`] from the environment, connect and migrate.
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::from_env()?;
        Self::with_config(config).await
    }

    /// Build the application from an explicit config.
    pub async fn with_config(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let db = crate::db::connect(&config).await?;

        // Check for CLI database operations (--migrate, --rollback) and exit if present
        Self::handle_db_cli_args(&db).await?;

        tracing::info!("Running pending database migrations...");
        Migrator::up(&db, None).await?;
        tracing::info!("Migrations complete.");

        let storage = Self::init_storage(&config).await?;

        Ok(App {
            config,
            db,
            storage,
        })
    }

    /// Pick the media backend: S3 when built with `s3` and `S3_BUCKET` is set,
    /// the local upload directory otherwise.
    async fn init_storage(
        config: &Config,
    ) -> Result<Arc<dyn StorageBackend>, Box<dyn std::error::Error>> {
        #[cfg(feature = "s3")]
        if config.has_s3() {
            let s3 = crate::storage::S3Storage::from_config(config).await?;
            tracing::info!(bucket = ?config.s3_bucket, "Using S3 media storage");
            return Ok(Arc::new(s3));
        }

        let local = LocalStorage::new(&config.upload_dir);
        local.ensure_dir().await?;
        tracing::info!(dir = %config.upload_dir, "Using local media storage");
        Ok(Arc::new(local))
    }

    /// Run `--migrate` / `--rollback [n]` and exit when one was passed.
    async fn handle_db_cli_args(db: &DatabaseConnection) -> Result<(), Box<dyn std::error::Error>> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let Some(command) = DbCommand::from_args(&args) else {
            return Ok(());
        };

        match command {
            DbCommand::Migrate => {
                tracing::info!("Running pending database migrations...");
                Migrator::up(db, None).await?;
            }
            DbCommand::Rollback(steps) => {
                tracing::info!(steps, "Rolling back migrations...");
                Migrator::down(db, Some(steps)).await?;
            }
        }
        tracing::info!(?command, "database command complete");
        std::process::exit(0);
    }

    /// Shared state handed to every handler.
    pub fn state(&self) -> AppState {
        let store = Arc::new(SeaPrincipalStore::new(self.db.clone()));
        AppState {
            db: self.db.clone(),
            config: Arc::new(self.config.clone()),
            sessions: SessionManager::new(store, self.config.session.clone()),
            storage: self.storage.clone(),
        }
    }

    /// Build the axum router: API routes, media files, docs and middleware.
    pub fn router(&self) -> Router {
        let state = self.state();
        let openapi_spec = ApiDoc::openapi();
        let openapi_json = openapi_spec.clone();
        let body_limit = usize::try_from(self.config.max_upload_size).unwrap_or(usize::MAX);

        let mut router = routing::build_routes()
            .with_state(state)
            .nest_service(
                LocalStorage::URL_PREFIX,
                ServeDir::new(&self.config.upload_dir),
            )
            .merge(Scalar::with_url(API_DOCS_PATH, openapi_spec))
            .route(
                "/api-docs/openapi.json",
                axum::routing::get(move || {
                    let spec = openapi_json.clone();
                    async move { axum::Json(spec) }
                }),
            )
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(self.cors_layer());

        // Only add tracing/request-id middleware in development mode.
        if self.config.is_dev() {
            use tower_http::trace::DefaultMakeSpan;
            use tower_http::trace::DefaultOnRequest;
            use tower_http::trace::DefaultOnResponse;
            use tower_http::LatencyUnit;

            let x_request_id = axum::http::HeaderName::from_static("x-request-id");
            router = router
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(PropagateRequestIdLayer::new(x_request_id))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                        .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                        .on_response(
                            DefaultOnResponse::new()
                                .level(tracing::Level::INFO)
                                .latency_unit(LatencyUnit::Millis),
                        ),
                );
        }

        router
    }

    /// Credentialed CORS for the configured origin; permissive when none is set.
    fn cors_layer(&self) -> CorsLayer {
        match self
            .config
            .cors_origin
            .as_deref()
            .and_then(|o| HeaderValue::from_str(o).ok())
        {
            Some(origin) => CorsLayer::new()
                .allow_origin(AllowOrigin::exact(origin))
                .allow_credentials(true)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                ]),
            None => CorsLayer::permissive(),
        }
    }

    /// Serve until Ctrl+C.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.config.server_addr();
        let router = self.router();

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("vidtube server running on http://{}", addr);
        tracing::info!("API docs at http://{}{}", addr, API_DOCS_PATH);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

/// One-shot database operation requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DbCommand {
    Migrate,
    Rollback(u32),
}

impl DbCommand {
    fn from_args(args: &[String]) -> Option<Self> {
        if args.iter().any(|a| a == "--migrate") {
            return Some(DbCommand::Migrate);
        }
        let pos = args.iter().position(|a| a == "--rollback")?;
        let steps = args
            .get(pos + 1)
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(1);
        Some(DbCommand::Rollback(steps))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down vidtube server...");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn db_command_parsing() {
        assert_eq!(DbCommand::from_args(&args(&[])), None);
        assert_eq!(DbCommand::from_args(&args(&["--migrate"])), Some(DbCommand::Migrate));
        assert_eq!(
            DbCommand::from_args(&args(&["--rollback"])),
            Some(DbCommand::Rollback(1))
        );
        assert_eq!(
            DbCommand::from_args(&args(&["--rollback", "3"])),
            Some(DbCommand::Rollback(3))
        );
    }
}
