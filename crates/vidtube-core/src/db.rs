use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection};
use std::time::Duration;

use crate::config::Config;

/// Initialize the database connection from config.
pub async fn connect(config: &Config) -> Result<DatabaseConnection, sea_orm::DbErr> {
    connect_url(&config.database_url, config.is_dev()).await
}

/// Connect to an explicit URL. In-memory SQLite is pinned to a single
/// connection so every query sees the same database.
pub async fn connect_url(url: &str, sql_logging: bool) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let mut opts = ConnectOptions::new(url);
    if url.contains(":memory:") {
        opts.max_connections(1).min_connections(1);
    } else {
        opts.max_connections(100).min_connections(5);
    }
    opts.connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(sql_logging);

    SeaDatabase::connect(opts).await
}
