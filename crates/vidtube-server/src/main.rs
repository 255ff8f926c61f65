//! # vidtube server
//!
//! ```bash
//! cargo run -p vidtube-server
//! cargo run -p vidtube-server -- --migrate
//! cargo run -p vidtube-server -- --rollback 1
//! ```
//!
//! Set `LOG_FORMAT=json` for one JSON object per log line.

use vidtube_core::App;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => vidtube_core::init_logging_json(),
        _ => vidtube_core::init_logging(),
    }

    let app = App::new().await?;
    app.run().await?;

    Ok(())
}
