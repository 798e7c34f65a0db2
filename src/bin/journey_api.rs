//! Read-only journey API server.
//!
//! Usage: `journey-api [db-path] [bind-addr]`
//! Defaults: `blackbox.sqlite`, `0.0.0.0:8080`.

use std::env;
use std::path::PathBuf;

use log::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let db_path = args.next().unwrap_or_else(|| "blackbox.sqlite".to_string());
    let bind = args.next().unwrap_or_else(|| "0.0.0.0:8080".to_string());

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("[journey-api] serving {} on http://{}", db_path, bind);

    axum::serve(listener, blackbox::http::router(PathBuf::from(db_path))).await?;
    Ok(())
}
