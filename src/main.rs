mod aggregate;
mod catalog;
mod error;
mod http;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

const PORT: u16 = 3001;
const ALLOWED_ORIGINS: &[&str] = &["http://localhost:5173"];
const DB_ENV_VAR: &str = "DEVPULSE_DB";
const DEFAULT_DB_PATH: &str = "devpulse.sqlite3";
// Original policy: 100 requests per 15-minute window per client.
const RATE_LIMIT_CAPACITY: f64 = 100.0;
const RATE_LIMIT_WINDOW_SECS: f64 = 15.0 * 60.0;

fn db_path() -> String {
    std::env::var(DB_ENV_VAR).unwrap_or_else(|_| DEFAULT_DB_PATH.to_string())
}

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = db_path();
    let conn = Connection::open(&path).map_err(|err| err.to_string())?;
    store::init_schema(&conn).map_err(|err| err.to_string())?;

    let state = http::AppState {
        db: Arc::new(Mutex::new(conn)),
        catalog: Arc::new(catalog::survey_catalog()),
        allowed_origins: Arc::new(ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect()),
        limiter: Arc::new(http::RateLimiter::new(
            RATE_LIMIT_CAPACITY,
            RATE_LIMIT_CAPACITY / RATE_LIMIT_WINDOW_SECS,
        )),
    };
    let app = http::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], PORT));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("bind failed: {err}"))?;
    info!("devpulse listening on http://{addr} (db: {path})");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|err| format!("server failed: {err}"))
}
