use anyhow::Context;
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use regserver::api_router::configure_api_routes;
use regserver::shared::state::AppState;
use regserver::shared::utils::{create_conn, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let pool = match create_conn() {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to create database pool: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = run_migrations(&pool) {
        error!("Failed to run migrations: {}", e);
        anyhow::bail!("migration failure: {}", e);
    }

    let state = Arc::new(AppState { conn: pool });

    let app = configure_api_routes()
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state);

    let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("SERVER_PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;

    Ok(())
}
