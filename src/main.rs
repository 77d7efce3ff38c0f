mod config;
mod error;
mod export;
mod fetch;
mod models;
mod pipeline;
mod routes;
mod sources;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::{Command, Config};
use crate::models::task::TaskRegistry;
use crate::pipeline::ScrapeRequest;
use crate::routes::AppState;

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jobscout=info,tower_http=info")),
        )
        .init();

    let config = Config::parse();
    let settings = Arc::new(config.settings());

    match config.resolved_command() {
        Command::Serve { listen_addr } => {
            let state = AppState {
                registry: TaskRegistry::new(),
                settings,
            };
            let app = Router::new()
                .route("/healthz", get(healthz))
                .merge(routes::router(state))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive());

            let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
            tracing::info!("Listening on {listen_addr}");
            axum::serve(listener, app).await?;
        }
        Command::Scrape {
            keywords,
            search,
            format,
        } => {
            let request = ScrapeRequest {
                keywords,
                search_term: search,
                format,
            };
            let outcome = pipeline::run(&settings, &request).await?;
            match outcome.output_file {
                Some(path) => {
                    println!("Scraping complete! Results saved to: {}", path.display());
                }
                None => {
                    println!("Scraping complete. No matching jobs found; nothing was exported.");
                }
            }
        }
    }

    Ok(())
}
