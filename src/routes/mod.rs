pub mod tasks;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::models::task::TaskRegistry;
use crate::pipeline::ScrapeSettings;

#[derive(Clone)]
pub struct AppState {
    pub registry: TaskRegistry,
    pub settings: Arc<ScrapeSettings>,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/tasks", get(tasks::list).post(tasks::start))
        .route("/tasks/{id}", get(tasks::status))
        .route("/tasks/{id}/results", get(tasks::results))
        .route("/tasks/{id}/download", get(tasks::download))
        .with_state(state);

    Router::new().nest("/api/v1", api)
}
