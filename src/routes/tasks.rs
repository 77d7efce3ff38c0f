use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::export::{self, ExportFormat};
use crate::models::job::JobRecord;
use crate::models::task::{ScrapeTask, TaskStatus};
use crate::pipeline::{self, ScrapeRequest};
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub search_term: String,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub task_id: Uuid,
    pub message: String,
}

/// POST /api/v1/tasks
///
/// Kick off a scrape in the background and return its task id for
/// polling. The primary artifact is always JSON so the results and
/// download endpoints can re-read it.
pub async fn start(
    State(state): State<AppState>,
    Json(input): Json<StartRequest>,
) -> Result<Json<StartResponse>, AppError> {
    if input.keywords.is_empty() {
        return Err(AppError::BadRequest("Keywords are required".to_string()));
    }

    let task = ScrapeTask::new(input.keywords.clone(), input.search_term.clone());
    let task_id = task.id;
    state.registry.insert(task);

    let registry = state.registry.clone();
    let settings = state.settings.clone();
    let request = ScrapeRequest {
        keywords: input.keywords,
        search_term: input.search_term,
        format: ExportFormat::Json,
    };

    tokio::spawn(async move {
        match pipeline::run(&settings, &request).await {
            Ok(outcome) => {
                registry.complete(task_id, outcome.records.len(), outcome.output_file);
            }
            Err(e) => {
                tracing::error!("Task {task_id} failed: {e}");
                registry.fail(task_id, e.to_string());
            }
        }
    });

    Ok(Json(StartResponse {
        task_id,
        message: "Scraping started".to_string(),
    }))
}

/// GET /api/v1/tasks
pub async fn list(State(state): State<AppState>) -> Json<Vec<ScrapeTask>> {
    Json(state.registry.list())
}

/// GET /api/v1/tasks/{id}
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScrapeTask>, AppError> {
    let task = get_task(&state, id)?;
    Ok(Json(task))
}

/// GET /api/v1/tasks/{id}/results
pub async fn results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<JobRecord>>, AppError> {
    let task = get_task(&state, id)?;
    let records = completed_records(&task).await?;
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    #[serde(default = "default_format")]
    pub format: ExportFormat,
}

fn default_format() -> ExportFormat {
    ExportFormat::Csv
}

/// GET /api/v1/tasks/{id}/download?format=csv|json|excel
///
/// Re-serialize a completed result set on demand and return it as an
/// attachment.
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, AppError> {
    let task = get_task(&state, id)?;
    let records = completed_records(&task).await?;

    let stem = format!(
        "export_{id}_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let path = export::write_named(&records, params.format, &state.settings.output_dir, &stem)
        .map_err(|e| AppError::Internal(format!("Export failed: {e}")))?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to read export: {e}")))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("export")
        .to_string();

    Ok((
        [
            (
                header::CONTENT_TYPE,
                params.format.mime_type().to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

fn get_task(state: &AppState, id: Uuid) -> Result<ScrapeTask, AppError> {
    state
        .registry
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("Task {id} not found")))
}

async fn completed_records(task: &ScrapeTask) -> Result<Vec<JobRecord>, AppError> {
    if task.status != TaskStatus::Completed {
        return Err(AppError::BadRequest("Task not completed yet".to_string()));
    }

    let path = task
        .results_file
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Results file not found".to_string()))?;

    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|_| AppError::NotFound("Results file not found".to_string()))?;

    serde_json::from_str(&contents)
        .map_err(|e| AppError::Internal(format!("Failed to parse results file: {e}")))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use super::*;
    use crate::models::task::TaskRegistry;
    use crate::pipeline::ScrapeSettings;

    fn state(dir: PathBuf) -> AppState {
        AppState {
            registry: TaskRegistry::new(),
            settings: Arc::new(ScrapeSettings {
                output_dir: dir,
                webdriver_url: "http://localhost:4444".to_string(),
                max_pages: 5,
            }),
        }
    }

    fn running_task(state: &AppState) -> Uuid {
        let task = ScrapeTask::new(vec!["engineer".to_string()], String::new());
        let id = task.id;
        state.registry.insert(task);
        id
    }

    #[tokio::test]
    async fn results_for_a_running_task_is_a_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path().to_path_buf());
        let id = running_task(&state);

        let task = get_task(&state, id).unwrap();
        let err = completed_records(&task).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn completed_task_without_a_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path().to_path_buf());
        let id = running_task(&state);
        state.registry.complete(id, 0, None);

        let task = get_task(&state, id).unwrap();
        let err = completed_records(&task).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn completed_task_results_are_read_back_from_the_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path().to_path_buf());
        let id = running_task(&state);

        let records = vec![JobRecord {
            title: "Software Engineer".to_string(),
            organization: Some("Acme".to_string()),
            location: None,
            closing_date: None,
            posting_date: None,
            salary_min: None,
            salary_max: None,
            url: "https://example.com/job/1".to_string(),
            source: "JobsDB".to_string(),
            description: None,
        }];
        let path = export::write_named(&records, ExportFormat::Json, dir.path(), "jobs_test")
            .unwrap();
        state.registry.complete(id, records.len(), Some(path));

        let task = get_task(&state, id).unwrap();
        let read_back = completed_records(&task).await.unwrap();
        assert_eq!(read_back, records);
    }

    #[test]
    fn unknown_task_is_not_found() {
        let state = state(PathBuf::from("job_results"));
        let err = get_task(&state, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
