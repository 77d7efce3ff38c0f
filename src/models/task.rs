use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}

/// One background scrape run as seen by the status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeTask {
    pub id: Uuid,
    pub status: TaskStatus,
    pub keywords: Vec<String>,
    pub search_term: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub job_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScrapeTask {
    pub fn new(keywords: Vec<String>, search_term: String) -> Self {
        ScrapeTask {
            id: Uuid::new_v4(),
            status: TaskStatus::Running,
            keywords,
            search_term,
            start_time: Utc::now(),
            end_time: None,
            job_count: 0,
            results_file: None,
            error: None,
        }
    }
}

/// Process-wide task map. Created empty at startup; each entry is written
/// by the single worker that owns its id and read concurrently by status
/// queries.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    inner: Arc<RwLock<HashMap<Uuid, ScrapeTask>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, task: ScrapeTask) {
        self.inner.write().unwrap().insert(task.id, task);
    }

    pub fn get(&self, id: Uuid) -> Option<ScrapeTask> {
        self.inner.read().unwrap().get(&id).cloned()
    }

    pub fn list(&self) -> Vec<ScrapeTask> {
        let mut tasks: Vec<ScrapeTask> = self.inner.read().unwrap().values().cloned().collect();
        tasks.sort_by_key(|t| t.start_time);
        tasks
    }

    pub fn complete(&self, id: Uuid, job_count: usize, results_file: Option<PathBuf>) {
        if let Some(task) = self.inner.write().unwrap().get_mut(&id) {
            task.status = TaskStatus::Completed;
            task.job_count = job_count;
            task.results_file = results_file;
            task.end_time = Some(Utc::now());
        }
    }

    pub fn fail(&self, id: Uuid, error: String) {
        if let Some(task) = self.inner.write().unwrap().get_mut(&id) {
            task.status = TaskStatus::Failed;
            task.error = Some(error);
            task.end_time = Some(Utc::now());
        }
    }
}
