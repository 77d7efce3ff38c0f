use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ScrapeError;
use crate::export::{self, ExportFormat};
use crate::fetch::{PageFetcher, WebDriverFetcher};
use crate::models::job::JobRecord;
use crate::sources::{CONTENT_WAIT, CareersGov, JobSource, JobsDb, MyCareersFuture};

/// Run-wide settings derived from config.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub output_dir: PathBuf,
    pub webdriver_url: String,
    pub max_pages: u32,
}

/// One scrape request: what to match and how to export it.
#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub keywords: Vec<String>,
    pub search_term: String,
    pub format: ExportFormat,
}

pub struct ScrapeOutcome {
    pub records: Vec<JobRecord>,
    /// None when nothing matched; no file is written in that case.
    pub output_file: Option<PathBuf>,
}

/// Run the full pipeline: acquire the rendering session, walk every
/// source in fixed order, filter and accumulate matches, export.
pub async fn run(
    settings: &ScrapeSettings,
    request: &ScrapeRequest,
) -> Result<ScrapeOutcome, ScrapeError> {
    fs::create_dir_all(&settings.output_dir)?;

    // Build the API source before acquiring the rendering session so a
    // client-construction failure can't leak the session.
    let api_source = MyCareersFuture::new()?;
    let fetcher = Arc::new(WebDriverFetcher::connect(&settings.webdriver_url, CONTENT_WAIT).await?);

    let sources: Vec<Box<dyn JobSource>> = vec![
        Box::new(CareersGov::new(fetcher.clone())),
        Box::new(api_source),
        Box::new(JobsDb::new(fetcher.clone())),
    ];

    run_with(fetcher, &sources, settings, request).await
}

/// Core of `run`, generic over the fetcher and source set. The rendering
/// session is released exactly once on every exit path; a fatal source
/// error discards whatever was accumulated and exports nothing.
pub(crate) async fn run_with(
    fetcher: Arc<dyn PageFetcher>,
    sources: &[Box<dyn JobSource>],
    settings: &ScrapeSettings,
    request: &ScrapeRequest,
) -> Result<ScrapeOutcome, ScrapeError> {
    let result = collect(sources, request, settings.max_pages).await;

    if let Err(e) = fetcher.close().await {
        // Release failure must not mask the run result.
        tracing::warn!("Failed to shut down rendering session: {e}");
    }

    let records = result?;
    let output_file = export::write(&records, request.format, &settings.output_dir)?;
    tracing::info!("Scraping complete. Found {} matching jobs.", records.len());

    Ok(ScrapeOutcome {
        records,
        output_file,
    })
}

async fn collect(
    sources: &[Box<dyn JobSource>],
    request: &ScrapeRequest,
    max_pages: u32,
) -> Result<Vec<JobRecord>, ScrapeError> {
    let keywords: Vec<String> = request.keywords.iter().map(|k| k.to_lowercase()).collect();

    let mut matched = Vec::new();
    for source in sources {
        tracing::info!("Starting to scrape {}", source.name());
        let records = source.fetch(&request.search_term, max_pages).await?;

        let before = matched.len();
        matched.extend(records.into_iter().filter(|r| r.matches(&keywords)));
        tracing::info!("{}: {} matching jobs", source.name(), matched.len() - before);
    }
    Ok(matched)
}
