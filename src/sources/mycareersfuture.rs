use async_trait::async_trait;
use serde_json::Value;

use crate::error::ScrapeError;
use crate::models::job::JobRecord;
use crate::sources::{JobSource, PAGE_DELAY};

const API_URL: &str = "https://api.mycareersfuture.gov.sg/v2/search";
const JOB_BASE_URL: &str = "https://www.mycareersfuture.gov.sg/job";
const SOURCE: &str = "MyCareersFuture.sg";
const PAGE_SIZE: u32 = 20;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// The API-backed board. No rendering session needed; search results
/// come straight from the JSON search endpoint.
pub struct MyCareersFuture {
    client: reqwest::Client,
    api_url: String,
}

impl MyCareersFuture {
    pub fn new() -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(MyCareersFuture {
            client,
            api_url: API_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_api_url(api_url: String) -> Self {
        MyCareersFuture {
            client: reqwest::Client::new(),
            api_url,
        }
    }
}

#[async_trait]
impl JobSource for MyCareersFuture {
    fn name(&self) -> &'static str {
        SOURCE
    }

    // Pages are zero-indexed here; a page shorter than PAGE_SIZE is the
    // last one. Any page-level failure ends this source's pagination —
    // the endpoint being down or rate-limiting makes further pages
    // pointless.
    async fn fetch(
        &self,
        search_term: &str,
        max_pages: u32,
    ) -> Result<Vec<JobRecord>, ScrapeError> {
        let mut records = Vec::new();

        for page in 0..max_pages {
            tracing::info!("Fetching page {} of {SOURCE}", page + 1);

            let response = match self
                .client
                .get(&self.api_url)
                .query(&[
                    ("limit", PAGE_SIZE.to_string()),
                    ("page", page.to_string()),
                    ("search", search_term.to_string()),
                    ("sortBy", "new_posting_date".to_string()),
                ])
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("{SOURCE} request failed: {e}");
                    break;
                }
            };

            if !response.status().is_success() {
                tracing::error!("{SOURCE} API returned {}", response.status());
                break;
            }

            let data: Value = match response.json().await {
                Ok(data) => data,
                Err(e) => {
                    tracing::error!("Failed to decode {SOURCE} response: {e}");
                    break;
                }
            };

            let page_jobs = data
                .get("results")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            let last_page = page_jobs.len() < PAGE_SIZE as usize;

            for raw in &page_jobs {
                match parse_api_job(raw) {
                    Some(record) => records.push(record),
                    None => tracing::error!("Skipping {SOURCE} entry with missing fields"),
                }
            }

            if last_page {
                break;
            }
            tokio::time::sleep(PAGE_DELAY).await;
        }

        tracing::info!("Completed {SOURCE}: parsed {} jobs", records.len());
        Ok(records)
    }
}

/// Map one search result onto a JobRecord. Entries without a title or a
/// uuid cannot be identified or linked, so they are skipped.
fn parse_api_job(raw: &Value) -> Option<JobRecord> {
    let title = raw.get("title")?.as_str()?.trim().to_string();
    if title.is_empty() {
        return None;
    }

    let uuid = raw.get("uuid")?.as_str()?;
    let url = format!("{JOB_BASE_URL}/{uuid}");

    let organization = raw
        .get("postedCompany")
        .and_then(|company| company.get("name"))
        .and_then(|v| v.as_str())
        .map(String::from);

    let location = raw
        .get("addressLocations")
        .and_then(|v| v.as_array())
        .map(|locations| {
            locations
                .iter()
                .filter_map(|l| l.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|joined| !joined.is_empty());

    let salary_min = raw
        .get("salary")
        .and_then(|salary| salary.get("min"))
        .and_then(|v| v.as_i64());
    let salary_max = raw
        .get("salary")
        .and_then(|salary| salary.get("max"))
        .and_then(|v| v.as_i64());

    let posting_date = raw
        .get("postedDate")
        .and_then(|v| v.as_str())
        .map(String::from);

    Some(JobRecord {
        title,
        organization,
        location,
        closing_date: None,
        posting_date,
        salary_min,
        salary_max,
        url,
        source: SOURCE.to_string(),
        description: None,
    })
}
