use std::sync::Arc;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ScrapeError;
use crate::fetch::PageFetcher;
use crate::models::job::JobRecord;
use crate::sources::{JobSource, PAGE_DELAY};

const BASE_URL: &str = "https://sg.jobsdb.com";
const READY_SELECTOR: &str = ".job-card";
const SOURCE: &str = "JobsDB";
const DEFAULT_LOCATION: &str = "Singapore";

/// JobsDB renders its result cards client-side, so pages go through the
/// shared rendering session.
pub struct JobsDb {
    fetcher: Arc<dyn PageFetcher>,
}

impl JobsDb {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        JobsDb { fetcher }
    }
}

#[async_trait]
impl JobSource for JobsDb {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn fetch(
        &self,
        search_term: &str,
        max_pages: u32,
    ) -> Result<Vec<JobRecord>, ScrapeError> {
        let mut records = Vec::new();

        for page in 1..=max_pages {
            tracing::info!("Fetching page {page} of {SOURCE}");
            let url = page_url(search_term, page);

            let html = match self.fetcher.page_source(&url, READY_SELECTOR).await {
                Ok(html) => html,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    tracing::error!("Failed to fetch page {page} of {SOURCE}: {e}");
                    continue;
                }
            };

            records.extend(parse_card_page(&html));
            tokio::time::sleep(PAGE_DELAY).await;
        }

        tracing::info!("Completed {SOURCE}: parsed {} jobs", records.len());
        Ok(records)
    }
}

fn page_url(search_term: &str, page: u32) -> String {
    if search_term.is_empty() {
        format!("{BASE_URL}/jobs-in-singapore/{page}")
    } else {
        format!("{BASE_URL}/jobs-in-singapore/{search_term}/{page}")
    }
}

fn parse_card_page(html: &str) -> Vec<JobRecord> {
    let document = Html::parse_document(html);
    let card_selector = Selector::parse(".job-card").unwrap();

    let mut records = Vec::new();
    for card in document.select(&card_selector) {
        match parse_card(card) {
            Some(record) => records.push(record),
            None => tracing::error!("Skipping {SOURCE} card with missing fields"),
        }
    }
    records
}

fn parse_card(card: ElementRef<'_>) -> Option<JobRecord> {
    let title_selector = Selector::parse("h3.job-title").unwrap();
    let company_selector = Selector::parse("span.company-name").unwrap();
    let location_selector = Selector::parse("span.location").unwrap();
    let link_selector = Selector::parse("a.job-link").unwrap();

    let title = element_text(card.select(&title_selector).next()?);
    if title.is_empty() {
        return None;
    }

    let company = element_text(card.select(&company_selector).next()?);

    // Cards don't always carry a location; fall back to the site default.
    let location = card
        .select(&location_selector)
        .next()
        .map(element_text)
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

    let href = card.select(&link_selector).next()?.value().attr("href")?;
    let url = absolutize(href)?;

    Some(JobRecord {
        title,
        organization: Some(company),
        location: Some(location),
        closing_date: None,
        posting_date: None,
        salary_min: None,
        salary_max: None,
        url,
        source: SOURCE.to_string(),
        description: None,
    })
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn absolutize(href: &str) -> Option<String> {
    let base = Url::parse(BASE_URL).ok()?;
    base.join(href).ok().map(Into::into)
}
