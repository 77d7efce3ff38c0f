use std::sync::Arc;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ScrapeError;
use crate::fetch::PageFetcher;
use crate::models::job::JobRecord;
use crate::sources::{JobSource, PAGE_DELAY};

const BASE_URL: &str = "https://careers.pageuppeople.com/688/cwlive/en/listing/";
const READY_SELECTOR: &str = ".recruitment-template";
const SOURCE: &str = "Careers@Gov.sg";
const CLOSING_DATE_PREFIX: &str = "Closing Date: ";

/// The government careers portal. Listings are rendered client-side, so
/// pages go through the shared rendering session.
pub struct CareersGov {
    fetcher: Arc<dyn PageFetcher>,
}

impl CareersGov {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        CareersGov { fetcher }
    }
}

#[async_trait]
impl JobSource for CareersGov {
    fn name(&self) -> &'static str {
        SOURCE
    }

    // The portal has no query parameter; the search term is ignored.
    async fn fetch(
        &self,
        _search_term: &str,
        max_pages: u32,
    ) -> Result<Vec<JobRecord>, ScrapeError> {
        let mut records = Vec::new();

        for page in 1..=max_pages {
            tracing::info!("Fetching page {page} of {SOURCE}");
            let url = format!("{BASE_URL}?page={page}");

            let html = match self.fetcher.page_source(&url, READY_SELECTOR).await {
                Ok(html) => html,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    tracing::error!("Failed to fetch page {page} of {SOURCE}: {e}");
                    continue;
                }
            };

            records.extend(parse_listing_page(&html));
            tokio::time::sleep(PAGE_DELAY).await;
        }

        tracing::info!("Completed {SOURCE}: parsed {} jobs", records.len());
        Ok(records)
    }
}

fn parse_listing_page(html: &str) -> Vec<JobRecord> {
    let document = Html::parse_document(html);
    let entry_selector = Selector::parse(".recruitment-template").unwrap();

    let mut records = Vec::new();
    for entry in document.select(&entry_selector) {
        match parse_entry(entry) {
            Some(record) => records.push(record),
            None => tracing::error!("Skipping {SOURCE} entry with missing fields"),
        }
    }
    records
}

fn parse_entry(entry: ElementRef<'_>) -> Option<JobRecord> {
    let title_selector = Selector::parse(".job-title").unwrap();
    let anchor_selector = Selector::parse("a").unwrap();
    let organization_selector = Selector::parse(".job-client-name").unwrap();
    let location_selector = Selector::parse(".job-location").unwrap();
    let closing_selector = Selector::parse(".job-close-date").unwrap();

    let title_element = entry.select(&title_selector).next()?;
    let title = element_text(title_element);
    if title.is_empty() {
        return None;
    }

    let href = title_element
        .select(&anchor_selector)
        .next()?
        .value()
        .attr("href")?;
    let url = absolutize(href)?;

    let organization = element_text(entry.select(&organization_selector).next()?);
    let location = element_text(entry.select(&location_selector).next()?);
    let closing_raw = element_text(entry.select(&closing_selector).next()?);
    let closing_date = closing_raw
        .strip_prefix(CLOSING_DATE_PREFIX)
        .unwrap_or(&closing_raw)
        .to_string();

    Some(JobRecord {
        title,
        organization: Some(organization),
        location: Some(location),
        closing_date: Some(closing_date),
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

/// Listing hrefs are often relative to the portal; emit absolute links.
fn absolutize(href: &str) -> Option<String> {
    let base = Url::parse(BASE_URL).ok()?;
    base.join(href).ok().map(Into::into)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::fetch::FetchError;

    const PAGE: &str = r#"
        <div class="recruitment-template">
          <h3 class="job-title"><a href="/688/cwlive/en/job/512345/senior-engineer">Senior Software Engineer</a></h3>
          <span class="job-client-name">GovTech</span>
          <span class="job-location">Singapore</span>
          <span class="job-close-date">Closing Date: 31 Jan 2025</span>
        </div>
        <div class="recruitment-template">
          <h3 class="job-title"><a href="https://careers.pageuppeople.com/688/cwlive/en/job/512399/analyst">Policy Analyst</a></h3>
          <span class="job-client-name">MOM</span>
          <span class="job-location">Tanjong Pagar</span>
          <span class="job-close-date">Closing Date: 14 Feb 2025</span>
        </div>
    "#;

    #[test]
    fn parses_entries_and_absolutizes_relative_links() {
        let records = parse_listing_page(PAGE);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].title, "Senior Software Engineer");
        assert_eq!(records[0].organization.as_deref(), Some("GovTech"));
        assert_eq!(records[0].location.as_deref(), Some("Singapore"));
        assert_eq!(records[0].closing_date.as_deref(), Some("31 Jan 2025"));
        assert_eq!(
            records[0].url,
            "https://careers.pageuppeople.com/688/cwlive/en/job/512345/senior-engineer"
        );
        assert_eq!(records[0].source, SOURCE);

        // Already-absolute hrefs pass through untouched.
        assert_eq!(
            records[1].url,
            "https://careers.pageuppeople.com/688/cwlive/en/job/512399/analyst"
        );
    }

    #[test]
    fn malformed_entry_is_skipped_without_losing_the_rest() {
        let html = r#"
            <div class="recruitment-template">
              <span class="job-client-name">No Title Agency</span>
              <span class="job-location">Singapore</span>
              <span class="job-close-date">Closing Date: 01 Mar 2025</span>
            </div>
            <div class="recruitment-template">
              <h3 class="job-title"><a href="/688/cwlive/en/job/9/ok">Data Engineer</a></h3>
              <span class="job-client-name">IRAS</span>
              <span class="job-location">Novena</span>
              <span class="job-close-date">Closing Date: 02 Mar 2025</span>
            </div>
        "#;
        let records = parse_listing_page(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Data Engineer");
    }

    #[test]
    fn entry_without_closing_date_prefix_keeps_raw_text() {
        let html = r#"
            <div class="recruitment-template">
              <h3 class="job-title"><a href="/688/cwlive/en/job/9/ok">Engineer</a></h3>
              <span class="job-client-name">GovTech</span>
              <span class="job-location">Singapore</span>
              <span class="job-close-date">14 Feb 2025</span>
            </div>
        "#;
        let records = parse_listing_page(html);
        assert_eq!(records[0].closing_date.as_deref(), Some("14 Feb 2025"));
    }

    struct ScriptedFetcher {
        pages: Mutex<VecDeque<Result<String, FetchError>>>,
    }

    impl ScriptedFetcher {
        fn new(pages: Vec<Result<String, FetchError>>) -> Self {
            ScriptedFetcher {
                pages: Mutex::new(pages.into()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn page_source(&self, url: &str, _ready: &str) -> Result<String, FetchError> {
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected fetch of {url}"))
        }

        async fn close(&self) -> Result<(), FetchError> {
            Ok(())
        }
    }

    fn single_entry_page(title: &str) -> String {
        format!(
            r#"<div class="recruitment-template">
                 <h3 class="job-title"><a href="/688/cwlive/en/job/1/x">{title}</a></h3>
                 <span class="job-client-name">GovTech</span>
                 <span class="job-location">Singapore</span>
                 <span class="job-close-date">Closing Date: 31 Jan 2025</span>
               </div>"#
        )
    }

    #[tokio::test(start_paused = true)]
    async fn failed_page_is_skipped_and_later_pages_still_fetched() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Ok(single_entry_page("First")),
            Err(FetchError::ContentTimeout {
                url: "x".to_string(),
                selector: READY_SELECTOR.to_string(),
            }),
            Ok(single_entry_page("Third")),
        ]));

        let records = CareersGov::new(fetcher).fetch("", 3).await.unwrap();

        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["First", "Third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_session_error_aborts_the_source() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Ok(single_entry_page("First")),
            Err(FetchError::Session(fantoccini::error::CmdError::NotW3C(
                serde_json::json!("session died"),
            ))),
        ]));

        let result = CareersGov::new(fetcher).fetch("", 3).await;
        assert!(result.is_err());
    }
}
