// Job sources. Each source fetches one site's paginated listings and
// normalizes them into JobRecords; pagination and parsing quirks stay
// inside the source that owns them.

pub mod careers_gov;
pub mod jobsdb;
pub mod mycareersfuture;

pub use careers_gov::CareersGov;
pub use jobsdb::JobsDb;
pub use mycareersfuture::MyCareersFuture;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScrapeError;
use crate::models::job::JobRecord;

/// Pause between successful page fetches, to avoid overwhelming a site.
pub const PAGE_DELAY: Duration = Duration::from_secs(2);

/// How long to wait for a rendered page's listing container to appear.
pub const CONTENT_WAIT: Duration = Duration::from_secs(10);

/// Trait that all job sources implement.
///
/// `Ok` carries every record the source managed to parse; skipped
/// entries and failed pages are logged and recovered internally. `Err`
/// is reserved for fatal conditions (a lost rendering session) and
/// aborts the whole run.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Source tag stamped on every record this source produces.
    fn name(&self) -> &'static str;

    /// Fetch up to `max_pages` pages of listings.
    async fn fetch(
        &self,
        search_term: &str,
        max_pages: u32,
    ) -> Result<Vec<JobRecord>, ScrapeError>;
}
