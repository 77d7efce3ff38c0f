use std::time::Duration;

use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};

use crate::error::ScrapeError;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("timed out waiting for '{selector}' at {url}")]
    ContentTimeout { url: String, selector: String },

    #[error("navigation to {url} failed: {source}")]
    Navigation { url: String, source: CmdError },

    #[error("webdriver session error: {0}")]
    Session(CmdError),
}

impl FetchError {
    /// Session errors kill the shared rendering session and abort the
    /// whole run; everything else is a single-page failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Session(_))
    }
}

/// Capability for retrieving a script-rendered page's HTML. Sources
/// parse the returned markup themselves; the fetcher only guarantees
/// the expected listing container was present before reading.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Navigate to `url`, wait (bounded) for the CSS selector `ready`
    /// to be present, and return the rendered page source.
    async fn page_source(&self, url: &str, ready: &str) -> Result<String, FetchError>;

    /// Shut down the underlying session. Called exactly once per run.
    async fn close(&self) -> Result<(), FetchError>;
}

/// WebDriver-backed fetcher. One session per scrape run.
pub struct WebDriverFetcher {
    client: Client,
    content_wait: Duration,
}

impl WebDriverFetcher {
    pub async fn connect(webdriver_url: &str, content_wait: Duration) -> Result<Self, ScrapeError> {
        let mut caps = serde_json::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({
                "args": ["--headless=new", "--no-sandbox", "--disable-dev-shm-usage"]
            }),
        );

        let client = ClientBuilder::rustls()
            .map_err(|e| std::io::Error::other(format!("failed to initialize TLS backend: {e}")))?
            .capabilities(caps)
            .connect(webdriver_url)
            .await?;

        Ok(WebDriverFetcher {
            client,
            content_wait,
        })
    }
}

#[async_trait]
impl PageFetcher for WebDriverFetcher {
    async fn page_source(&self, url: &str, ready: &str) -> Result<String, FetchError> {
        // Client is a cheap handle onto the session actor; commands
        // need a mutable handle.
        let mut client = self.client.clone();

        client
            .goto(url)
            .await
            .map_err(|source| FetchError::Navigation {
                url: url.to_string(),
                source,
            })?;

        match client
            .wait()
            .at_most(self.content_wait)
            .for_element(Locator::Css(ready))
            .await
        {
            Ok(_) => {}
            Err(CmdError::WaitTimeout) => {
                return Err(FetchError::ContentTimeout {
                    url: url.to_string(),
                    selector: ready.to_string(),
                });
            }
            Err(e) => return Err(FetchError::Session(e)),
        }

        client.source().await.map_err(FetchError::Session)
    }

    async fn close(&self) -> Result<(), FetchError> {
        // Client is a cloneable handle; close() consumes one handle and
        // tears down the session for all of them.
        self.client.clone().close().await.map_err(FetchError::Session)
    }
}
