//! Pure client for the organisation registry search API.
//!
//! Supports a targeted lookup by KBO number and a full scroll over every
//! organisation that carries a KBO number.
//!
//! # Example
//!
//! ```rust,ignore
//! use registry_client::RegistryClient;
//!
//! let client = RegistryClient::new("https://api.wegwijs.vlaanderen.be/v1", None, 30)?;
//!
//! let matches = client.fetch_by_kbo("0123456789").await?;
//! let everything = client.fetch_all().await?;
//! println!("{} organisations", everything.len());
//! ```

pub mod error;
pub mod types;

pub use error::{RegistryError, Result};
pub use types::{Field, OrganisationSnapshot, SearchMetadata, DEFAULT_FIELDS, SEARCH_METADATA_HEADER};

use std::collections::HashMap;
use std::time::Duration;

use futures::{Stream, TryStreamExt};
use reqwest::Response;

/// Query matching every organisation whose KBO number contains a digit.
const ALL_WITH_KBO_QUERY: &str = "kboNumber:/.*[0-9].*/";

#[derive(Clone)]
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
    fields: String,
}

/// Where the scroll sequence stands between pages.
enum ScrollState {
    Start,
    Scrolling(String),
}

impl RegistryClient {
    /// Build a client with a per-request timeout.
    pub fn new(base_url: &str, fields: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self::with_client(client, base_url, fields))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, fields: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            fields: fields.unwrap_or_else(|| DEFAULT_FIELDS.to_string()),
        }
    }

    /// Look up the organisations registered under one KBO number. Not paged.
    pub async fn fetch_by_kbo(&self, kbo_number: &str) -> Result<Vec<OrganisationSnapshot>> {
        let url = format!("{}/search/organisations", self.base_url);
        let query = format!("kboNumber:{}", kbo_number);
        let resp = self
            .client
            .get(&url)
            .query(&[("q", query.as_str()), ("fields", self.fields.as_str())])
            .send()
            .await?;

        let resp = check_status(resp).await?;
        decode_items(resp).await
    }

    /// Fetch every organisation with a KBO number, keyed by that number.
    ///
    /// Later pages overwrite earlier entries for the same number. Any error
    /// aborts the whole fetch.
    pub async fn fetch_all(&self) -> Result<HashMap<String, OrganisationSnapshot>> {
        let pages = self.pages();
        futures::pin_mut!(pages);

        let mut snapshots = HashMap::new();
        let mut page_count = 0usize;
        while let Some(page) = pages.try_next().await? {
            page_count += 1;
            for item in page {
                match item.kbo_number.clone() {
                    Some(kbo) => {
                        snapshots.insert(kbo, item);
                    }
                    None => tracing::debug!("Skipping registry item without KBO number"),
                }
            }
        }

        tracing::info!(
            pages = page_count,
            organisations = snapshots.len(),
            "Fetched registry snapshot"
        );
        Ok(snapshots)
    }

    /// Lazy sequence of result pages. Ends at the first empty page and cannot
    /// be restarted once consumed.
    fn pages(&self) -> impl Stream<Item = Result<Vec<OrganisationSnapshot>>> + '_ {
        futures::stream::try_unfold(ScrollState::Start, move |state| self.advance(state))
    }

    async fn advance(
        &self,
        state: ScrollState,
    ) -> Result<Option<(Vec<OrganisationSnapshot>, ScrollState)>> {
        let (items, next) = match state {
            ScrollState::Start => {
                let (items, scroll_id) = self.start_scroll().await?;
                (items, scroll_id.map(ScrollState::Scrolling))
            }
            ScrollState::Scrolling(scroll_id) => {
                let items = self.next_scroll_page(&scroll_id).await?;
                (items, Some(ScrollState::Scrolling(scroll_id)))
            }
        };

        if items.is_empty() {
            return Ok(None);
        }
        match next {
            Some(next) => Ok(Some((items, next))),
            None => Err(RegistryError::Metadata(
                "non-empty page without scroll id".to_string(),
            )),
        }
    }

    async fn start_scroll(&self) -> Result<(Vec<OrganisationSnapshot>, Option<String>)> {
        let url = format!("{}/search/organisations", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("q", ALL_WITH_KBO_QUERY),
                ("fields", self.fields.as_str()),
                ("scroll", "true"),
            ])
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let scroll_id = read_scroll_id(&resp)?;
        let items = decode_items(resp).await?;
        tracing::debug!(count = items.len(), "Fetched first registry page");
        Ok((items, scroll_id))
    }

    async fn next_scroll_page(&self, scroll_id: &str) -> Result<Vec<OrganisationSnapshot>> {
        let url = format!("{}/search/organisations/scroll", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("id", scroll_id)])
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let items = decode_items(resp).await?;
        tracing::debug!(count = items.len(), "Fetched registry scroll page");
        Ok(items)
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(RegistryError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(resp)
}

/// Read the scroll id from the metadata header. An absent header is fine
/// here; it only becomes an error if the page turns out to have items.
fn read_scroll_id(resp: &Response) -> Result<Option<String>> {
    let Some(raw) = resp.headers().get(SEARCH_METADATA_HEADER) else {
        return Ok(None);
    };
    let raw = raw
        .to_str()
        .map_err(|e| RegistryError::Metadata(e.to_string()))?;
    let meta: SearchMetadata =
        serde_json::from_str(raw).map_err(|e| RegistryError::Metadata(e.to_string()))?;
    Ok(meta.scroll_id)
}

async fn decode_items(resp: Response) -> Result<Vec<OrganisationSnapshot>> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| RegistryError::Parse(e.to_string()))
}
