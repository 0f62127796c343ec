//! Scroll search client
//!
//! Exhausts a scroll cursor against the search backend and returns every hit
//! as a [`Record`], in the order the backend produced them. The client has no
//! knowledge of record semantics; ordering comes from the query's sort clause.

use super::models::{error_reason, ClearScroll, ScrollContinuation, ScrollPage};
use crate::config::{SearchConfig, SecretString};
use crate::domain::{Record, ResendError, Result, SearchError};
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Path of the scroll continuation endpoint, relative to the backend origin
const SCROLL_PATH: &str = "/_search/scroll";

/// One paginated search, immutable for the run
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Search URL including index pattern
    pub url: String,

    /// Query body (filter tree, sort, page size)
    pub body: Value,

    /// Scroll keep-alive in backend syntax
    pub keep_alive: String,

    /// Timeout for each page request
    pub timeout: Duration,

    /// Authorization scheme and token, sent on every page request
    pub authorization: Option<(String, SecretString)>,
}

impl SearchRequest {
    /// Builds a request for `body` using the connection settings in `config`
    pub fn from_config(config: &SearchConfig, body: Value) -> Self {
        Self {
            url: config.url.clone(),
            body,
            keep_alive: config.keep_alive.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
            authorization: config
                .token
                .clone()
                .map(|token| (config.auth_scheme.clone(), token)),
        }
    }

    fn authorization_value(&self) -> Option<String> {
        self.authorization.as_ref().and_then(|(scheme, token)| {
            let token = token.expose_secret();
            if token.is_empty() {
                None
            } else if scheme.is_empty() {
                Some(token.as_ref().to_string())
            } else {
                Some(format!("{scheme} {}", token.as_ref()))
            }
        })
    }
}

/// Progress report passed to the page observer after every page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    /// 1-based page number
    pub page: usize,

    /// Hits on this page
    pub page_hits: usize,

    /// Hits gathered so far, this page included
    pub total_so_far: usize,
}

/// Client that exhausts a scroll cursor
pub struct ScrollSearchClient {
    client: Client,
}

impl ScrollSearchClient {
    /// Create a new client from the search configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let mut builder = ClientBuilder::new().connect_timeout(Duration::from_secs(30));

        if !config.tls_verify {
            tracing::warn!(
                url = %config.url,
                "TLS certificate verification is DISABLED for the search backend"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|e| {
            ResendError::Configuration(format!("Failed to build search HTTP client: {e}"))
        })?;

        Ok(Self { client })
    }

    /// Fetch every hit for `request`
    ///
    /// Pagination ends on the first empty page, or as soon as the total the
    /// backend reported has been gathered. `on_page` is called after every
    /// page with a [`PageProgress`].
    ///
    /// # Errors
    ///
    /// Any failure on any page aborts the whole fetch; hits gathered from
    /// earlier pages are discarded.
    pub async fn fetch_all<F>(&self, request: &SearchRequest, mut on_page: F) -> Result<Vec<Record>>
    where
        F: FnMut(PageProgress),
    {
        let initial_url = initial_url(&request.url, &request.keep_alive)?;
        let scroll_url = scroll_endpoint(&request.url)?;

        tracing::debug!(url = %initial_url, "Sending initial scroll query");
        let first = self.post_page(request, &initial_url, &request.body).await?;

        let reported_total = first.hits.reported_total();
        let mut cursor = first.scroll_id;
        let mut records = Vec::new();
        let mut page = 1;
        let mut page_hits = append_hits(&mut records, first.hits.hits)?;
        on_page(PageProgress {
            page,
            page_hits,
            total_so_far: records.len(),
        });

        loop {
            if page_hits == 0 {
                break;
            }
            if matches!(reported_total, Some(total) if records.len() >= total) {
                break;
            }
            let Some(current) = cursor.as_deref().filter(|c| !c.is_empty()) else {
                break;
            };

            let continuation = ScrollContinuation {
                scroll: &request.keep_alive,
                scroll_id: current,
            };
            let next = self.post_page(request, &scroll_url, &continuation).await?;

            if let Some(rotated) = next.scroll_id.filter(|c| !c.is_empty()) {
                cursor = Some(rotated);
            }
            page += 1;
            page_hits = append_hits(&mut records, next.hits.hits)?;
            on_page(PageProgress {
                page,
                page_hits,
                total_so_far: records.len(),
            });
        }

        if let Some(spent) = cursor.filter(|c| !c.is_empty()) {
            self.clear_cursor(request, &scroll_url, &spent).await;
        }

        tracing::info!(
            pages = page,
            records = records.len(),
            reported_total = ?reported_total,
            "Search cursor exhausted"
        );

        Ok(records)
    }

    async fn post_page<B: Serialize + ?Sized>(
        &self,
        request: &SearchRequest,
        url: &str,
        body: &B,
    ) -> std::result::Result<ScrollPage, SearchError> {
        let mut builder = self
            .client
            .post(url)
            .timeout(request.timeout)
            .json(body);

        if let Some(auth) = request.authorization_value() {
            builder = builder.header("Authorization", auth);
        }

        let resp = builder.send().await.map_err(transport_error)?;
        let status = resp.status();
        let text = resp.text().await.map_err(transport_error)?;
        let parsed: Option<Value> = serde_json::from_str(&text).ok();

        if let Some(reason) = parsed.as_ref().and_then(error_reason) {
            return Err(SearchError::Backend(reason));
        }

        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                message: text.chars().take(512).collect(),
            });
        }

        let parsed = parsed.ok_or_else(|| {
            SearchError::InvalidResponse("search response is not valid JSON".to_string())
        })?;

        serde_json::from_value(parsed).map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }

    /// Releases the cursor; failure only costs backend memory until keep-alive expiry
    async fn clear_cursor(&self, request: &SearchRequest, url: &str, cursor: &str) {
        let mut builder = self
            .client
            .delete(url)
            .timeout(request.timeout)
            .json(&ClearScroll { scroll_id: cursor });

        if let Some(auth) = request.authorization_value() {
            builder = builder.header("Authorization", auth);
        }

        match builder.send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!("Released search cursor");
            }
            Ok(resp) => {
                tracing::debug!(status = %resp.status(), "Search cursor release was refused");
            }
            Err(e) => {
                tracing::debug!(error = %e, "Failed to release search cursor");
            }
        }
    }
}

fn append_hits(records: &mut Vec<Record>, hits: Vec<Value>) -> Result<usize> {
    let count = hits.len();
    for hit in &hits {
        let record = Record::from_hit(hit).map_err(SearchError::InvalidResponse)?;
        records.push(record);
    }
    Ok(count)
}

fn transport_error(err: reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Timeout(err.to_string())
    } else {
        SearchError::ConnectionFailed(err.to_string())
    }
}

fn parse_search_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| {
        ResendError::Configuration(format!("Invalid search URL '{url}': {e}"))
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ResendError::Configuration(format!(
            "Search URL must use http or https, got '{url}'"
        )));
    }
    Ok(parsed)
}

/// The search URL with the keep-alive appended as the `scroll` parameter
fn initial_url(url: &str, keep_alive: &str) -> Result<String> {
    let mut parsed = parse_search_url(url)?;
    parsed.query_pairs_mut().append_pair("scroll", keep_alive);
    Ok(parsed.to_string())
}

/// Continuation endpoint derived from the search URL's scheme and host
fn scroll_endpoint(url: &str) -> Result<String> {
    let parsed = parse_search_url(url)?;
    Ok(format!("{}{SCROLL_PATH}", parsed.origin().ascii_serialization()))
}
