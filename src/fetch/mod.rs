//! HTTP profile fetching.
//!
//! [`HttpProfileFetcher`] is the production [`ItemFetcher`]: it validates the
//! target, downloads the page with retries for transient failures and turns
//! the HTML into a [`ProfilePage`](crate::parse::ProfilePage) JSON payload.

mod request;
mod url;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use tokio_retry::RetryIf;

use crate::config::MAX_RESPONSE_BODY_SIZE;
use crate::error_handling::{is_retriable_error, FetchError, RetryPolicy};
use crate::orchestrator::{FetchContext, ItemFetcher};
use crate::parse::extract_profile;

use request::RequestHeaders;

pub use self::url::validate_and_normalize_url;

/// A downloaded page, before parsing.
#[derive(Debug)]
struct FetchedPage {
    final_url: String,
    status: u16,
    body: String,
}

/// Fetches public profile pages over HTTP.
pub struct HttpProfileFetcher {
    client: Arc<reqwest::Client>,
    retry: RetryPolicy,
    max_body_size: usize,
}

impl HttpProfileFetcher {
    /// Creates a fetcher using the default retry policy and body size limit.
    pub fn new(client: Arc<reqwest::Client>) -> Self {
        Self {
            client,
            retry: RetryPolicy::fetch_default(),
            max_body_size: MAX_RESPONSE_BODY_SIZE,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Performs one GET and reads the body.
    ///
    /// Non-success statuses are turned into `reqwest::Error`s so the status
    /// survives in the error chain for categorization.
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        let request = RequestHeaders::apply_to_request_builder(self.client.get(url));
        let response = request.send().await?;

        let status = response.status();
        let final_url = response.url().to_string();
        debug!("{url} answered {status} (final url: {final_url})");
        let response = response.error_for_status()?;

        if let Some(length) = response.content_length() {
            let length = usize::try_from(length).unwrap_or(usize::MAX);
            if length > self.max_body_size {
                return Err(FetchError::BodyTooLarge {
                    size: length,
                    limit: self.max_body_size,
                }
                .into());
            }
        }

        let body = response.text().await?;
        if body.len() > self.max_body_size {
            return Err(FetchError::BodyTooLarge {
                size: body.len(),
                limit: self.max_body_size,
            }
            .into());
        }

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ItemFetcher for HttpProfileFetcher {
    async fn fetch(&self, target: &str, ctx: &FetchContext<'_>) -> Result<serde_json::Value> {
        if ctx.credentials.has_login() {
            debug!("Credentials supplied; fetching the public profile view of {target}");
        }

        let url = validate_and_normalize_url(target)?;
        let url_ref = url.as_str();
        let attempts = AtomicU32::new(0);
        let attempts_ref = &attempts;

        let page = RetryIf::spawn(
            self.retry.strategy(),
            move || {
                let attempt = attempts_ref.fetch_add(1, Ordering::SeqCst);
                if attempt > 0 {
                    warn!("Retrying {url_ref} (attempt {})", attempt + 1);
                }
                self.fetch_page(url_ref)
            },
            |e: &anyhow::Error| is_retriable_error(e),
        )
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;

        let profile = extract_profile(&page.body, target, &page.final_url, page.status)
            .with_context(|| format!("Failed to extract profile from {}", page.final_url))?;

        serde_json::to_value(&profile).context("Failed to serialize profile")
    }
}
