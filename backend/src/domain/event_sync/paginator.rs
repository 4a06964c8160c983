//! Rate-limited walk over page-numbered upstream collections.
//!
//! The walk starts at page 1 and stops at the first empty page. Transient
//! failures retry the same page with jittered exponential backoff up to a
//! bounded number of attempts; after that the walk ends early and reports the
//! items gathered so far as partial.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{PageNumber, PageRequest, PageSize};
use tracing::{debug, warn};

use crate::domain::ports::IntraSourceError;

use super::rate_limiter::RequestRateLimiter;
use super::{BackoffJitter, SyncSleeper};

/// Paginator tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginatorConfig {
    /// Items requested per page.
    pub page_size: PageSize,
    /// Attempts per page, including the first call.
    pub max_attempts: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Backoff cap.
    pub max_backoff: Duration,
    /// Upper bound on pages fetched in one walk.
    pub max_pages: u32,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::clamped(100),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            max_pages: 1_000,
        }
    }
}

/// One page-numbered upstream collection.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Item type yielded by each page.
    type Item: Send;

    /// Fetch one page. An empty page marks the end of the collection.
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<Self::Item>, IntraSourceError>;
}

/// How a walk ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageWalkStatus {
    /// An empty page was reached.
    Complete,
    /// A page kept failing transiently until its attempts ran out.
    RetriesExhausted {
        /// Page that could not be fetched.
        page: PageNumber,
        /// Last error observed for that page.
        error: IntraSourceError,
    },
    /// The configured page cap was hit before an empty page.
    PageLimitReached {
        /// Pages fetched before stopping.
        pages: u32,
    },
}

/// Items gathered by a walk plus how it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWalk<T> {
    /// Items in page order.
    pub items: Vec<T>,
    /// Upstream requests issued, retries included.
    pub requests: u32,
    /// Terminal status.
    pub status: PageWalkStatus,
}

impl<T> PageWalk<T> {
    /// Return whether the walk reached the end of the collection.
    pub fn is_complete(&self) -> bool {
        matches!(self.status, PageWalkStatus::Complete)
    }
}

enum PageFetch<T> {
    Page(Vec<T>),
    Exhausted(IntraSourceError),
}

/// Walks page-numbered collections through a shared rate limiter.
pub struct Paginator {
    config: PaginatorConfig,
    limiter: Arc<dyn RequestRateLimiter>,
    sleeper: Arc<dyn SyncSleeper>,
    jitter: Arc<dyn BackoffJitter>,
    clock: Arc<dyn Clock>,
}

impl Paginator {
    /// Build a paginator.
    pub fn new(
        config: PaginatorConfig,
        limiter: Arc<dyn RequestRateLimiter>,
        sleeper: Arc<dyn SyncSleeper>,
        jitter: Arc<dyn BackoffJitter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            limiter,
            sleeper,
            jitter,
            clock,
        }
    }

    /// Fetch pages from `source` until an empty page is returned.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error. Retryable errors never escape;
    /// they end the walk with [`PageWalkStatus::RetriesExhausted`].
    pub async fn walk<S>(&self, source: &S) -> Result<PageWalk<S::Item>, IntraSourceError>
    where
        S: PageSource + ?Sized,
    {
        let mut items = Vec::new();
        let mut requests = 0_u32;
        let mut request = PageRequest::first(self.config.page_size);
        let max_pages = self.config.max_pages.max(1);

        for fetched in 0..max_pages {
            match self.fetch_page(source, request, &mut requests).await? {
                PageFetch::Page(page) if page.is_empty() => {
                    debug!(pages = fetched, requests, "page walk complete");
                    return Ok(PageWalk {
                        items,
                        requests,
                        status: PageWalkStatus::Complete,
                    });
                }
                PageFetch::Page(page) => items.extend(page),
                PageFetch::Exhausted(error) => {
                    return Ok(PageWalk {
                        items,
                        requests,
                        status: PageWalkStatus::RetriesExhausted {
                            page: request.number(),
                            error,
                        },
                    });
                }
            }

            match request.next() {
                Some(next) => request = next,
                None => break,
            }
        }

        warn!(max_pages, requests, "page walk stopped at page cap");
        Ok(PageWalk {
            items,
            requests,
            status: PageWalkStatus::PageLimitReached { pages: max_pages },
        })
    }

    async fn fetch_page<S>(
        &self,
        source: &S,
        request: PageRequest,
        requests: &mut u32,
    ) -> Result<PageFetch<S::Item>, IntraSourceError>
    where
        S: PageSource + ?Sized,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1_u32;

        loop {
            self.limiter.acquire().await;
            *requests = requests.saturating_add(1);

            match source.fetch_page(request).await {
                Ok(page) => return Ok(PageFetch::Page(page)),
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let delay = self.jitter.jittered_delay(
                        retry_base_delay(&self.config, attempt),
                        attempt,
                        self.clock.utc(),
                    );
                    warn!(
                        page = %request.number(),
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        %error,
                        "retrying page after transient failure"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
                Err(error) if error.is_retryable() => {
                    warn!(
                        page = %request.number(),
                        attempts = attempt,
                        %error,
                        "page retries exhausted"
                    );
                    return Ok(PageFetch::Exhausted(error));
                }
                Err(error) => return Err(error),
            }
        }
    }
}

fn retry_base_delay(config: &PaginatorConfig, attempt: u32) -> Duration {
    let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
    let base_ms = u64::try_from(config.initial_backoff.as_millis()).unwrap_or(u64::MAX);
    let max_ms = u64::try_from(config.max_backoff.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
}
