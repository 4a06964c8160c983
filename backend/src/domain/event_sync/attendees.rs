//! Attendee resolution through a full subscriber page walk.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::PageRequest;
use tracing::{debug, warn};

use crate::domain::EventId;
use crate::domain::ports::{AccessToken, EventSubscriber, IntraEventSource, IntraSourceError};

use super::paginator::{PageSource, PageWalkStatus, Paginator};

/// Subscriber count observed for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendeeCount {
    /// Subscribers seen across every fetched page.
    pub count: u32,
    /// False when the walk stopped before the terminating empty page.
    pub complete: bool,
}

/// Counts an event's subscribers by walking its subscriber collection.
pub struct AttendeeResolver {
    source: Arc<dyn IntraEventSource>,
    paginator: Paginator,
}

struct SubscriberPages<'a> {
    source: &'a dyn IntraEventSource,
    event_id: EventId,
    token: &'a AccessToken,
}

#[async_trait]
impl<'a> PageSource for SubscriberPages<'a> {
    type Item = EventSubscriber;

    async fn fetch_page(
        &self,
        request: PageRequest,
    ) -> Result<Vec<EventSubscriber>, IntraSourceError> {
        self.source
            .list_event_subscribers(self.event_id, self.token, request)
            .await
    }
}

impl AttendeeResolver {
    /// Build a resolver over `source`.
    pub fn new(source: Arc<dyn IntraEventSource>, paginator: Paginator) -> Self {
        Self { source, paginator }
    }

    /// Count the subscribers of `event_id`.
    ///
    /// # Errors
    ///
    /// Returns non-retryable upstream errors. Transient failures that outlast
    /// the retry budget yield a partial count instead.
    pub async fn resolve(
        &self,
        event_id: EventId,
        token: &AccessToken,
    ) -> Result<AttendeeCount, IntraSourceError> {
        let pages = SubscriberPages {
            source: self.source.as_ref(),
            event_id,
            token,
        };
        let walk = self.paginator.walk(&pages).await?;
        let count = u32::try_from(walk.items.len()).unwrap_or(u32::MAX);

        match &walk.status {
            PageWalkStatus::Complete => {
                debug!(%event_id, count, requests = walk.requests, "attendees resolved");
            }
            PageWalkStatus::RetriesExhausted { page, error } => {
                warn!(%event_id, count, %page, %error, "attendee count is partial");
            }
            PageWalkStatus::PageLimitReached { pages } => {
                warn!(%event_id, count, pages, "attendee walk hit the page cap");
            }
        }

        Ok(AttendeeCount {
            count,
            complete: walk.is_complete(),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Subscriber counting against a mocked intranet source.

    use std::time::Duration;

    use super::*;
    use crate::domain::UserId;
    use crate::domain::event_sync::paginator::PaginatorConfig;
    use crate::domain::event_sync::rate_limiter::MockRequestRateLimiter;
    use crate::domain::ports::MockIntraEventSource;
    use crate::test_support::event_sync::{ImmediateSleeper, MutableClock, NoJitter, fixed_now};
    use mockall::predicate::{always, eq};
    use pagination::PageSize;
    use rstest::rstest;

    fn subscribers(first_user: i64, count: i64) -> Vec<EventSubscriber> {
        (first_user..first_user + count)
            .map(|id| EventSubscriber {
                subscription_id: id * 10,
                user_id: UserId::new(id),
            })
            .collect()
    }

    fn resolver(source: MockIntraEventSource) -> AttendeeResolver {
        let mut limiter = MockRequestRateLimiter::new();
        limiter.expect_acquire().return_const(());
        AttendeeResolver::new(
            Arc::new(source),
            Paginator::new(
                PaginatorConfig {
                    page_size: PageSize::clamped(2),
                    max_attempts: 2,
                    initial_backoff: Duration::from_millis(10),
                    ..PaginatorConfig::default()
                },
                Arc::new(limiter),
                Arc::new(ImmediateSleeper),
                Arc::new(NoJitter),
                Arc::new(MutableClock::new(fixed_now())),
            ),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn counts_subscribers_across_pages() {
        let mut source = MockIntraEventSource::new();
        source
            .expect_list_event_subscribers()
            .with(eq(EventId::new(500)), always(), always())
            .times(3)
            .returning(|_, _, page| {
                Ok(match page.number().get() {
                    1 => subscribers(1, 2),
                    2 => subscribers(3, 1),
                    _ => Vec::new(),
                })
            });

        let count = resolver(source)
            .resolve(EventId::new(500), &AccessToken::new("token"))
            .await
            .expect("resolution succeeds");

        assert_eq!(
            count,
            AttendeeCount {
                count: 3,
                complete: true
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn event_without_subscribers_counts_zero() {
        let mut source = MockIntraEventSource::new();
        source
            .expect_list_event_subscribers()
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));

        let count = resolver(source)
            .resolve(EventId::new(7), &AccessToken::new("token"))
            .await
            .expect("resolution succeeds");

        assert_eq!(count.count, 0);
        assert!(count.complete);
    }

    #[rstest]
    #[tokio::test]
    async fn exhausted_page_yields_partial_count() {
        let mut source = MockIntraEventSource::new();
        source
            .expect_list_event_subscribers()
            .returning(|_, _, page| match page.number().get() {
                1 => Ok(subscribers(1, 2)),
                _ => Err(IntraSourceError::transport("502 bad gateway")),
            });

        let count = resolver(source)
            .resolve(EventId::new(9), &AccessToken::new("token"))
            .await
            .expect("partial result is not an error");

        assert_eq!(
            count,
            AttendeeCount {
                count: 2,
                complete: false
            }
        );
    }

    #[rstest]
    #[tokio::test]
    async fn non_retryable_error_propagates() {
        let mut source = MockIntraEventSource::new();
        source
            .expect_list_event_subscribers()
            .times(1)
            .returning(|_, _, _| Err(IntraSourceError::decode("unexpected body")));

        let error = resolver(source)
            .resolve(EventId::new(9), &AccessToken::new("token"))
            .await
            .expect_err("decode failures are fatal for the event");

        assert!(!error.is_retryable());
    }
}
