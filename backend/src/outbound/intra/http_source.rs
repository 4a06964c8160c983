//! Reqwest-backed intranet event source.
//!
//! This adapter owns transport details only: endpoint construction, bearer
//! authentication, HTTP error mapping, and JSON decoding into domain events.
//! Pacing and retries belong to the sync engine.

use std::time::Duration;

use async_trait::async_trait;
use pagination::PageRequest;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use super::dto::{EventDto, EventUserDto};
use super::status::{map_status_error, map_transport_error};
use crate::domain::ports::{
    AccessToken, EventSubscriber, IntraEventSource, IntraSourceError, UpstreamEvent,
};
use crate::domain::{CampusId, EventId};

const USER_AGENT: &str = "campus-events-sync/0.1";

/// Intranet adapter issuing authenticated GET requests under one API base URL.
pub struct IntraHttpEventSource {
    client: Client,
    base_url: Url,
}

impl IntraHttpEventSource {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    /// ```rust,ignore
    /// let source = IntraHttpEventSource::new(base_url, Duration::from_secs(30))?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint<I>(&self, segments: I) -> Result<Url, IntraSourceError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                IntraSourceError::invalid_request(format!(
                    "intranet base URL {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn campus_events_request(
        &self,
        campus_id: CampusId,
        token: &AccessToken,
    ) -> Result<RequestBuilder, IntraSourceError> {
        let campus = campus_id.to_string();
        let url = self.endpoint(["v2", "campus", campus.as_str(), "events"])?;
        Ok(self.client.get(url).bearer_auth(token.secret()))
    }

    fn subscribers_request(
        &self,
        event_id: EventId,
        token: &AccessToken,
        page: PageRequest,
    ) -> Result<RequestBuilder, IntraSourceError> {
        let event = event_id.to_string();
        let url = self.endpoint(["v2", "events", event.as_str(), "events_users"])?;
        Ok(self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .query(&page))
    }
}

async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, IntraSourceError> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|error| map_transport_error(&error))?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|error| map_transport_error(&error))?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    decode(body.as_ref())
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, IntraSourceError> {
    serde_json::from_slice(body).map_err(|error| {
        IntraSourceError::decode(format!("invalid intranet JSON payload: {error}"))
    })
}

#[async_trait]
impl IntraEventSource for IntraHttpEventSource {
    async fn list_campus_events(
        &self,
        campus_id: CampusId,
        token: &AccessToken,
    ) -> Result<Vec<UpstreamEvent>, IntraSourceError> {
        let events: Vec<EventDto> =
            fetch_json(self.campus_events_request(campus_id, token)?).await?;
        Ok(events.into_iter().map(UpstreamEvent::from).collect())
    }

    async fn list_event_subscribers(
        &self,
        event_id: EventId,
        token: &AccessToken,
        page: PageRequest,
    ) -> Result<Vec<EventSubscriber>, IntraSourceError> {
        let subscribers: Vec<EventUserDto> =
            fetch_json(self.subscribers_request(event_id, token, page)?).await?;
        Ok(subscribers.into_iter().map(EventSubscriber::from).collect())
    }
}
