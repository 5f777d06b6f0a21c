//! reqwest-backed schedule store client

use crate::api::{ApiFuture, ApiResult, ScheduleApi};
use crate::error::ApiError;
use crate::types::{
    CreatedSchedule, DashboardMetrics, Event, EventsEnvelope, NewSchedule, Schedule, ScheduleId,
    StatusUpdate,
};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Schedule store client over HTTP/JSON
#[derive(Clone, Debug)]
pub struct HttpScheduleApi {
    client: Client,
    base_url: Arc<str>,
}

impl HttpScheduleApi {
    /// Create a client for the store at `base_url` without a request timeout
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if `base_url` is not an absolute URL
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, None)
    }

    /// Create a client with an optional per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if `base_url` is not an absolute URL,
    /// or `ApiError::RequestFailed` if the HTTP client cannot be built
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        Url::parse(trimmed).map_err(|e| ApiError::InvalidBaseUrl(format!("{trimmed}: {e}")))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: Arc::from(trimmed),
        })
    }

    /// Base URL requests are issued against
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get<T>(&self, path: &str) -> ApiFuture<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let request = self.client.get(self.url(path));
        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|e| ApiError::RequestFailed(e.to_string()))?;
            read_json(response).await
        })
    }
}

/// Map a response to its decoded body, or to `ApiError::Status`
async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let response = check_status(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

impl ScheduleApi for HttpScheduleApi {
    fn list_schedules(&self) -> ApiFuture<Vec<Schedule>> {
        let fetch = self.get::<Option<Vec<Schedule>>>("/schedules");
        Box::pin(async move { Ok(fetch.await?.unwrap_or_default()) })
    }

    fn dashboard_metrics(&self) -> ApiFuture<DashboardMetrics> {
        self.get("/dashboard")
    }

    fn create_schedule(&self, schedule: NewSchedule) -> ApiFuture<CreatedSchedule> {
        let request = self.client.post(self.url("/schedules")).json(&schedule);
        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|e| ApiError::RequestFailed(e.to_string()))?;
            read_json(response).await
        })
    }

    fn list_events(&self, schedule_id: &ScheduleId) -> ApiFuture<Vec<Event>> {
        let fetch = self.get::<EventsEnvelope>(&format!("/schedules/{schedule_id}/events"));
        Box::pin(async move { Ok(fetch.await?.events.unwrap_or_default()) })
    }

    fn update_event_status(&self, update: StatusUpdate) -> ApiFuture<Option<Event>> {
        let request = self
            .client
            .patch(self.url(&format!("/schedules/{}/events", update.schedule_id)))
            .json(&update);
        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|e| ApiError::RequestFailed(e.to_string()))?;
            let body = check_status(response)
                .await?
                .text()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()))?;

            // The store may acknowledge with a bare message instead of the event
            match serde_json::from_str::<Event>(&body) {
                Ok(event) => Ok(Some(event)),
                Err(e) => {
                    tracing::debug!(error = %e, "Status update acknowledged without event body");
                    Ok(None)
                },
            }
        })
    }
}
