//! HTTP client for the task API.
//!
//! [`ApiClient`] implements [`Backend`] over the REST endpoints the task
//! tracker exposes under its `/api` prefix:
//!
//! - `GET  /tasks?status=todo&status=in_progress`
//! - `POST /time-entries`
//! - `GET  /time-entries?date=YYYY-MM-DD`
//!
//! Requests share one pooled reqwest client. Writes are attempted exactly
//! once: the tracker reports a failed write to the user instead of retrying.
//!
//! # Example
//!
//! ```no_run
//! use pomotrack_client::backend::Backend;
//! use pomotrack_client::client::{ApiClient, ApiClientConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ApiClientConfig::new("https://tasks.example.com/api".to_string())
//!         .with_session_token("tok_123".to_string());
//!     let client = ApiClient::new(config).unwrap();
//!
//!     for task in client.list_active_tasks().await.unwrap() {
//!         println!("{} {}", task.task_id, task.title);
//!     }
//! }
//! ```

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::backend::{Backend, BackendError};
use crate::config::Config;
use crate::types::{LoggedEntry, Task, TimeEntry};

/// HTTP request timeout.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Task statuses that count as active.
const ACTIVE_TASK_STATUSES: [&str; 2] = ["todo", "in_progress"];

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// API base URL, e.g. `https://tasks.example.com/api`.
    pub api_url: String,

    /// Session token sent as a bearer token.
    pub session_token: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl ApiClientConfig {
    /// Creates a configuration with no session token and the default timeout.
    #[must_use]
    pub fn new(api_url: String) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            session_token: None,
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_session_token(mut self, token: String) -> Self {
        self.session_token = Some(token);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<&Config> for ApiClientConfig {
    fn from(config: &Config) -> Self {
        let mut client_config = Self::new(config.api_url.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs));
        client_config.session_token.clone_from(&config.session_token);
        client_config
    }
}

/// HTTP implementation of [`Backend`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    api_url: String,
    client: Client,
}

impl ApiClient {
    /// Creates a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidHeader`] if the session token cannot be
    /// used as a header value, or [`BackendError::Http`] if the underlying
    /// client cannot be built.
    pub fn new(config: ApiClientConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.session_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            api_url: config.api_url,
            client,
        })
    }

    /// Returns the API base URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Maps non-success statuses to errors.
    async fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => {
                error!("Authentication failed");
                Err(BackendError::AuthFailed)
            }
            _ => {
                let message = response.text().await.unwrap_or_default();
                warn!(
                    status = status.as_u16(),
                    message = %message,
                    "Task API returned an error"
                );
                Err(BackendError::ServerError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
        let response = Self::check_status(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl Backend for ApiClient {
    async fn list_active_tasks(&self) -> Result<Vec<Task>, BackendError> {
        let url = self.url("/tasks");
        let query: Vec<(&str, &str)> = ACTIVE_TASK_STATUSES
            .iter()
            .map(|status| ("status", *status))
            .collect();

        debug!(url = %url, "Fetching active tasks");

        let response = self.client.get(&url).query(&query).send().await?;
        let tasks: Vec<Task> = Self::decode(response).await?;

        debug!(tasks = tasks.len(), "Active tasks loaded");
        Ok(tasks)
    }

    async fn record_time_entry(&self, entry: &TimeEntry) -> Result<(), BackendError> {
        let url = self.url("/time-entries");
        let body = serde_json::to_string(entry)?;

        debug!(
            url = %url,
            task_id = %entry.task_ref,
            duration = entry.duration_minutes,
            "Recording time entry"
        );

        let response = self.client.post(&url).body(body).send().await?;
        Self::check_status(response).await?;

        info!(
            task_id = %entry.task_ref,
            duration = entry.duration_minutes,
            "Time entry recorded"
        );
        Ok(())
    }

    async fn list_time_entries_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<LoggedEntry>, BackendError> {
        let url = self.url("/time-entries");
        let date = date.format("%Y-%m-%d").to_string();

        debug!(url = %url, date = %date, "Fetching time entries");

        let response = self
            .client
            .get(&url)
            .query(&[("date", date.as_str())])
            .send()
            .await?;
        Self::decode(response).await
    }
}
