//! Remote reminder store boundary.
//!
//! The engine never owns reminder persistence; a remote REST service
//! does. `ReminderStore` is the seam the lifecycle manager talks
//! through, and `HttpReminderStore` is the production implementation.
//! Transport mechanics (auth headers, retries at the proxy) belong to
//! the host app, not here.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::models::{IntakeLog, ReminderDefinition};
use crate::schedule::DateWindow;

/// Errors from the remote store, split so callers can tell a transient
/// transport failure (retryable, show stale data) from a rejected
/// write (not retryable, surface verbatim).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot reach reminder store at {0}")]
    Connection(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("Store temporarily unavailable: HTTP {status}")]
    Unavailable { status: u16 },

    #[error("Write conflict: HTTP {status}: {body}")]
    Conflict { status: u16, body: String },

    #[error("Store rejected the request: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Malformed response from store: {0}")]
    ResponseParsing(String),
}

impl StoreError {
    /// Transient failures mean "stale or unavailable", never "empty".
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Connection(_)
                | StoreError::Timeout(_)
                | StoreError::Transport(_)
                | StoreError::Unavailable { .. }
        )
    }
}

/// Persistence seam for reminder definitions and intake logs.
#[allow(async_fn_in_trait)]
pub trait ReminderStore {
    /// All active reminder definitions owned by `owner_id`.
    async fn fetch_reminders(&self, owner_id: Uuid)
        -> Result<Vec<ReminderDefinition>, StoreError>;

    /// Intake logs for `owner_id` whose scheduled date falls in `window`.
    async fn fetch_intake_logs(
        &self,
        owner_id: Uuid,
        window: DateWindow,
    ) -> Result<Vec<IntakeLog>, StoreError>;

    /// Persist a new definition; returns the assigned id.
    async fn create_reminder(&self, def: &ReminderDefinition) -> Result<Uuid, StoreError>;

    /// Replace the definition stored under `id`.
    async fn update_reminder(&self, id: Uuid, def: &ReminderDefinition) -> Result<(), StoreError>;

    /// Mark the definition inactive as of the server's local date.
    async fn delete_reminder(&self, id: Uuid) -> Result<(), StoreError>;

    /// Record a "taken" event. Accepted even for slots the current
    /// definition would no longer generate.
    async fn log_taken(&self, log: &IntakeLog) -> Result<(), StoreError>;
}

// ═══════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct RemindersResponse {
    reminders: Vec<ReminderDefinition>,
}

#[derive(Debug, Deserialize)]
struct IntakeLogsResponse {
    logs: Vec<IntakeLog>,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: Uuid,
}

/// Body for POST /intake-logs.
#[derive(Debug, Serialize)]
struct LogTakenRequest<'a> {
    reminder_id: Uuid,
    scheduled_date: NaiveDate,
    scheduled_time: NaiveTime,
    status: &'a str,
}

// ═══════════════════════════════════════════
// HTTP implementation
// ═══════════════════════════════════════════

/// REST client against the remote reminder service.
pub struct HttpReminderStore {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpReminderStore {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        }
    }

    /// Store at the configured base URL (`MEDSCHED_STORE_URL` override).
    pub fn from_env() -> Self {
        Self::new(&config::store_base_url(), config::DEFAULT_HTTP_TIMEOUT_SECS)
    }

    fn map_send_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_connect() {
            StoreError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            StoreError::Timeout(self.timeout_secs)
        } else {
            StoreError::Transport(e.to_string())
        }
    }

    /// Map non-2xx responses onto the error taxonomy.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        match code {
            403 | 409 | 412 => Err(StoreError::Conflict { status: code, body }),
            500..=599 => Err(StoreError::Unavailable { status: code }),
            _ => Err(StoreError::Rejected { status: code, body }),
        }
    }
}

impl ReminderStore for HttpReminderStore {
    async fn fetch_reminders(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<ReminderDefinition>, StoreError> {
        let url = format!("{}/owners/{}/reminders?status=active", self.base_url, owner_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;
        let parsed: RemindersResponse = response
            .json()
            .await
            .map_err(|e| StoreError::ResponseParsing(e.to_string()))?;
        Ok(parsed.reminders)
    }

    async fn fetch_intake_logs(
        &self,
        owner_id: Uuid,
        window: DateWindow,
    ) -> Result<Vec<IntakeLog>, StoreError> {
        let url = format!(
            "{}/owners/{}/intake-logs?from={}&to={}",
            self.base_url, owner_id, window.from, window.to
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;
        let parsed: IntakeLogsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::ResponseParsing(e.to_string()))?;
        Ok(parsed.logs)
    }

    async fn create_reminder(&self, def: &ReminderDefinition) -> Result<Uuid, StoreError> {
        let url = format!("{}/reminders", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(def)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let response = Self::check_status(response).await?;
        let parsed: CreatedResponse = response
            .json()
            .await
            .map_err(|e| StoreError::ResponseParsing(e.to_string()))?;
        Ok(parsed.id)
    }

    async fn update_reminder(&self, id: Uuid, def: &ReminderDefinition) -> Result<(), StoreError> {
        let url = format!("{}/reminders/{}", self.base_url, id);
        let response = self
            .client
            .put(&url)
            .json(def)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn delete_reminder(&self, id: Uuid) -> Result<(), StoreError> {
        let url = format!("{}/reminders/{}", self.base_url, id);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn log_taken(&self, log: &IntakeLog) -> Result<(), StoreError> {
        let url = format!("{}/intake-logs", self.base_url);
        let body = LogTakenRequest {
            reminder_id: log.reminder_id,
            scheduled_date: log.scheduled_date,
            scheduled_time: log.scheduled_time,
            status: log.status.as_str(),
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frequency;
    use chrono::NaiveTime;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store = HttpReminderStore::new("http://localhost:8080/", 5);
        assert_eq!(store.base_url, "http://localhost:8080");
    }

    #[test]
    fn transient_split_matches_taxonomy() {
        assert!(StoreError::Connection("x".into()).is_transient());
        assert!(StoreError::Timeout(30).is_transient());
        assert!(StoreError::Unavailable { status: 503 }.is_transient());
        assert!(!StoreError::Conflict {
            status: 409,
            body: String::new()
        }
        .is_transient());
        assert!(!StoreError::Rejected {
            status: 422,
            body: String::new()
        }
        .is_transient());
    }

    #[test]
    fn reminders_response_parses_wire_shape() {
        let json = r#"{
            "reminders": [{
                "id": "8f5b5a60-6f3e-4f3b-9a6e-3a1c2b4d5e6f",
                "owner_id": "00000000-0000-0000-0000-000000000001",
                "medicine_name": "Metformin",
                "dosage": "500mg",
                "frequency": "weekly",
                "specific_days": ["Mon", "Wed"],
                "times_of_day": ["08:00:00"],
                "start_date": "2024-01-01",
                "end_date": null,
                "notes": null,
                "status": "active",
                "deactivated_on": null
            }]
        }"#;
        let parsed: RemindersResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.reminders.len(), 1);
        let def = &parsed.reminders[0];
        assert_eq!(def.frequency, Frequency::Weekly);
        assert_eq!(def.specific_days.len(), 2);
        assert_eq!(
            def.times_of_day[0],
            NaiveTime::from_hms_opt(8, 0, 0).unwrap()
        );
    }

    #[test]
    fn intake_logs_response_parses_wire_shape() {
        let json = r#"{
            "logs": [{
                "reminder_id": "8f5b5a60-6f3e-4f3b-9a6e-3a1c2b4d5e6f",
                "scheduled_date": "2024-01-10",
                "scheduled_time": "08:00:00",
                "status": "taken",
                "logged_at": "2024-01-10T08:05:00Z"
            }]
        }"#;
        let parsed: IntakeLogsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.logs.len(), 1);
    }

    #[test]
    fn log_taken_request_serializes_status_string() {
        let body = LogTakenRequest {
            reminder_id: Uuid::nil(),
            scheduled_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            scheduled_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            status: "taken",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "taken");
        assert_eq!(json["scheduled_date"], "2024-01-10");
    }
}
