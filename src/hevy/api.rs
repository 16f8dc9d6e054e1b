//! Thin client for the Hevy public API.
//!
//! Every list endpoint is paginated the same way: `page`/`pageSize` query
//! parameters and a `page_count` field in the envelope. The client walks
//! all pages and hands back the raw records, so callers see one synchronous
//! call returning a complete list.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::WorkoutSource;
use crate::error::{Error, Result};

const PAGE_SIZE: u32 = 30;

pub struct HevyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HevyClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn fetch_pages(
        &self,
        path: &str,
        list_key: &str,
        extra_query: &[(&str, String)],
    ) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        let mut page: u64 = 1;

        loop {
            let mut request = self
                .http
                .get(format!("{}{}", self.base_url, path))
                .header("api-key", &self.api_key)
                .query(&[("page", page.to_string()), ("pageSize", PAGE_SIZE.to_string())]);
            for (key, value) in extra_query {
                request = request.query(&[(*key, value.as_str())]);
            }

            let body: Value = request.send().await?.error_for_status()?.json().await?;

            let page_count = body.get("page_count").and_then(Value::as_u64).unwrap_or(0);
            match body.get(list_key) {
                Some(Value::Array(items)) => records.extend(items.iter().cloned()),
                Some(Value::Null) | None => {}
                Some(other) => {
                    return Err(Error::RemoteFetch(format!(
                        "expected '{}' to be a list, got {}",
                        list_key, other
                    )))
                }
            }

            if page >= page_count {
                break;
            }
            page += 1;
        }

        Ok(records)
    }
}

impl WorkoutSource for HevyClient {
    async fn fetch_workouts(&self) -> Result<Vec<Value>> {
        self.fetch_pages("/workouts", "workouts", &[]).await
    }

    async fn fetch_workout_events(&self, since: DateTime<Utc>) -> Result<Vec<Value>> {
        let since = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        self.fetch_pages("/workouts/events", "events", &[("since", since)])
            .await
    }

    async fn fetch_exercise_templates(&self) -> Result<Vec<Value>> {
        self.fetch_pages("/exercise_templates", "exercise_templates", &[])
            .await
    }

    async fn fetch_routines(&self) -> Result<Vec<Value>> {
        self.fetch_pages("/routines", "routines", &[]).await
    }
}
