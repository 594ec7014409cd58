// src/api/http.rs

//! HTTP client for the panel's `gdaemon_api`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::ControlPlane;
use crate::config::ApiSection;
use crate::errors::{GamedError, Result};
use crate::task::{TaskRecord, TaskStatus};
use crate::types::{TargetId, TargetScope, TaskCommand, TaskId};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A task as the panel serialises it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDto {
    pub id: TaskId,
    pub command: String,
    pub server_id: TargetId,
    /// `YYYY-MM-DD HH:MM:SS` in UTC; RFC 3339 is accepted too.
    pub execute_date: String,
    #[serde(default)]
    pub status: Option<u8>,
}

impl TaskDto {
    /// Convert into a record. Unknown commands, dates and status codes are
    /// errors.
    pub fn into_record(self) -> std::result::Result<TaskRecord, String> {
        let command: TaskCommand = self.command.parse()?;
        let execute_date = parse_date(&self.execute_date)
            .ok_or_else(|| format!("invalid execute_date '{}'", self.execute_date))?;

        let mut task = TaskRecord::new(self.id, self.server_id, command, execute_date);
        if let Some(code) = self.status {
            task.status = TaskStatus::from_code(code)
                .ok_or_else(|| format!("unknown status code {code}"))?;
        }
        Ok(task)
    }
}

/// Decode a `servers_tasks` payload, dropping entries that can't be used.
pub fn decode_tasks(body: &str) -> Result<Vec<TaskRecord>> {
    let dtos: Vec<TaskDto> = serde_json::from_str(body)
        .map_err(|e| GamedError::SyncFailure(format!("malformed task list: {e}")))?;

    let tasks = dtos
        .into_iter()
        .filter_map(|dto| {
            let id = dto.id;
            match dto.into_record() {
                Ok(task) => Some(task),
                Err(reason) => {
                    warn!(task_id = id, %reason, "skipping task from control plane");
                    None
                }
            }
        })
        .collect();

    Ok(tasks)
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|d| d.with_timezone(&Utc))
        })
}

#[derive(Debug, Serialize)]
struct ResultBody<'a> {
    status: u8,
    output: &'a str,
}

#[derive(Debug, Serialize)]
struct FailBody<'a> {
    output: &'a str,
}

/// Production [`ControlPlane`].
#[derive(Debug, Clone)]
pub struct HttpControlPlane {
    client: Client,
    base: String,
    key: Option<String>,
}

impl HttpControlPlane {
    pub fn new(api: &ApiSection) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GamedError::ConfigError(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base: format!("{}/gdaemon_api", api.host.trim_end_matches('/')),
            key: api.key.clone().filter(|k| !k.is_empty()),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| GamedError::SyncFailure(format!("{what}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GamedError::SyncFailure(format!(
                "{what}: control plane answered {status}"
            )));
        }
        Ok(response)
    }

    async fn fetch(&self, scope: TargetScope) -> Result<Vec<TaskRecord>> {
        let url = format!("{}/servers_tasks", self.base);
        let response = self.send(self.client.get(&url), "pulling tasks").await?;
        let body = response
            .text()
            .await
            .map_err(|e| GamedError::SyncFailure(format!("reading task list: {e}")))?;

        let mut tasks = decode_tasks(&body)?;
        if let TargetScope::Target(id) = scope {
            tasks.retain(|t| t.target_id == id);
        }

        debug!(%scope, count = tasks.len(), "pulled tasks");
        Ok(tasks)
    }

    async fn deliver(&self, task_id: TaskId, status: TaskStatus, output: &str) -> Result<()> {
        let url = format!("{}/servers_tasks/{task_id}", self.base);

        if status == TaskStatus::Error {
            let fail = self.client.post(format!("{url}/fail")).json(&FailBody { output });
            self.send(fail, "reporting task failure").await?;
        }

        let update = self.client.put(&url).json(&ResultBody {
            status: status.code(),
            output,
        });
        self.send(update, "updating task status").await?;

        debug!(task_id, %status, "result delivered");
        Ok(())
    }
}

impl ControlPlane for HttpControlPlane {
    fn pull_tasks(
        &self,
        scope: TargetScope,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<TaskRecord>>> + Send + '_>> {
        Box::pin(self.fetch(scope))
    }

    fn push_result<'a>(
        &'a self,
        task_id: TaskId,
        status: TaskStatus,
        output: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(self.deliver(task_id, status, output))
    }
}
