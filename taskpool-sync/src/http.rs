use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use taskpool_core::{Task, TaskStatus};
use tracing::debug;

use crate::service::{StatusUpdate, TaskPage, TaskQuery, TaskService};

/// The list endpoint rejects limits outside 1..=100.
const MAX_LIMIT: u32 = 100;

/// `TaskService` backed by the task REST API.
#[derive(Debug, Clone)]
pub struct HttpTaskService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTaskService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }

    fn task_url(&self, task_id: &str) -> String {
        format!("{}/tasks/{}", self.base_url, task_id)
    }
}

fn list_params(query: &TaskQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("user_id", query.user_id.clone()),
        (
            "status",
            query.status.map(|s| s.as_str()).unwrap_or("all").to_string(),
        ),
    ];
    if let Some(p) = query.priority {
        params.push(("priority", p.as_str().to_string()));
    }
    if let Some(c) = &query.category {
        params.push(("category", c.clone()));
    }
    if let Some(s) = &query.source {
        params.push(("source", s.clone()));
    }
    params.push(("limit", query.limit.clamp(1, MAX_LIMIT).to_string()));
    params.push(("offset", query.offset.to_string()));
    params
}

#[derive(Debug, Serialize)]
struct UpdateBody {
    status: TaskStatus,
    snoozed_until: Option<DateTime<Utc>>,
}

#[async_trait]
impl TaskService for HttpTaskService {
    async fn fetch(&self, query: &TaskQuery) -> Result<TaskPage> {
        let params = list_params(query);
        debug!(?params, "GET /tasks");

        let resp = self
            .client
            .get(self.tasks_url())
            .query(&params)
            .send()
            .await
            .context("GET /tasks")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("task service error: {status} {txt}");
        }

        resp.json::<TaskPage>().await.context("parse task page")
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<Task> {
        let body = UpdateBody {
            status: update.change.status,
            snoozed_until: update.change.effective_snooze(),
        };
        debug!(task_id = %update.task_id, status = %body.status, "PATCH /tasks/{{id}}");

        let resp = self
            .client
            .patch(self.task_url(&update.task_id))
            .query(&[("user_id", update.user_id.as_str())])
            .json(&body)
            .send()
            .await
            .with_context(|| format!("PATCH /tasks/{}", update.task_id))?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("task service error: {status} {txt}");
        }

        resp.json::<Task>().await.context("parse updated task")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskpool_core::{StatusChange, Tag};

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn tag_query_maps_to_status_and_priority() {
        let params = list_params(&TaskQuery::for_tag("u1", Tag::Medium, 20, 40));
        assert_eq!(param(&params, "user_id"), Some("u1"));
        assert_eq!(param(&params, "status"), Some("pending"));
        assert_eq!(param(&params, "priority"), Some("medium"));
        assert_eq!(param(&params, "offset"), Some("40"));
        assert_eq!(param(&params, "category"), None);
    }

    #[test]
    fn missed_query_has_no_priority() {
        let params = list_params(&TaskQuery::for_tag("u1", Tag::Missed, 20, 0));
        assert_eq!(param(&params, "status"), Some("missed"));
        assert_eq!(param(&params, "priority"), None);
    }

    #[test]
    fn limit_is_clamped_and_all_status_is_explicit() {
        let mut q = TaskQuery::for_tag("u1", Tag::High, 500, 0);
        q.status = None;
        let params = list_params(&q);
        assert_eq!(param(&params, "limit"), Some("100"));
        assert_eq!(param(&params, "status"), Some("all"));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let svc = HttpTaskService::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(svc.tasks_url(), "http://localhost:8000/tasks");
        assert_eq!(svc.task_url("abc"), "http://localhost:8000/tasks/abc");
    }

    #[test]
    fn update_body_only_carries_snooze_when_snoozing() {
        let change = StatusChange {
            status: TaskStatus::Done,
            snoozed_until: Some(Utc::now()),
        };
        let body = UpdateBody {
            status: change.status,
            snoozed_until: change.effective_snooze(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "done");
        assert!(json["snoozed_until"].is_null());
    }
}
