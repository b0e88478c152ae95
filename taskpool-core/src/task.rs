//! Task model as served by the remote task service.
//!
//! The pool engine treats these as opaque records keyed by `id`; only the
//! status/priority enums are interpreted locally.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Done,
    Snoozed,
    Ignored,
    Expired,
    Missed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Done => "done",
            TaskStatus::Snoozed => "snoozed",
            TaskStatus::Ignored => "ignored",
            TaskStatus::Expired => "expired",
            TaskStatus::Missed => "missed",
        }
    }

    /// Statuses a user may set through the update endpoint.
    /// `expired` and `missed` are only ever assigned by the server.
    pub fn is_user_settable(self) -> bool {
        matches!(
            self,
            TaskStatus::Pending | TaskStatus::Done | TaskStatus::Snoozed | TaskStatus::Ignored
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "pending" => TaskStatus::Pending,
            "done" => TaskStatus::Done,
            "snoozed" => TaskStatus::Snoozed,
            "ignored" => TaskStatus::Ignored,
            "expired" => TaskStatus::Expired,
            "missed" => TaskStatus::Missed,
            other => bail!("unknown task status: {other}"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task record. The server is the source of truth; the pool store only
/// ever holds a copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub task_key: String,
    pub title: String,
    pub category: String,
    pub priority: Priority,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    #[serde(default)]
    pub ignore_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub snoozed_until: Option<DateTime<Utc>>,

    /// ISO-8601 instants at which the server will push a reminder.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notify_at: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notifications_sent: Vec<String>,
}

fn null_as_empty<'de, D>(d: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(d)?.unwrap_or_default())
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            conversation_id: String::new(),
            task_key: String::new(),
            title: title.into(),
            category: "other".to_string(),
            priority: Priority::Medium,
            summary: None,
            due_at: None,
            status: TaskStatus::Pending,
            ignore_reason: None,
            created_at: now,
            updated_at: now,
            snoozed_until: None,
            notify_at: Vec::new(),
            notifications_sent: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_due(mut self, due_at: DateTime<Utc>) -> Self {
        self.due_at = Some(due_at);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// A requested status transition, plus the optional snooze instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub status: TaskStatus,
    pub snoozed_until: Option<DateTime<Utc>>,
}

impl StatusChange {
    pub fn to(status: TaskStatus) -> Self {
        Self {
            status,
            snoozed_until: None,
        }
    }

    pub fn snooze_until(until: DateTime<Utc>) -> Self {
        Self {
            status: TaskStatus::Snoozed,
            snoozed_until: Some(until),
        }
    }

    /// The snooze instant is only meaningful when snoozing; the server
    /// clears it on every other transition.
    pub fn effective_snooze(&self) -> Option<DateTime<Utc>> {
        match self.status {
            TaskStatus::Snoozed => self.snoozed_until,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_server_record_with_null_lists() {
        let json = r#"{
            "id": "t-1",
            "conversation_id": "c-1",
            "task_key": "reply-john",
            "title": "Reply to John",
            "category": "reply",
            "priority": "high",
            "summary": null,
            "due_at": "2026-02-25T08:00:00Z",
            "status": "pending",
            "ignore_reason": null,
            "created_at": "2026-02-20T10:00:00Z",
            "updated_at": "2026-02-20T10:00:00Z",
            "snoozed_until": null,
            "notify_at": null,
            "notifications_sent": ["2026-02-24T08:00:00Z"]
        }"#;
        let t: Task = serde_json::from_str(json).unwrap();
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.status, TaskStatus::Pending);
        assert!(t.notify_at.is_empty());
        assert_eq!(t.notifications_sent.len(), 1);
        assert!(t.due_at.is_some());
    }

    #[test]
    fn only_user_statuses_are_settable() {
        assert!(TaskStatus::Done.is_user_settable());
        assert!(TaskStatus::Pending.is_user_settable());
        assert!(!TaskStatus::Missed.is_user_settable());
        assert!(!TaskStatus::Expired.is_user_settable());
    }

    #[test]
    fn snooze_instant_dropped_for_other_transitions() {
        let until = Utc::now();
        let mut change = StatusChange::snooze_until(until);
        assert_eq!(change.effective_snooze(), Some(until));
        change.status = TaskStatus::Done;
        assert_eq!(change.effective_snooze(), None);
    }

    #[test]
    fn parses_status_case_insensitively() {
        assert_eq!("Snoozed".parse::<TaskStatus>().unwrap(), TaskStatus::Snoozed);
        assert!("archived".parse::<TaskStatus>().is_err());
    }
}
