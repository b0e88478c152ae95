//! Remote task service contract: one paged fetch, one single-record update.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taskpool_core::{Priority, StatusChange, Tag, Task, TaskStatus};

/// Parameters for one page of tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub user_id: String,
    /// `None` asks for every status.
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub limit: u32,
    pub offset: usize,
}

impl TaskQuery {
    pub fn for_tag(user_id: impl Into<String>, tag: Tag, limit: u32, offset: usize) -> Self {
        let filter = tag.filter();
        Self {
            user_id: user_id.into(),
            status: Some(filter.status),
            priority: filter.priority,
            category: None,
            source: None,
            limit,
            offset,
        }
    }

    /// The tag whose filter this query matches, if any.
    pub fn tag(&self) -> Option<Tag> {
        if self.category.is_some() || self.source.is_some() {
            return None;
        }
        Tag::ALL.into_iter().find(|tag| {
            let f = tag.filter();
            Some(f.status) == self.status && f.priority == self.priority
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub user_id: String,
    pub task_id: String,
    pub change: StatusChange,
}

#[async_trait]
pub trait TaskService: Send + Sync {
    /// Fetch one page. Repeated calls at increasing offsets for the same
    /// filter must see a stable order.
    async fn fetch(&self, query: &TaskQuery) -> Result<TaskPage>;

    /// Update one task's status. The returned record is informational only.
    async fn update_status(&self, update: &StatusUpdate) -> Result<Task>;
}
