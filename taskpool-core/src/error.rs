//! Error surface shared by the load coordinator and mutation broadcaster.
//!
//! There is a single error slot: each failure replaces whatever was there.
//! The slot remembers the operation that failed so a retry can re-issue it.

use std::fmt;
use std::num::NonZeroU32;

use thiserror::Error;

use crate::tag::Tag;
use crate::task::{StatusChange, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("failed to load {tag} tasks: {message}")]
    Fetch { tag: Tag, message: String },

    #[error("failed to update task {task_id}: {message}")]
    Mutation { task_id: String, message: String },

    #[error("cannot set task {task_id} to {status}; expected pending, done, snoozed or ignored")]
    InvalidStatus { task_id: String, status: TaskStatus },
}

impl SyncError {
    pub fn fetch(tag: Tag, err: &anyhow::Error) -> Self {
        SyncError::Fetch {
            tag,
            message: format!("{err:#}"),
        }
    }

    pub fn mutation(task_id: impl Into<String>, err: &anyhow::Error) -> Self {
        SyncError::Mutation {
            task_id: task_id.into(),
            message: format!("{err:#}"),
        }
    }
}

/// A caller-level operation, recorded so it can be replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    InitialLoad { tag: Tag, page_size: NonZeroU32 },
    LoadMore { tag: Tag, page_size: NonZeroU32 },
    Refresh { tag: Tag, page_size: NonZeroU32 },
    SetStatus { task_id: String, change: StatusChange },
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::InitialLoad { tag, .. } => write!(f, "load {tag}"),
            Operation::LoadMore { tag, .. } => write!(f, "load more {tag}"),
            Operation::Refresh { tag, .. } => write!(f, "refresh {tag}"),
            Operation::SetStatus { task_id, change } => {
                write!(f, "mark {task_id} {}", change.status)
            }
        }
    }
}

/// Content of the error slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub error: SyncError,
    pub operation: Operation,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_message_keeps_context_chain() {
        let err = anyhow::anyhow!("connection refused").context("GET /tasks");
        let e = SyncError::fetch(Tag::High, &err);
        assert_eq!(
            e.to_string(),
            "failed to load high tasks: GET /tasks: connection refused"
        );
    }

    #[test]
    fn operation_display_is_short() {
        let op = Operation::SetStatus {
            task_id: "t1".into(),
            change: StatusChange::to(TaskStatus::Done),
        };
        assert_eq!(op.to_string(), "mark t1 done");
    }
}
