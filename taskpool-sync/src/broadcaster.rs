//! Mutation broadcaster: optimistic status changes.
//!
//! The task is dropped from every pool before the update request goes out.
//! If the update fails the record cannot be put back reliably (its tag,
//! position and the pool cursors may all be stale), so every pool is
//! marked not-loaded instead and the next activation of any tag refetches.

use std::sync::Arc;

use taskpool_core::{Failure, Operation, StatusChange, SyncError};
use tracing::{debug, info, warn};

use crate::coordinator::Outcome;
use crate::service::{StatusUpdate, TaskService};
use crate::state::SyncHandle;

pub struct MutationBroadcaster {
    service: Arc<dyn TaskService>,
    state: SyncHandle,
    user_id: String,
}

impl MutationBroadcaster {
    pub fn new(service: Arc<dyn TaskService>, state: SyncHandle, user_id: impl Into<String>) -> Self {
        Self {
            service,
            state,
            user_id: user_id.into(),
        }
    }

    pub async fn set_status(&self, task_id: &str, change: StatusChange) -> Outcome {
        let operation = Operation::SetStatus {
            task_id: task_id.to_string(),
            change: change.clone(),
        };

        if !change.status.is_user_settable() {
            warn!(task_id, status = %change.status, "rejected status change");
            self.state.record_failure(Failure {
                error: SyncError::InvalidStatus {
                    task_id: task_id.to_string(),
                    status: change.status,
                },
                operation,
            });
            return Outcome::Failed;
        }

        // Runs before the first await: the task is gone from every view by
        // the time the request is in flight.
        let touched = self.state.write(|s| s.pools.remove_task(task_id));
        debug!(task_id, ?touched, "removed optimistically");

        let update = StatusUpdate {
            user_id: self.user_id.clone(),
            task_id: task_id.to_string(),
            change,
        };

        match self.service.update_status(&update).await {
            Ok(_) => {
                info!(task_id, status = %update.change.status, "status updated");
                Outcome::Applied
            }
            Err(err) => {
                warn!(task_id, error = %format!("{err:#}"), "status update failed; invalidating pools");
                let failure = Failure {
                    error: SyncError::mutation(task_id, &err),
                    operation,
                };
                self.state.write(|s| {
                    s.pools.invalidate_all();
                    s.failure = Some(failure);
                });
                Outcome::Failed
            }
        }
    }
}
