use std::sync::Arc;

use taskpool_core::Operation;
use tracing::info;

use crate::broadcaster::MutationBroadcaster;
use crate::coordinator::{LoadCoordinator, Outcome};
use crate::service::TaskService;
use crate::state::SyncHandle;

/// One user's task pools wired to a service: the load coordinator and the
/// mutation broadcaster sharing a single state handle.
pub struct TaskSync {
    state: SyncHandle,
    loader: LoadCoordinator,
    mutator: MutationBroadcaster,
}

impl TaskSync {
    pub fn new(service: Arc<dyn TaskService>, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let state = SyncHandle::new();
        Self {
            loader: LoadCoordinator::new(Arc::clone(&service), state.clone(), user_id.clone()),
            mutator: MutationBroadcaster::new(service, state.clone(), user_id),
            state,
        }
    }

    pub fn state(&self) -> &SyncHandle {
        &self.state
    }

    pub fn loader(&self) -> &LoadCoordinator {
        &self.loader
    }

    pub fn mutator(&self) -> &MutationBroadcaster {
        &self.mutator
    }

    /// Re-issue the operation behind the current error. The slot is cleared
    /// first, so it ends up empty on success or holding the new failure.
    pub async fn retry(&self) -> Outcome {
        let Some(failure) = self.state.error() else {
            return Outcome::Skipped;
        };
        self.state.clear_error();
        info!(operation = %failure.operation, "retrying");

        match failure.operation {
            Operation::InitialLoad { tag, page_size } => {
                self.loader.initial_load(tag, page_size).await
            }
            Operation::LoadMore { tag, page_size } => self.loader.load_more(tag, page_size).await,
            Operation::Refresh { tag, page_size } => self.loader.refresh(tag, page_size).await,
            Operation::SetStatus { task_id, change } => {
                self.mutator.set_status(&task_id, change).await
            }
        }
    }
}
