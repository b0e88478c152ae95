//! Load coordinator: the only component that fetches pages.
//!
//! Each operation:
//! - deduplicates against an in-flight request of the same kind for the tag
//! - issues at most one fetch
//! - applies the result to its tag atomically, or records a failure and
//!   leaves the pool exactly as it was
//!
//! No ordering between kinds is enforced: an initial load and a load more for
//! the same tag may run side by side. Callers are expected to wait for the
//! first page before paginating.

use std::num::NonZeroU32;
use std::sync::Arc;

use futures_util::future::join_all;
use taskpool_core::{Failure, Operation, SyncError, Tag};
use tracing::{debug, info, warn};

use crate::inflight::{InFlightRegistry, OpKind};
use crate::service::{TaskQuery, TaskService};
use crate::state::SyncHandle;

/// What an engine call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A response (or local change) was applied to the pools.
    Applied,
    /// Nothing to do: duplicate in flight, exhausted, or already loaded.
    Skipped,
    /// The error slot was written.
    Failed,
}

pub struct LoadCoordinator {
    service: Arc<dyn TaskService>,
    state: SyncHandle,
    user_id: String,
    in_flight: InFlightRegistry,
}

impl LoadCoordinator {
    pub fn new(service: Arc<dyn TaskService>, state: SyncHandle, user_id: impl Into<String>) -> Self {
        Self {
            service,
            state,
            user_id: user_id.into(),
            in_flight: InFlightRegistry::default(),
        }
    }

    pub fn is_in_flight(&self, kind: OpKind, tag: Tag) -> bool {
        self.in_flight.contains(kind, tag)
    }

    /// Fetch page one for `tag` and replace its pool.
    pub async fn initial_load(&self, tag: Tag, page_size: NonZeroU32) -> Outcome {
        self.load_first_page(tag, page_size, Operation::InitialLoad { tag, page_size })
            .await
    }

    /// Initial load only if the pool has never loaded (or was invalidated).
    pub async fn ensure_loaded(&self, tag: Tag, page_size: NonZeroU32) -> Outcome {
        if self.state.read(|s| s.pools().get(tag).loaded) {
            return Outcome::Skipped;
        }
        self.initial_load(tag, page_size).await
    }

    /// Reset `tag` to empty, then load page one again.
    pub async fn refresh(&self, tag: Tag, page_size: NonZeroU32) -> Outcome {
        let _flag = self.state.begin_refresh(tag);
        self.state.write(|s| s.pools.reset(tag));
        debug!(%tag, "pool reset for refresh");
        self.load_first_page(tag, page_size, Operation::Refresh { tag, page_size })
            .await
    }

    /// Fetch the next page for `tag` from its current cursor.
    pub async fn load_more(&self, tag: Tag, page_size: NonZeroU32) -> Outcome {
        if !self.state.read(|s| s.pools().get(tag).has_more) {
            debug!(%tag, "load more skipped: pool exhausted");
            return Outcome::Skipped;
        }
        let Some(_guard) = self.in_flight.try_acquire(OpKind::LoadMore, tag) else {
            debug!(%tag, "load more skipped: already in flight");
            return Outcome::Skipped;
        };

        let offset = self.state.read(|s| s.pools().get(tag).offset);
        let query = TaskQuery::for_tag(&self.user_id, tag, page_size.get(), offset);

        match self.service.fetch(&query).await {
            Ok(page) => {
                let received = page.tasks.len();
                self.state
                    .write(|s| s.pools.append_page(tag, page.tasks, page.has_more));
                info!(%tag, offset, received, has_more = page.has_more, "page appended");
                Outcome::Applied
            }
            Err(err) => {
                warn!(%tag, offset, error = %format!("{err:#}"), "load more failed");
                self.state.record_failure(Failure {
                    error: SyncError::fetch(tag, &err),
                    operation: Operation::LoadMore { tag, page_size },
                });
                Outcome::Failed
            }
        }
    }

    /// Load more for every tag that is loaded and not exhausted, concurrently.
    ///
    /// Each tag settles on its own; a failure in one does not stop the
    /// others. The error slot ends up holding whichever failure settled last.
    pub async fn load_more_all(&self, page_size: NonZeroU32) -> Vec<(Tag, Outcome)> {
        let targets: Vec<Tag> = self.state.read(|s| {
            s.pools()
                .iter()
                .filter(|(_, pool)| pool.loaded && pool.has_more)
                .map(|(tag, _)| tag)
                .collect()
        });
        if targets.is_empty() {
            debug!("load more all: nothing to page");
            return Vec::new();
        }

        let outcomes = join_all(targets.iter().map(|tag| self.load_more(*tag, page_size))).await;
        targets.into_iter().zip(outcomes).collect()
    }

    async fn load_first_page(&self, tag: Tag, page_size: NonZeroU32, op: Operation) -> Outcome {
        let Some(_guard) = self.in_flight.try_acquire(OpKind::InitialLoad, tag) else {
            debug!(%tag, "initial load skipped: already in flight");
            return Outcome::Skipped;
        };

        let query = TaskQuery::for_tag(&self.user_id, tag, page_size.get(), 0);
        match self.service.fetch(&query).await {
            Ok(page) => {
                let received = page.tasks.len();
                self.state
                    .write(|s| s.pools.apply_first_page(tag, page.tasks, page.has_more));
                info!(%tag, received, total = page.total, has_more = page.has_more, "first page loaded");
                Outcome::Applied
            }
            Err(err) => {
                warn!(%tag, error = %format!("{err:#}"), "{op} failed");
                self.state.record_failure(Failure {
                    error: SyncError::fetch(tag, &err),
                    operation: op,
                });
                Outcome::Failed
            }
        }
    }
}
