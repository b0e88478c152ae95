//! Shared engine state: the pool store, the single error slot and the
//! per-tag refreshing flags.
//!
//! The mutex is only held for short synchronous sections and never across
//! an `.await`, so each write is atomic with respect to other operations.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use taskpool_core::{Failure, PoolStore, Tag};

#[derive(Debug, Default)]
pub struct SyncState {
    pub(crate) pools: PoolStore,
    pub(crate) failure: Option<Failure>,
    pub(crate) refreshing: BTreeSet<Tag>,
}

impl SyncState {
    pub fn pools(&self) -> &PoolStore {
        &self.pools
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub fn is_refreshing(&self, tag: Tag) -> bool {
        self.refreshing.contains(&tag)
    }
}

/// Cloneable handle to the shared state. Readers get snapshots; only the
/// load coordinator and mutation broadcaster write.
#[derive(Debug, Clone, Default)]
pub struct SyncHandle {
    inner: Arc<Mutex<SyncState>>,
}

impl SyncHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read<R>(&self, f: impl FnOnce(&SyncState) -> R) -> R {
        f(&self.inner.lock())
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut SyncState) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Snapshot of every pool. Cheap: one `Arc` clone per tag.
    pub fn pools(&self) -> PoolStore {
        self.read(|s| s.pools.clone())
    }

    pub fn error(&self) -> Option<Failure> {
        self.read(|s| s.failure.clone())
    }

    pub fn clear_error(&self) {
        self.write(|s| s.failure = None);
    }

    pub fn is_refreshing(&self, tag: Tag) -> bool {
        self.read(|s| s.is_refreshing(tag))
    }

    /// Replace whatever error was showing.
    pub(crate) fn record_failure(&self, failure: Failure) {
        self.write(|s| s.failure = Some(failure));
    }

    pub(crate) fn begin_refresh(&self, tag: Tag) -> RefreshFlag<'_> {
        self.write(|s| s.refreshing.insert(tag));
        RefreshFlag { handle: self, tag }
    }
}

/// Clears the refreshing flag for a tag when dropped.
pub(crate) struct RefreshFlag<'a> {
    handle: &'a SyncHandle,
    tag: Tag,
}

impl Drop for RefreshFlag<'_> {
    fn drop(&mut self) {
        let tag = self.tag;
        self.handle.write(|s| s.refreshing.remove(&tag));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskpool_core::{Operation, SyncError};

    #[test]
    fn refresh_flag_clears_on_drop() {
        let h = SyncHandle::new();
        {
            let _f = h.begin_refresh(Tag::Low);
            assert!(h.is_refreshing(Tag::Low));
            assert!(!h.is_refreshing(Tag::High));
        }
        assert!(!h.is_refreshing(Tag::Low));
    }

    #[test]
    fn error_slot_keeps_only_latest() {
        let h = SyncHandle::new();
        let page_size = std::num::NonZeroU32::new(5).unwrap();
        for tag in [Tag::High, Tag::Missed] {
            h.record_failure(Failure {
                error: SyncError::Fetch {
                    tag,
                    message: "timeout".into(),
                },
                operation: Operation::LoadMore { tag, page_size },
            });
        }
        let f = h.error().unwrap();
        assert_eq!(f.operation, Operation::LoadMore { tag: Tag::Missed, page_size });
        h.clear_error();
        assert!(h.error().is_none());
    }
}
