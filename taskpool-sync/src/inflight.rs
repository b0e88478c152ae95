//! In-flight registry: at most one outstanding request per (kind, tag).
//!
//! A key is taken before the network call and released when the guard
//! drops, so it is freed on success, failure, panic, or when the owning
//! future is dropped mid-await.

use std::collections::HashSet;

use parking_lot::Mutex;
use taskpool_core::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    InitialLoad,
    LoadMore,
}

#[derive(Debug, Default)]
pub(crate) struct InFlightRegistry {
    keys: Mutex<HashSet<(OpKind, Tag)>>,
}

impl InFlightRegistry {
    pub(crate) fn try_acquire(&self, kind: OpKind, tag: Tag) -> Option<InFlightGuard<'_>> {
        let key = (kind, tag);
        if !self.keys.lock().insert(key) {
            return None;
        }
        Some(InFlightGuard {
            registry: self,
            key,
        })
    }

    pub(crate) fn contains(&self, kind: OpKind, tag: Tag) -> bool {
        self.keys.lock().contains(&(kind, tag))
    }
}

#[derive(Debug)]
pub(crate) struct InFlightGuard<'a> {
    registry: &'a InFlightRegistry,
    key: (OpKind, Tag),
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry.keys.lock().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let reg = InFlightRegistry::default();
        let g = reg.try_acquire(OpKind::InitialLoad, Tag::High);
        assert!(g.is_some());
        assert!(reg.try_acquire(OpKind::InitialLoad, Tag::High).is_none());
        drop(g);
        assert!(!reg.contains(OpKind::InitialLoad, Tag::High));
        assert!(reg.try_acquire(OpKind::InitialLoad, Tag::High).is_some());
    }

    #[test]
    fn kinds_and_tags_are_independent() {
        let reg = InFlightRegistry::default();
        let _a = reg.try_acquire(OpKind::InitialLoad, Tag::High).unwrap();
        assert!(reg.try_acquire(OpKind::LoadMore, Tag::High).is_some());
        assert!(reg.try_acquire(OpKind::InitialLoad, Tag::Low).is_some());
    }

    #[test]
    fn released_on_panic() {
        let reg = InFlightRegistry::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _g = reg.try_acquire(OpKind::LoadMore, Tag::Missed).unwrap();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!reg.contains(OpKind::LoadMore, Tag::Missed));
    }
}
