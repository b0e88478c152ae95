//! Aggregate views derived from the pool store. Read-only; nothing here
//! owns state.

use crate::pool::PoolStore;
use crate::tag::Tag;
use crate::task::Task;

/// The combined "all" view: missed, then high, medium, low.
pub fn all_tasks(store: &PoolStore) -> Vec<&Task> {
    Tag::DISPLAY_ORDER
        .into_iter()
        .flat_map(|tag| store.get(tag).tasks.iter())
        .collect()
}

pub fn total_count(store: &PoolStore) -> usize {
    store.iter().map(|(_, pool)| pool.len()).sum()
}

/// Per-tag badge counts, in display order.
pub fn counts(store: &PoolStore) -> Vec<(Tag, usize)> {
    Tag::DISPLAY_ORDER
        .into_iter()
        .map(|tag| (tag, store.get(tag).len()))
        .collect()
}

/// True when any loaded pool can still page further.
pub fn has_more_anywhere(store: &PoolStore) -> bool {
    store.iter().any(|(_, pool)| pool.loaded && pool.has_more)
}
