//! Pool store: one paginated collection per classification tag.
//!
//! Pure state: no I/O happens here. Every write builds a fresh `Pool` value
//! and swaps the `Arc` for that tag only, so untouched tags keep pointer
//! identity and observers can tell what changed with `Arc::ptr_eq`.
//!
//! Invariants kept by the write paths:
//! - `offset` counts every record appended since the last reset
//!   (removals do not rewind it; it is the server cursor).
//! - `has_more == false` only flips back on reset.
//! - a task id lives in at most one pool.

use std::collections::HashSet;
use std::sync::Arc;

use crate::tag::Tag;
use crate::task::Task;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pool {
    pub tasks: Vec<Task>,
    pub offset: usize,
    pub has_more: bool,
    pub loaded: bool,
}

impl Pool {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Pool state after page one arrives.
    pub fn first_page(tasks: Vec<Task>, has_more: bool) -> Self {
        Self {
            offset: tasks.len(),
            tasks,
            has_more,
            loaded: true,
        }
    }

    /// Pool state after a follow-up page arrives.
    pub fn with_page(&self, page: Vec<Task>, has_more: bool) -> Self {
        let mut tasks = Vec::with_capacity(self.tasks.len() + page.len());
        tasks.extend(self.tasks.iter().cloned());
        let offset = self.offset + page.len();
        tasks.extend(page);
        Self {
            tasks,
            offset,
            // sticky exhaustion
            has_more: self.has_more && has_more,
            // only page one marks a pool loaded
            loaded: self.loaded,
        }
    }

    /// `None` when no record matched, so callers can skip the write.
    pub fn without<F>(&self, mut drop_if: F) -> Option<Self>
    where
        F: FnMut(&Task) -> bool,
    {
        if !self.tasks.iter().any(&mut drop_if) {
            return None;
        }
        Some(Self {
            tasks: self.tasks.iter().filter(|t| !drop_if(*t)).cloned().collect(),
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PoolStore {
    pools: [Arc<Pool>; 4],
}

impl PoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: Tag) -> &Pool {
        &self.pools[tag.index()]
    }

    /// Shared handle to the current value for `tag`; compare handles with
    /// `Arc::ptr_eq` to detect a write.
    pub fn handle(&self, tag: Tag) -> Arc<Pool> {
        Arc::clone(&self.pools[tag.index()])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tag, &Pool)> + '_ {
        Tag::ALL.into_iter().map(move |tag| (tag, self.get(tag)))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn find(&self, id: &str) -> Option<(Tag, &Task)> {
        self.iter()
            .find_map(|(tag, pool)| pool.tasks.iter().find(|t| t.id == id).map(|t| (tag, t)))
    }

    /// Swap in a new value for one tag; every other tag is left untouched.
    pub fn replace(&mut self, tag: Tag, pool: Pool) {
        self.pools[tag.index()] = Arc::new(pool);
    }

    pub fn reset(&mut self, tag: Tag) {
        self.replace(tag, Pool::default());
    }

    /// Replace `tag` with page one.
    pub fn apply_first_page(&mut self, tag: Tag, tasks: Vec<Task>, has_more: bool) {
        self.evict_elsewhere(tag, &tasks);
        self.replace(tag, Pool::first_page(tasks, has_more));
    }

    /// Append a follow-up page to `tag`.
    pub fn append_page(&mut self, tag: Tag, page: Vec<Task>, has_more: bool) {
        self.evict_elsewhere(tag, &page);
        let next = self.get(tag).with_page(page, has_more);
        self.replace(tag, next);
    }

    /// Remove `id` from whichever pools hold it. Returns the tags written.
    pub fn remove_task(&mut self, id: &str) -> Vec<Tag> {
        let mut touched = Vec::new();
        for tag in Tag::ALL {
            if let Some(next) = self.get(tag).without(|t| t.id == id) {
                self.replace(tag, next);
                touched.push(tag);
            }
        }
        touched
    }

    /// Mark every loaded pool as needing a fresh initial load.
    pub fn invalidate_all(&mut self) {
        for tag in Tag::ALL {
            let pool = self.get(tag);
            if pool.loaded {
                let next = Pool {
                    loaded: false,
                    ..pool.clone()
                };
                self.replace(tag, next);
            }
        }
    }

    // The newest server answer decides a task's tag; drop stale copies
    // held by other pools before applying a page.
    fn evict_elsewhere(&mut self, tag: Tag, incoming: &[Task]) {
        if incoming.is_empty() {
            return;
        }
        let ids: HashSet<&str> = incoming.iter().map(|t| t.id.as_str()).collect();
        for other in Tag::ALL.into_iter().filter(|t| *t != tag) {
            if let Some(next) = self.get(other).without(|t| ids.contains(t.id.as_str())) {
                self.replace(other, next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks(ids: &[&str]) -> Vec<Task> {
        ids.iter().map(|id| Task::new(*id, format!("task {id}"))).collect()
    }

    fn ids(pool: &Pool) -> Vec<&str> {
        pool.tasks.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn first_page_sets_cursor_and_loaded() {
        let mut store = PoolStore::new();
        store.apply_first_page(Tag::High, tasks(&["a", "b"]), true);
        let p = store.get(Tag::High);
        assert!(p.loaded);
        assert_eq!(p.offset, 2);
        assert!(p.has_more);
    }

    #[test]
    fn empty_first_page_still_marks_loaded() {
        let mut store = PoolStore::new();
        store.apply_first_page(Tag::Low, Vec::new(), false);
        assert!(store.get(Tag::Low).loaded);
        assert_eq!(store.get(Tag::Low).offset, 0);
    }

    #[test]
    fn append_advances_offset_and_keeps_exhaustion_sticky() {
        let mut store = PoolStore::new();
        store.apply_first_page(Tag::High, tasks(&["t1", "t2"]), true);
        store.append_page(Tag::High, tasks(&["t3", "t4"]), false);
        let p = store.get(Tag::High);
        assert_eq!(ids(p), vec!["t1", "t2", "t3", "t4"]);
        assert_eq!(p.offset, 4);
        assert!(!p.has_more);

        // a later response claiming more does not revive the pool
        store.append_page(Tag::High, Vec::new(), true);
        assert!(!store.get(Tag::High).has_more);
    }

    #[test]
    fn write_leaves_other_tags_pointer_identical() {
        let mut store = PoolStore::new();
        store.apply_first_page(Tag::Medium, tasks(&["m1"]), false);
        let before_medium = store.handle(Tag::Medium);
        let before_high = store.handle(Tag::High);

        store.apply_first_page(Tag::High, tasks(&["h1"]), false);

        assert!(Arc::ptr_eq(&before_medium, &store.handle(Tag::Medium)));
        assert!(!Arc::ptr_eq(&before_high, &store.handle(Tag::High)));
    }

    #[test]
    fn remove_task_touches_only_holding_pool() {
        let mut store = PoolStore::new();
        store.apply_first_page(Tag::High, tasks(&["h1", "h2"]), true);
        store.apply_first_page(Tag::Low, tasks(&["l1"]), false);
        let low = store.handle(Tag::Low);

        let touched = store.remove_task("h1");
        assert_eq!(touched, vec![Tag::High]);
        assert_eq!(ids(store.get(Tag::High)), vec!["h2"]);
        // cursor is the server offset, not the local length
        assert_eq!(store.get(Tag::High).offset, 2);
        assert!(Arc::ptr_eq(&low, &store.handle(Tag::Low)));

        assert!(store.remove_task("nope").is_empty());
    }

    #[test]
    fn incoming_page_evicts_copies_in_other_pools() {
        let mut store = PoolStore::new();
        store.apply_first_page(Tag::High, tasks(&["x", "h2"]), false);
        store.apply_first_page(Tag::Missed, tasks(&["x"]), false);

        assert_eq!(ids(store.get(Tag::High)), vec!["h2"]);
        assert_eq!(store.find("x").map(|(tag, _)| tag), Some(Tag::Missed));
    }

    #[test]
    fn invalidate_all_clears_loaded_but_keeps_data() {
        let mut store = PoolStore::new();
        store.apply_first_page(Tag::High, tasks(&["h1"]), true);
        store.apply_first_page(Tag::Missed, Vec::new(), false);
        store.invalidate_all();
        for (_, pool) in store.iter() {
            assert!(!pool.loaded);
        }
        assert_eq!(store.get(Tag::High).len(), 1);
    }

    #[test]
    fn appended_page_does_not_revalidate_invalidated_pool() {
        let mut store = PoolStore::new();
        store.apply_first_page(Tag::High, tasks(&["h1"]), true);
        store.invalidate_all();
        store.append_page(Tag::High, tasks(&["h2"]), true);
        let p = store.get(Tag::High);
        assert_eq!(ids(p), vec!["h1", "h2"]);
        assert!(!p.loaded);
    }

    #[test]
    fn reset_returns_to_default() {
        let mut store = PoolStore::new();
        store.apply_first_page(Tag::Low, tasks(&["l1"]), true);
        store.reset(Tag::Low);
        assert_eq!(*store.get(Tag::Low), Pool::default());
    }
}
