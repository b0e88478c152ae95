//! taskpool-core: task model, per-tag pools and the views built on them

pub mod error;
pub mod pool;
pub mod tag;
pub mod task;
pub mod views;

pub use error::{Failure, Operation, SyncError};
pub use pool::{Pool, PoolStore};
pub use tag::{Tag, TagFilter};
pub use task::{Priority, StatusChange, Task, TaskStatus};
pub use views::{all_tasks, counts, has_more_anywhere, total_count};
