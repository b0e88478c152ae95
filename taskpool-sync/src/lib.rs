//! taskpool-sync: remote task service client and the pool synchronization engine

pub mod broadcaster;
pub mod coordinator;
pub mod engine;
pub mod http;
mod inflight;
pub mod service;
pub mod state;

pub use broadcaster::MutationBroadcaster;
pub use coordinator::{LoadCoordinator, Outcome};
pub use engine::TaskSync;
pub use http::HttpTaskService;
pub use inflight::OpKind;
pub use service::{StatusUpdate, TaskPage, TaskQuery, TaskService};
pub use state::{SyncHandle, SyncState};
