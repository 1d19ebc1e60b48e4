//! Core domain logic for Taskdeck.
//! This crate is the single source of truth for task-list invariants.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use clock::{iso_timestamp, Clock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::filter::Filter;
pub use model::id::IdAllocator;
pub use model::task::{
    normalize_task_text, Task, TaskId, ValidationError, MAX_TASK_ID, MAX_TASK_TEXT_CHARS,
};
pub use service::filter_controller::FilterController;
pub use service::ports::{ConfirmPrompt, Notice, NoticeLevel, Renderer, SnapshotRenderer};
pub use service::task_manager::TaskManager;
pub use service::task_store::{
    clear_completed_message, ClearCompletedRequest, LoadOutcome, PersistenceError,
    StaleConfirmation, Stats, TaskStore, PERSIST_WARNING_MESSAGE, TASKS_STORAGE_KEY,
};
pub use service::view::{derive_view, RenderModel, EMPTY_COLLECTION_MESSAGE};
pub use store::memory::MemoryStore;
pub use store::sqlite::SqliteKvStore;
pub use store::{PersistenceStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
