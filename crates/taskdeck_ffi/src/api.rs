//! FFI use-case API for UI-host calls.
//!
//! # Responsibility
//! - Expose task-list use cases to the UI host via FRB.
//! - Translate core results into flat envelopes the host can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every call opens the store, applies one use case, and persists before
//!   returning; no task state is cached between calls.
//! - Id allocation is process-wide: ids issued by earlier calls stay below
//!   later ones even after those tasks are deleted.
//! - Clear-completed is two-phase: the host confirms between request and
//!   commit, and a commit against a changed completed set is rejected.

use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use taskdeck_core::db::open_db;
use taskdeck_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ClearCompletedRequest, IdAllocator, NoticeLevel, RenderModel, SnapshotRenderer,
    SqliteKvStore, Task, TaskId, TaskManager, TaskStore,
};

const TASKS_DB_FILE_NAME: &str = "taskdeck_tasks.sqlite3";
const TASKS_DB_PATH_ENV: &str = "TASKDECK_DB_PATH";
static TASKS_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static TASK_IDS: Mutex<IdAllocator> = Mutex::new(IdAllocator::new());

/// Hosts confirm through the two-phase API, so the in-call prompt declines.
type HostPrompt = fn(&str) -> bool;
type HostManager<'conn> = TaskManager<SqliteKvStore<'conn>, SnapshotRenderer, HostPrompt>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One task row as shown by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: i64,
    pub text: String,
    pub completed: bool,
    /// ISO-8601 creation timestamp.
    pub created_at: String,
}

/// Full list state for one filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    /// Whether the snapshot could be produced.
    pub ok: bool,
    /// Filtered tasks, newest first.
    pub items: Vec<TaskItem>,
    /// Count over all tasks regardless of filter.
    pub total: u32,
    /// Completed count over all tasks regardless of filter.
    pub completed: u32,
    /// Empty-state text; `None` when `items` is non-empty.
    pub empty_message: Option<String>,
    /// Filter actually applied (`all|pending|completed`).
    pub filter: String,
    /// Whether the clear-completed button should be enabled.
    pub can_clear_completed: bool,
    /// Human-readable diagnostics or inline error.
    pub message: String,
}

impl TaskListResponse {
    fn from_model(model: RenderModel) -> Self {
        Self {
            ok: true,
            items: model.tasks.into_iter().map(to_task_item).collect(),
            total: to_u32(model.stats.total),
            completed: to_u32(model.stats.completed),
            empty_message: model.empty_message.map(str::to_string),
            filter: model.filter.as_str().to_string(),
            can_clear_completed: model.can_clear_completed,
            message: String::new(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            total: 0,
            completed: 0,
            empty_message: None,
            filter: String::new(),
            can_clear_completed: false,
            message: message.into(),
        }
    }
}

/// Result envelope for one mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// Whether the operation took effect.
    pub ok: bool,
    /// Affected task ID, when there is exactly one.
    pub task_id: Option<i64>,
    /// Human-readable response message for the UI.
    pub message: String,
    /// Set when the change applied but could not be saved.
    pub warning: Option<String>,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, task_id: Option<i64>, warning: Option<String>) -> Self {
        Self {
            ok: true,
            task_id,
            message: message.into(),
            warning,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
            warning: None,
        }
    }
}

/// Confirmation the host must show before committing a clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearCompletedPrompt {
    /// Prompt text, e.g. `Delete 2 completed task(s)?`.
    pub message: String,
    pub count: u32,
    /// Ids to echo back into `tasks_clear_completed_commit`.
    pub task_ids: Vec<i64>,
}

/// Returns the list state under `filter`.
///
/// # FFI contract
/// - Rejects unknown filters with `ok=false` instead of falling back to `all`.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_snapshot(filter: String) -> TaskListResponse {
    let result = with_task_manager(|manager| {
        manager
            .set_filter_str(&filter)
            .map(|_| TaskListResponse::from_model(manager.view()))
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(Ok(response)) => response,
        Ok(Err(message)) | Err(message) => TaskListResponse::failure(message),
    }
}

/// Adds one task from the input field.
///
/// # FFI contract
/// - Validation failures return `ok=false` with the inline error text.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(text: String) -> TaskActionResponse {
    let result = with_task_manager(|manager| match manager.add_task(&text) {
        Ok(task) => TaskActionResponse::success(
            "Task added.",
            Some(task.id.get()),
            save_warning(manager),
        ),
        Err(err) => TaskActionResponse::failure(err.to_string()),
    });
    result.unwrap_or_else(|message| TaskActionResponse::failure(format!("task_add failed: {message}")))
}

/// Flips completion of one task. Unknown ids return `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(id: i64) -> TaskActionResponse {
    let result = with_task_manager(|manager| {
        let task_id = TaskId::new(id);
        if !manager.toggle_task(task_id) {
            return TaskActionResponse::failure("Task not found.");
        }
        let completed = manager
            .tasks()
            .get(task_id)
            .map_or(false, |task| task.completed);
        let message = if completed {
            "Task completed."
        } else {
            "Task reopened."
        };
        TaskActionResponse::success(message, Some(id), save_warning(manager))
    });
    result
        .unwrap_or_else(|message| TaskActionResponse::failure(format!("task_toggle failed: {message}")))
}

/// Deletes one task. Unknown ids return `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: i64) -> TaskActionResponse {
    let result = with_task_manager(|manager| {
        if !manager.delete_task(TaskId::new(id)) {
            return TaskActionResponse::failure("Task not found.");
        }
        TaskActionResponse::success("Task deleted.", Some(id), save_warning(manager))
    });
    result
        .unwrap_or_else(|message| TaskActionResponse::failure(format!("task_delete failed: {message}")))
}

/// Starts a clear-completed operation.
///
/// Returns `None` when nothing is completed; the host must not prompt then.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_clear_completed_request() -> Option<ClearCompletedPrompt> {
    let result = with_task_manager(|manager| {
        manager
            .request_clear_completed()
            .map(|request| ClearCompletedPrompt {
                message: request.message().to_string(),
                count: to_u32(request.count()),
                task_ids: request.task_ids().iter().map(|id| id.get()).collect(),
            })
    });
    match result {
        Ok(prompt) => prompt,
        Err(message) => {
            warn!("event=ffi_clear_request module=ffi status=error error={message}");
            None
        }
    }
}

/// Commits a confirmed clear-completed operation.
///
/// # FFI contract
/// - `task_ids` must be the ids from `tasks_clear_completed_request`.
/// - Returns `ok=false` and removes nothing when completed tasks changed.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_clear_completed_commit(task_ids: Vec<i64>) -> TaskActionResponse {
    let request =
        ClearCompletedRequest::for_task_ids(task_ids.into_iter().map(TaskId::new).collect());
    let result = with_task_manager(|manager| match manager.commit_clear_completed(&request) {
        Ok(removed) => TaskActionResponse::success(
            format!("Deleted {removed} completed task(s)."),
            None,
            save_warning(manager),
        ),
        Err(err) => TaskActionResponse::failure(err.to_string()),
    });
    result.unwrap_or_else(|message| {
        TaskActionResponse::failure(format!("tasks_clear_completed_commit failed: {message}"))
    })
}

fn decline_prompt(_message: &str) -> bool {
    false
}

fn resolve_tasks_db_path() -> PathBuf {
    TASKS_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(TASKS_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(TASKS_DB_FILE_NAME)
        })
        .clone()
}

fn with_task_manager<T>(f: impl FnOnce(&mut HostManager<'_>) -> T) -> Result<T, String> {
    let db_path = resolve_tasks_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("tasks DB open failed: {err}"))?;
    // Held for the whole call so concurrent calls cannot issue the same id.
    let mut ids = TASK_IDS
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut manager = TaskManager::start(
        TaskStore::new(SqliteKvStore::new(&conn)).with_id_allocator(ids.clone()),
        SnapshotRenderer::new(),
        decline_prompt as HostPrompt,
    );
    let output = f(&mut manager);
    *ids = manager.tasks().id_allocator().clone();
    Ok(output)
}

fn save_warning(manager: &HostManager<'_>) -> Option<String> {
    manager
        .renderer()
        .notice()
        .filter(|notice| notice.level == NoticeLevel::Warning)
        .map(|notice| notice.message.clone())
}

fn to_task_item(task: Task) -> TaskItem {
    TaskItem {
        id: task.id.get(),
        text: task.text,
        completed: task.completed,
        created_at: task.created_at,
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
