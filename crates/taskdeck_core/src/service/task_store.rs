//! Task collection service.
//!
//! # Responsibility
//! - Own the ordered task collection and apply add/toggle/delete/clear.
//! - Serialize the collection to one fixed store key and rehydrate it.
//! - Compute filtered projections and aggregate counts.
//!
//! # Invariants
//! - Collection order is newest first; `add` prepends.
//! - Ids are unique within the collection and strictly increasing per process.
//! - A failed write never rolls back the in-memory mutation. The failure is
//!   kept as a persistence warning until taken or until a later write succeeds.
//! - `load` never fails: missing or unreadable data yields an empty collection.
//! - Task text never reaches the log; events carry ids and counts only.

use crate::clock::{iso_timestamp, Clock, SystemClock};
use crate::model::filter::Filter;
use crate::model::id::IdAllocator;
use crate::model::task::{normalize_task_text, Task, TaskId, ValidationError};
use crate::service::ports::ConfirmPrompt;
use crate::store::{PersistenceStore, StoreError};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Store key holding the JSON task array.
pub const TASKS_STORAGE_KEY: &str = "taskManagerTasks";

/// User-facing copy shown when a save fails.
pub const PERSIST_WARNING_MESSAGE: &str = "Unable to save tasks. Please try again.";

/// Aggregate counts over the full collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
}

impl Stats {
    pub fn of(tasks: &[Task]) -> Self {
        Self {
            total: tasks.len(),
            completed: tasks.iter().filter(|task| task.completed).count(),
        }
    }

    pub fn pending(&self) -> usize {
        self.total - self.completed
    }
}

/// Failure writing the collection to the store.
#[derive(Debug)]
pub enum PersistenceError {
    Serialize(serde_json::Error),
    Store(StoreError),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialize(err) => write!(f, "failed to serialize tasks: {err}"),
            Self::Store(err) => write!(f, "failed to save tasks: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

/// How `load` obtained the current collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No stored value; started empty.
    Missing,
    /// Stored value decoded into this many tasks.
    Loaded(usize),
    /// Stored value was unreadable; started empty.
    Recovered { reason: String },
}

/// Pending confirmation for a clear-completed operation.
///
/// Captures exactly which tasks were counted so the commit can refuse to run
/// against a different completed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearCompletedRequest {
    task_ids: Vec<TaskId>,
    message: String,
}

impl ClearCompletedRequest {
    /// Rebuilds a request from ids a host echoed back after confirmation.
    pub fn for_task_ids(mut task_ids: Vec<TaskId>) -> Self {
        task_ids.sort_unstable();
        task_ids.dedup();
        let message = clear_completed_message(task_ids.len());
        Self { task_ids, message }
    }

    /// Number of tasks the confirmation covers.
    pub fn count(&self) -> usize {
        self.task_ids.len()
    }

    /// Prompt text, e.g. `Delete 2 completed task(s)?`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Sorted ids of the counted tasks.
    pub fn task_ids(&self) -> &[TaskId] {
        &self.task_ids
    }
}

/// Commit rejected because the completed set changed after confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleConfirmation {
    pub confirmed: usize,
    pub current: usize,
}

impl Display for StaleConfirmation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "completed tasks changed since confirmation (confirmed {}, now {})",
            self.confirmed, self.current
        )
    }
}

impl Error for StaleConfirmation {}

/// Prompt text for clearing `count` completed tasks.
pub fn clear_completed_message(count: usize) -> String {
    format!("Delete {count} completed task(s)?")
}

/// Task collection bound to a persistence store and a clock.
pub struct TaskStore<S, C = SystemClock> {
    store: S,
    clock: C,
    tasks: Vec<Task>,
    ids: IdAllocator,
    persist_warning: Option<PersistenceError>,
}

impl<S: PersistenceStore> TaskStore<S, SystemClock> {
    /// Creates an empty, unloaded store using wall-clock time.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: PersistenceStore, C: Clock> TaskStore<S, C> {
    /// Creates an empty, unloaded store using `clock` for ids and timestamps.
    pub fn with_clock(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            tasks: Vec::new(),
            ids: IdAllocator::new(),
            persist_warning: None,
        }
    }

    /// Continues id allocation from `ids` instead of a fresh allocator.
    ///
    /// Callers that rebuild the store per request pass the allocator kept
    /// from the previous store so ids stay increasing across rebuilds.
    pub fn with_id_allocator(mut self, ids: IdAllocator) -> Self {
        self.ids = ids;
        self
    }

    /// Allocator state, including ids observed on load.
    pub fn id_allocator(&self) -> &IdAllocator {
        &self.ids
    }

    /// Creates a store and immediately loads persisted tasks.
    pub fn open(store: S, clock: C) -> Self {
        let mut tasks = Self::with_clock(store, clock);
        tasks.load();
        tasks
    }

    /// Replaces the in-memory collection with the persisted one.
    ///
    /// Missing keys, store read failures, malformed JSON, invalid task text
    /// and duplicate ids all fall back to an empty collection. A warning left
    /// by an earlier failed write is dropped.
    pub fn load(&mut self) -> LoadOutcome {
        let started_at = Instant::now();
        self.persist_warning = None;
        let decoded = match self.store.get(TASKS_STORAGE_KEY) {
            Ok(None) => Ok(None),
            Ok(Some(raw)) => decode_tasks(&raw).map(Some),
            Err(err) => Err(format!("store read failed: {err}")),
        };

        let outcome = match decoded {
            Ok(None) => {
                self.tasks = Vec::new();
                LoadOutcome::Missing
            }
            Ok(Some(tasks)) => {
                for task in &tasks {
                    self.ids.observe(task.id);
                }
                self.tasks = tasks;
                LoadOutcome::Loaded(self.tasks.len())
            }
            Err(reason) => {
                self.tasks = Vec::new();
                LoadOutcome::Recovered { reason }
            }
        };

        match &outcome {
            LoadOutcome::Recovered { reason } => warn!(
                "event=tasks_load module=store status=recovered duration_ms={} reason={}",
                started_at.elapsed().as_millis(),
                reason
            ),
            _ => info!(
                "event=tasks_load module=store status=ok count={} duration_ms={}",
                self.tasks.len(),
                started_at.elapsed().as_millis()
            ),
        }

        outcome
    }

    /// Writes the full collection under `TASKS_STORAGE_KEY`.
    ///
    /// # Errors
    /// Returns `PersistenceError` when serialization or the store write fails.
    /// In-memory state is left untouched either way.
    pub fn persist(&mut self) -> Result<(), PersistenceError> {
        let payload = serde_json::to_string(&self.tasks).map_err(PersistenceError::Serialize)?;
        self.store
            .set(TASKS_STORAGE_KEY, &payload)
            .map_err(PersistenceError::Store)?;
        debug!(
            "event=tasks_persist module=store status=ok count={} bytes={}",
            self.tasks.len(),
            payload.len()
        );
        Ok(())
    }

    /// Takes the warning left by the most recent failed write, if any.
    pub fn take_persist_warning(&mut self) -> Option<PersistenceError> {
        self.persist_warning.take()
    }

    /// Adds a task built from `text` at the front of the collection.
    ///
    /// # Errors
    /// Returns `ValidationError` for empty or over-long text, or
    /// `ValidationError::IdsExhausted` when no fresh id is left; state is
    /// unchanged.
    pub fn add(&mut self, text: &str) -> Result<Task, ValidationError> {
        let text = normalize_task_text(text).map_err(|err| {
            info!(
                "event=task_add module=store status=rejected reason={}",
                err.code()
            );
            err
        })?;

        let now = self.clock.now();
        let Some(id) = self.ids.next(now.timestamp_millis()) else {
            let err = ValidationError::IdsExhausted;
            error!(
                "event=task_add module=store status=rejected reason={} total={}",
                err.code(),
                self.tasks.len()
            );
            return Err(err);
        };
        let task = Task {
            id,
            text,
            completed: false,
            created_at: iso_timestamp(now),
        };
        self.tasks.insert(0, task.clone());
        info!(
            "event=task_add module=store status=ok id={} total={}",
            task.id,
            self.tasks.len()
        );
        self.persist_after("task_add");
        Ok(task)
    }

    /// Flips completion of the task with `id`.
    ///
    /// Returns `false` without writing when no such task exists.
    pub fn toggle(&mut self, id: TaskId) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!("event=task_toggle module=store status=missing id={id}");
            return false;
        };

        let completed = task.toggle();
        info!("event=task_toggle module=store status=ok id={id} completed={completed}");
        self.persist_after("task_toggle");
        true
    }

    /// Removes the task with `id`, returning whether one was removed.
    pub fn delete(&mut self, id: TaskId) -> bool {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            debug!("event=task_delete module=store status=missing id={id}");
            return false;
        };

        self.tasks.remove(index);
        info!(
            "event=task_delete module=store status=ok id={id} total={}",
            self.tasks.len()
        );
        self.persist_after("task_delete");
        true
    }

    /// Starts a clear-completed operation.
    ///
    /// Returns `None` when nothing is completed; callers must not prompt then.
    pub fn request_clear_completed(&self) -> Option<ClearCompletedRequest> {
        let task_ids = self.completed_ids();
        if task_ids.is_empty() {
            return None;
        }
        Some(ClearCompletedRequest::for_task_ids(task_ids))
    }

    /// Removes the tasks a confirmed request covers.
    ///
    /// # Errors
    /// Returns `StaleConfirmation` when the completed set differs from the
    /// one captured in `request`; nothing is removed.
    pub fn commit_clear_completed(
        &mut self,
        request: &ClearCompletedRequest,
    ) -> Result<usize, StaleConfirmation> {
        let current = self.completed_ids();
        if current.as_slice() != request.task_ids() {
            warn!(
                "event=tasks_clear_completed module=store status=stale confirmed={} current={}",
                request.count(),
                current.len()
            );
            return Err(StaleConfirmation {
                confirmed: request.count(),
                current: current.len(),
            });
        }

        self.tasks.retain(|task| !task.completed);
        info!(
            "event=tasks_clear_completed module=store status=ok removed={} total={}",
            request.count(),
            self.tasks.len()
        );
        self.persist_after("tasks_clear_completed");
        Ok(request.count())
    }

    /// Removes all completed tasks after `prompt` confirms.
    ///
    /// Returns the number removed; `0` when nothing is completed (no prompt is
    /// shown) or when the prompt is declined.
    pub fn clear_completed<P: ConfirmPrompt + ?Sized>(&mut self, prompt: &mut P) -> usize {
        let Some(request) = self.request_clear_completed() else {
            return 0;
        };

        if !prompt.ask(request.message()) {
            info!(
                "event=tasks_clear_completed module=store status=declined count={}",
                request.count()
            );
            return 0;
        }

        // `&mut self` is held across the prompt, so the commit cannot go stale.
        self.commit_clear_completed(&request).unwrap_or(0)
    }

    /// Tasks matching `filter`, in collection order.
    pub fn filtered_view(&self, filter: Filter) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| filter.matches(task))
            .collect()
    }

    /// Counts over the full collection.
    pub fn stats(&self) -> Stats {
        Stats::of(&self.tasks)
    }

    /// Full collection, newest first.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Underlying persistence store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn completed_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|task| task.completed)
            .map(|task| task.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn persist_after(&mut self, event: &'static str) {
        match self.persist() {
            Ok(()) => self.persist_warning = None,
            Err(err) => {
                error!(
                    "event={event} module=store status=persist_failed count={} error={}",
                    self.tasks.len(),
                    err
                );
                self.persist_warning = Some(err);
            }
        }
    }
}

fn decode_tasks(raw: &str) -> Result<Vec<Task>, String> {
    let tasks: Vec<Task> = serde_json::from_str(raw).map_err(|err| {
        format!(
            "{:?} error at line {} column {}",
            err.classify(),
            err.line(),
            err.column()
        )
    })?;

    let mut seen = HashSet::with_capacity(tasks.len());
    for task in &tasks {
        if !seen.insert(task.id) {
            return Err(format!("duplicate task id {}", task.id));
        }
    }

    Ok(tasks)
}
