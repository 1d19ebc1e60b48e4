//! Render-model derivation.
//!
//! # Invariants
//! - Derivation is pure: same tasks and filter always yield the same model.
//! - `stats` always covers the full collection, never the filtered view.

use crate::model::filter::Filter;
use crate::model::task::Task;
use crate::service::task_store::Stats;

/// Empty-state copy shown when the collection has no tasks at all.
pub const EMPTY_COLLECTION_MESSAGE: &str = "No tasks yet. Add one to get started!";

/// Everything a renderer needs to draw the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderModel {
    /// Filtered tasks in collection order.
    pub tasks: Vec<Task>,
    pub stats: Stats,
    /// `None` when `tasks` is non-empty.
    pub empty_message: Option<&'static str>,
    /// Active filter, for pressed-button state.
    pub filter: Filter,
    /// Whether the clear-completed action should be enabled.
    pub can_clear_completed: bool,
}

/// Derives the render model for `tasks` under `filter`.
pub fn derive_view(tasks: &[Task], filter: Filter) -> RenderModel {
    let visible: Vec<Task> = tasks
        .iter()
        .filter(|task| filter.matches(task))
        .cloned()
        .collect();
    let stats = Stats::of(tasks);

    let empty_message = if tasks.is_empty() {
        Some(EMPTY_COLLECTION_MESSAGE)
    } else if visible.is_empty() {
        Some(filter.empty_message())
    } else {
        None
    };

    RenderModel {
        tasks: visible,
        stats,
        empty_message,
        filter,
        can_clear_completed: stats.completed > 0,
    }
}
