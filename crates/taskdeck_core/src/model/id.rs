//! Task id allocation.
//!
//! Ids are derived from creation time in epoch milliseconds, bumped past the
//! last issued value so two tasks created in the same tick never collide.

use crate::model::task::{TaskId, MAX_TASK_ID};

/// Issues strictly increasing task ids.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: Option<i64>,
}

impl IdAllocator {
    /// Creates an allocator with no issued ids.
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Records an externally created id so later ids stay above it.
    pub fn observe(&mut self, id: TaskId) {
        let raw = id.get();
        if self.last.map_or(true, |last| raw > last) {
            self.last = Some(raw);
        }
    }

    /// Returns `max(now_ms, last + 1)` and remembers it.
    ///
    /// Returns `None` and issues nothing once that value would exceed
    /// `MAX_TASK_ID`.
    pub fn next(&mut self, now_ms: i64) -> Option<TaskId> {
        let raw = match self.last {
            Some(last) if now_ms <= last => last.checked_add(1)?,
            _ => now_ms,
        };
        if raw > MAX_TASK_ID {
            return None;
        }
        self.last = Some(raw);
        Some(TaskId::new(raw))
    }

    /// Last issued or observed id.
    pub fn last(&self) -> Option<TaskId> {
        self.last.map(TaskId::new)
    }
}
