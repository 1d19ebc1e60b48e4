//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record persisted by the core.
//! - Own text normalization and validation rules for task input.
//!
//! # Invariants
//! - `id` is unique within one collection and never reused.
//! - `text` is trimmed, non-empty and at most `MAX_TASK_TEXT_CHARS` chars.
//! - `created_at` is set once at creation and never mutated.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum task text length, counted in Unicode scalar values.
pub const MAX_TASK_TEXT_CHARS: usize = 200;

/// Largest task id accepted on load or issued by `IdAllocator`.
///
/// Stored ids are JSON numbers; above 2^53 - 1 readers backed by doubles
/// start merging neighbouring values.
pub const MAX_TASK_ID: i64 = 9_007_199_254_740_991;

/// Stable task identifier.
///
/// Serialized as a bare JSON number to match the persisted wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Wraps a raw identifier value.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TaskId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Rejected user input.
///
/// `Display` yields the inline message shown next to the input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Text is empty after trimming.
    Empty,
    /// Text exceeds the maximum length after trimming.
    TooLong { chars: usize, max: usize },
    /// Filter value is not one of `all|pending|completed`.
    UnknownFilter(String),
    /// No id above the highest known one is left to issue.
    IdsExhausted,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Please enter a task description"),
            Self::TooLong { max, .. } => {
                write!(f, "Task description cannot exceed {max} characters")
            }
            Self::UnknownFilter(value) => {
                write!(
                    f,
                    "unknown filter `{value}`; expected all|pending|completed"
                )
            }
            Self::IdsExhausted => write!(f, "Unable to add task: no task ids left"),
        }
    }
}

impl ValidationError {
    /// Stable metadata code for logs; never contains user text.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::TooLong { .. } => "too_long",
            Self::UnknownFilter(_) => "unknown_filter",
            Self::IdsExhausted => "ids_exhausted",
        }
    }
}

impl Error for ValidationError {}

/// One user task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskWire")]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    /// ISO-8601 UTC timestamp, serialized as `createdAt`.
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Task {
    /// Creates a pending task from raw user input.
    ///
    /// # Errors
    /// - `ValidationError::Empty` when trimmed text is empty.
    /// - `ValidationError::TooLong` when trimmed text exceeds the limit.
    pub fn new(
        id: TaskId,
        text: &str,
        created_at: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            text: normalize_task_text(text)?,
            completed: false,
            created_at: created_at.into(),
        })
    }

    /// Flips completion state and returns the new value.
    pub fn toggle(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    /// Returns `ValidationError` when this record breaks text invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        normalize_task_text(&self.text).map(|_| ())
    }
}

/// Trims task input and enforces the length rules.
pub fn normalize_task_text(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let chars = trimmed.chars().count();
    if chars > MAX_TASK_TEXT_CHARS {
        return Err(ValidationError::TooLong {
            chars,
            max: MAX_TASK_TEXT_CHARS,
        });
    }

    Ok(trimmed.to_string())
}

#[derive(Deserialize)]
struct TaskWire {
    id: TaskId,
    text: String,
    #[serde(default)]
    completed: bool,
    #[serde(rename = "createdAt")]
    created_at: String,
}

impl TryFrom<TaskWire> for Task {
    type Error = String;

    fn try_from(wire: TaskWire) -> Result<Self, Self::Error> {
        if wire.id.get() > MAX_TASK_ID {
            return Err(format!("task id {} is out of range", wire.id));
        }
        let text = normalize_task_text(&wire.text)
            .map_err(|err| format!("task {} has invalid text: {err}", wire.id))?;
        Ok(Self {
            id: wire.id,
            text,
            completed: wire.completed,
            created_at: wire.created_at,
        })
    }
}
