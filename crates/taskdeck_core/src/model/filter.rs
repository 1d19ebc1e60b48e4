//! View filter selection.

use crate::model::task::{Task, ValidationError};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// String value for the `all` filter.
pub const FILTER_ALL: &str = "all";
/// String value for the `pending` filter.
pub const FILTER_PENDING: &str = "pending";
/// String value for the `completed` filter.
pub const FILTER_COMPLETED: &str = "completed";

/// Selector restricting which tasks appear in the rendered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    #[default]
    All,
    Pending,
    Completed,
}

impl Filter {
    /// Every filter, in button order.
    pub const ALL_VALUES: [Self; 3] = [Self::All, Self::Pending, Self::Completed];

    /// Stable string id used by UI hosts.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => FILTER_ALL,
            Self::Pending => FILTER_PENDING,
            Self::Completed => FILTER_COMPLETED,
        }
    }

    /// Returns whether `task` belongs to this filter's view.
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Pending => !task.completed,
            Self::Completed => task.completed,
        }
    }

    /// Message shown when the collection is non-empty but this view is.
    pub fn empty_message(self) -> &'static str {
        match self {
            Self::All => "No tasks",
            Self::Pending => "No pending tasks",
            Self::Completed => "No completed tasks",
        }
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = ValidationError;

    /// Parses `all|pending|completed`, ignoring case and surrounding spaces.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            FILTER_ALL => Ok(Self::All),
            FILTER_PENDING => Ok(Self::Pending),
            FILTER_COMPLETED => Ok(Self::Completed),
            _ => Err(ValidationError::UnknownFilter(value.to_string())),
        }
    }
}
