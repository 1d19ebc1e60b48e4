//! Active filter selection.
//!
//! The filter is process-local view state. It starts at `Filter::All` and is
//! never persisted.

use crate::model::filter::Filter;
use crate::model::task::ValidationError;
use log::debug;

/// Owns the single active filter value.
#[derive(Debug, Clone, Default)]
pub struct FilterController {
    current: Filter,
}

impl FilterController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the active filter and returns whether it changed.
    pub fn set_filter(&mut self, filter: Filter) -> bool {
        let changed = self.current != filter;
        self.current = filter;
        debug!("event=filter_set module=filter status=ok filter={filter} changed={changed}");
        changed
    }

    /// Parses and sets a filter from a host-provided string.
    ///
    /// # Errors
    /// Returns `ValidationError::UnknownFilter` for anything other than
    /// `all|pending|completed`; the active filter is unchanged.
    pub fn set_filter_str(&mut self, value: &str) -> Result<Filter, ValidationError> {
        let filter = value.parse::<Filter>()?;
        self.set_filter(filter);
        Ok(filter)
    }

    pub fn current(&self) -> Filter {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::FilterController;
    use crate::model::filter::Filter;

    #[test]
    fn starts_at_all() {
        assert_eq!(FilterController::new().current(), Filter::All);
    }

    #[test]
    fn set_filter_reports_change() {
        let mut controller = FilterController::new();
        assert!(controller.set_filter(Filter::Pending));
        assert!(!controller.set_filter(Filter::Pending));
        assert_eq!(controller.current(), Filter::Pending);
    }

    #[test]
    fn invalid_string_keeps_current_filter() {
        let mut controller = FilterController::new();
        controller.set_filter(Filter::Completed);
        assert!(controller.set_filter_str("archived").is_err());
        assert_eq!(controller.current(), Filter::Completed);
    }
}
