//! Event-facing task manager.
//!
//! # Responsibility
//! - Route UI events to `TaskStore` and `FilterController`.
//! - Re-render after every state change and surface inline notices.
//!
//! # Invariants
//! - Every successful mutation is followed by exactly one `Renderer::update`.
//! - Rejected input leaves state untouched and is reported as an error notice.
//! - Failed saves are reported as a warning notice after the render.

use crate::clock::{Clock, SystemClock};
use crate::model::filter::Filter;
use crate::model::task::{Task, TaskId, ValidationError};
use crate::service::filter_controller::FilterController;
use crate::service::ports::{ConfirmPrompt, Notice, Renderer};
use crate::service::task_store::{
    ClearCompletedRequest, StaleConfirmation, TaskStore, PERSIST_WARNING_MESSAGE,
};
use crate::service::view::{derive_view, RenderModel};
use crate::store::PersistenceStore;
use log::debug;

/// Composition of task state, filter state and UI collaborators.
pub struct TaskManager<S, R, P, C = SystemClock> {
    tasks: TaskStore<S, C>,
    filter: FilterController,
    renderer: R,
    prompt: P,
}

impl<S, R, P, C> TaskManager<S, R, P, C>
where
    S: PersistenceStore,
    R: Renderer,
    P: ConfirmPrompt,
    C: Clock,
{
    /// Loads persisted tasks into `tasks` and performs the first render.
    pub fn start(tasks: TaskStore<S, C>, renderer: R, prompt: P) -> Self {
        let mut manager = Self {
            tasks,
            filter: FilterController::new(),
            renderer,
            prompt,
        };
        let outcome = manager.tasks.load();
        debug!("event=manager_start module=manager status=ok load={outcome:?}");
        manager.render();
        manager
    }

    /// Handles the add-task form submission.
    ///
    /// # Errors
    /// Returns the `ValidationError` after showing it as an error notice.
    pub fn add_task(&mut self, text: &str) -> Result<Task, ValidationError> {
        match self.tasks.add(text) {
            Ok(task) => {
                self.renderer.clear_notice();
                self.after_mutation();
                Ok(task)
            }
            Err(err) => {
                self.renderer.notify(&Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Handles a checkbox change.
    pub fn toggle_task(&mut self, id: TaskId) -> bool {
        let toggled = self.tasks.toggle(id);
        if toggled {
            self.after_mutation();
        }
        toggled
    }

    /// Handles a delete-button click.
    pub fn delete_task(&mut self, id: TaskId) -> bool {
        let deleted = self.tasks.delete(id);
        if deleted {
            self.after_mutation();
        }
        deleted
    }

    /// Handles the clear-completed button, asking the prompt first.
    pub fn clear_completed(&mut self) -> usize {
        let removed = self.tasks.clear_completed(&mut self.prompt);
        if removed > 0 {
            self.after_mutation();
        }
        removed
    }

    /// First half of a host-driven clear: returns what the host should confirm.
    pub fn request_clear_completed(&self) -> Option<ClearCompletedRequest> {
        self.tasks.request_clear_completed()
    }

    /// Second half of a host-driven clear, run after the user confirmed.
    ///
    /// # Errors
    /// Returns `StaleConfirmation` when completed tasks changed in between;
    /// nothing is removed and no render happens.
    pub fn commit_clear_completed(
        &mut self,
        request: &ClearCompletedRequest,
    ) -> Result<usize, StaleConfirmation> {
        let removed = self.tasks.commit_clear_completed(request)?;
        self.after_mutation();
        Ok(removed)
    }

    /// Handles a filter button click.
    pub fn set_filter(&mut self, filter: Filter) {
        self.filter.set_filter(filter);
        self.render();
    }

    /// Handles a filter selection coming from an untyped host value.
    ///
    /// # Errors
    /// Returns `ValidationError::UnknownFilter` after showing it as an error
    /// notice; the active filter is unchanged.
    pub fn set_filter_str(&mut self, value: &str) -> Result<Filter, ValidationError> {
        match self.filter.set_filter_str(value) {
            Ok(filter) => {
                self.render();
                Ok(filter)
            }
            Err(err) => {
                self.renderer.notify(&Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Pushes the current render model to the renderer.
    pub fn render(&mut self) {
        let model = self.view();
        debug!(
            "event=render module=manager status=ok filter={} visible={} total={}",
            model.filter,
            model.tasks.len(),
            model.stats.total
        );
        self.renderer.update(&model);
    }

    /// Current render model without touching the renderer.
    pub fn view(&self) -> RenderModel {
        derive_view(self.tasks.tasks(), self.filter.current())
    }

    pub fn current_filter(&self) -> Filter {
        self.filter.current()
    }

    pub fn tasks(&self) -> &TaskStore<S, C> {
        &self.tasks
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    fn after_mutation(&mut self) {
        self.render();
        if self.tasks.take_persist_warning().is_some() {
            self.renderer.notify(&Notice::warning(PERSIST_WARNING_MESSAGE));
        }
    }
}
