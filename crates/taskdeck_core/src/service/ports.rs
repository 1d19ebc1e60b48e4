//! Collaborator contracts the core calls into.
//!
//! # Responsibility
//! - Describe the confirmation prompt and render target as injected traits.
//! - Keep UI hosts free to implement them however they draw.
//!
//! # Invariants
//! - `Renderer::update` is idempotent; redundant calls are allowed.
//! - `ConfirmPrompt::ask` is synchronous and returns the user's decision.

use crate::service::view::RenderModel;

/// Yes/no confirmation asked before destructive bulk operations.
pub trait ConfirmPrompt {
    fn ask(&mut self, message: &str) -> bool;
}

impl<F> ConfirmPrompt for F
where
    F: FnMut(&str) -> bool,
{
    fn ask(&mut self, message: &str) -> bool {
        self(message)
    }
}

/// Render target refreshed after every state change.
pub trait Renderer {
    /// Replaces the visible list, counters and empty-state message.
    fn update(&mut self, model: &RenderModel);

    /// Shows an inline message next to the input.
    fn notify(&mut self, _notice: &Notice) {}

    /// Hides any inline message.
    fn clear_notice(&mut self) {}
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn update(&mut self, model: &RenderModel) {
        (**self).update(model);
    }

    fn notify(&mut self, notice: &Notice) {
        (**self).notify(notice);
    }

    fn clear_notice(&mut self) {
        (**self).clear_notice();
    }
}

/// Severity of an inline notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Rejected input; the operation did not happen.
    Error,
    /// Operation happened in memory but was not saved.
    Warning,
}

/// User-visible inline message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Renderer that keeps the latest model and notice in memory.
///
/// Used by hosts that pull state instead of being pushed to, such as the FFI
/// layer, which reads `last_model` after each call.
#[derive(Debug, Default)]
pub struct SnapshotRenderer {
    last_model: Option<RenderModel>,
    notice: Option<Notice>,
    render_count: usize,
}

impl SnapshotRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent model passed to `update`.
    pub fn last_model(&self) -> Option<&RenderModel> {
        self.last_model.as_ref()
    }

    /// Inline notice currently shown, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Number of `update` calls received.
    pub fn render_count(&self) -> usize {
        self.render_count
    }
}

impl Renderer for SnapshotRenderer {
    fn update(&mut self, model: &RenderModel) {
        self.last_model = Some(model.clone());
        self.render_count += 1;
    }

    fn notify(&mut self, notice: &Notice) {
        self.notice = Some(notice.clone());
    }

    fn clear_notice(&mut self) {
        self.notice = None;
    }
}
