//! Core use-case services.
//!
//! # Responsibility
//! - Own task state and filter state behind storage-agnostic APIs.
//! - Derive render models and drive injected UI collaborators.

pub mod filter_controller;
pub mod ports;
pub mod task_manager;
pub mod task_store;
pub mod view;
