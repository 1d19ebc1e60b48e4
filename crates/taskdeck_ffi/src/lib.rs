//! UI-host bindings for the Taskdeck core.
//!
//! Exposes task-list use cases as flat, panic-free functions for
//! flutter_rust_bridge code generation.

pub mod api;
