//! Domain model for the task list.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep input validation next to the types it protects.
//!
//! # Invariants
//! - Every task is identified by a `TaskId` unique within its collection.
//! - Filters are view state only and are never persisted.

pub mod filter;
pub mod id;
pub mod task;
