//! Tasklane: task tracking with concurrent batch status updates.
//!
//! This crate provides the task domain together with an engine that moves
//! many tasks to one status in parallel while tolerating
//! optimistic-concurrency conflicts and partial failures.
//!
//! # Architecture
//!
//! Tasklane follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports
//!
//! # Modules
//!
//! - [`task`]: Task records, status transitions, and persistence ports
//! - [`batch`]: Concurrent batch status-update engine

pub mod batch;
pub mod task;
