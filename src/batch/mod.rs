//! Concurrent batch status updates.
//!
//! Given many task ids and one target status, the engine applies the status
//! change to every task in parallel, retries optimistic-concurrency
//! conflicts with exponential backoff, reports live progress, and returns
//! one aggregated report.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
