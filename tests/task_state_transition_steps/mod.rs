//! Step definitions for task state transition scenarios.

mod then;
mod when;
pub mod world;
