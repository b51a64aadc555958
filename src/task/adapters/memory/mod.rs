//! In-memory task adapters.

mod repository;

pub use repository::InMemoryTaskRepository;
