//! Test doubles for the Entity Store.
//!
//! [`MemoryStore`] is a working in-memory store for service and route tests;
//! [`repositories::MockStore`] is a mockall mock for failure injection.

pub mod memory;
pub mod repositories;

pub use memory::MemoryStore;
pub use repositories::MockStore;
