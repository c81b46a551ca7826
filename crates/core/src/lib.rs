//! # RepairDesk Core
//!
//! Domain types and rules shared by every other crate in the workspace:
//! entity models, the error taxonomy, the appointment lifecycle rules and the
//! contracts (`EntityStore`, `Broadcaster`, `Clock`) that the services are
//! written against. Nothing in here performs I/O.

pub mod clock;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod models;
pub mod store;
