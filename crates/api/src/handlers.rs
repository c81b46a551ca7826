/// On-demand sweep
pub mod admin;
/// Booking and staff triage
pub mod appointments;
/// Technician availability
pub mod availability;
/// Server-sent change events
pub mod events;
/// Work order lifecycle
pub mod services;
/// User removal
pub mod users;
