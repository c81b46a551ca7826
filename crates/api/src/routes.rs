pub mod admin;
pub mod appointments;
pub mod availability;
pub mod events;
pub mod health;
pub mod services;
