pub mod appointment;
pub mod client;
pub mod notification;
pub mod service;
pub mod user;
