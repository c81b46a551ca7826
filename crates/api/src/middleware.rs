/// Caller identification and role guards
pub mod actor;
/// Domain error to HTTP response mapping
pub mod error_handling;
