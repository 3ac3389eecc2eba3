/// Request lifecycle controller: command, message, and callback handlers
pub mod handlers;
/// User-facing texts and keyboards
pub mod views;
