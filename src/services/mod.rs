// Services module - Business logic

pub mod event_handler;
pub mod gateway_notifier;
pub mod handler_registry;
pub mod revocation_publisher;
