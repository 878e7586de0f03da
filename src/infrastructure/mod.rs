pub mod collectors;
pub mod notifications;
