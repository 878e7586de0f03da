pub mod collector;
pub mod notifier;

pub use collector::{Collector, CollectorError};
pub use notifier::{NotificationError, Notifier};
