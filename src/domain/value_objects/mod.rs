pub mod command_class;
pub mod comparator;
pub mod status;

pub use command_class::{CommandClass, TimeoutPolicy};
pub use comparator::Comparator;
pub use status::CheckStatus;
