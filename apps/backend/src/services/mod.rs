pub mod identity;
pub mod progress;
