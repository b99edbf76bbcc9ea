pub mod auth;
pub mod health;
pub mod progress;
pub mod topics;
pub mod writing;
