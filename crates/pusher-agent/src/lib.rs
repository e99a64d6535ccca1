//! HIP-3 oracle pusher service.
//!
//! Wires the feed worker, flush coordinator, and exchange client together
//! and supervises them for the life of the process.

pub mod app;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use logging::init_logging;
