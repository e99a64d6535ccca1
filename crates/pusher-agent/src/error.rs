//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed error: {0}")]
    Feed(#[from] pusher_feed::FeedError),

    #[error("Key error: {0}")]
    Key(#[from] pusher_venue::KeyError),

    #[error("Venue error: {0}")]
    Venue(#[from] pusher_venue::VenueError),

    #[error("Task error: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
