//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Malformed frame: {0}")]
    Parse(String),

    #[error("Bad price for {asset}: {source}")]
    Price {
        asset: String,
        #[source]
        source: pusher_core::CoreError,
    },

    #[error("Feed connection failed permanently after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type FeedResult<T> = Result<T, FeedError>;
