//! Stork price feed ingestion.
//!
//! Provides the reconnecting websocket worker that subscribes to the Stork
//! push feed, the frame decoder for `oracle_prices` messages, the shared
//! latest-price state, and the retry/backoff policy.

pub mod backoff;
pub mod error;
pub mod message;
pub mod state;
pub mod worker;

pub use backoff::RetryPolicy;
pub use error::{FeedError, FeedResult};
pub use message::{parse_frame, PriceUpdate, SubscribeRequest};
pub use state::PriceBook;
pub use worker::{FeedConfig, FeedWorker, FRAME_QUEUE_CAPACITY};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any websocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
