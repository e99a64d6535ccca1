//! Core domain types for the HIP-3 oracle price pusher.
//!
//! This crate provides the fundamental types used throughout the pusher:
//! - `MarketDefinition`: a named trio of price slots published to the venue
//! - `AssetSource`: where a slot's value comes from (feed asset or random range)
//! - `decode_scaled_price`: the Stork fixed-point price decoder

pub mod error;
pub mod market;
pub mod price;

pub use error::{CoreError, Result};
pub use market::{feed_assets, AssetSource, MarketDefinition};
pub use price::decode_scaled_price;
