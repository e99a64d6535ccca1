//! Feed wire messages.
//!
//! Outbound: a single subscribe request sent right after connecting.
//! Inbound: JSON frames tagged by `type`; only `oracle_prices` frames carry
//! data we act on, everything else is ignored.

use crate::error::{FeedError, FeedResult};
use pusher_core::decode_scaled_price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// `{"type":"subscribe","data":["BTCUSD",...]}`
#[derive(Debug, Serialize)]
pub struct SubscribeRequest<'a> {
    #[serde(rename = "type")]
    msg_type: &'static str,
    data: &'a [String],
}

impl<'a> SubscribeRequest<'a> {
    pub fn new(assets: &'a [String]) -> Self {
        Self {
            msg_type: "subscribe",
            data: assets,
        }
    }
}

/// A decoded price for one asset out of an `oracle_prices` frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceUpdate {
    pub asset: String,
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
struct FeedEnvelope {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AssetEntry {
    stork_signed_price: SignedPrice,
}

#[derive(Debug, Deserialize)]
struct SignedPrice {
    price: String,
}

/// Parse one inbound text frame.
///
/// Returns `Ok(None)` for frames of any other type, `Ok(Some(updates))` for a
/// fully decoded `oracle_prices` frame. A frame that is not valid JSON, lacks
/// the expected shape, or carries any undecodable price is rejected whole;
/// none of its prices are applied.
pub fn parse_frame(text: &str) -> FeedResult<Option<Vec<PriceUpdate>>> {
    let envelope: FeedEnvelope = serde_json::from_str(text)?;
    if envelope.msg_type != "oracle_prices" {
        return Ok(None);
    }

    let entries: HashMap<String, AssetEntry> = serde_json::from_value(envelope.data)
        .map_err(|e| FeedError::Parse(format!("bad oracle_prices payload: {e}")))?;

    let mut updates = Vec::with_capacity(entries.len());
    for (asset, entry) in entries {
        let price = decode_scaled_price(&entry.stork_signed_price.price)
            .map_err(|source| FeedError::Price {
                asset: asset.clone(),
                source,
            })?;
        updates.push(PriceUpdate { asset, price });
    }
    Ok(Some(updates))
}
