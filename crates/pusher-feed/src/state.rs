//! Shared latest-price state.

use crate::message::PriceUpdate;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Latest decoded price per feed asset, shared between the flush coordinator
/// and whoever applies decoded frames.
///
/// A single coarse mutex over the whole map: writes replace per-asset entries
/// (last write wins) and reads take a point-in-time copy, so a flush never
/// observes a frame half-applied.
#[derive(Debug, Default)]
pub struct PriceBook {
    prices: Mutex<HashMap<String, Decimal>>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply all updates from one decoded frame under a single lock hold.
    pub fn apply(&self, updates: impl IntoIterator<Item = PriceUpdate>) {
        let mut prices = self.prices.lock();
        for update in updates {
            prices.insert(update.asset, update.price);
        }
    }

    /// Point-in-time copy of the whole book.
    pub fn snapshot(&self) -> HashMap<String, Decimal> {
        self.prices.lock().clone()
    }

    #[cfg(test)]
    fn get(&self, asset: &str) -> Option<Decimal> {
        self.prices.lock().get(asset).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn update(asset: &str, price: Decimal) -> PriceUpdate {
        PriceUpdate {
            asset: asset.to_string(),
            price,
        }
    }

    #[test]
    fn test_starts_empty() {
        let book = PriceBook::new();
        assert!(book.snapshot().is_empty());
        assert_eq!(book.get("BTCUSD"), None);
    }

    #[test]
    fn test_last_write_wins() {
        let book = PriceBook::new();
        book.apply([update("BTCUSD", dec!(65000))]);
        book.apply([update("BTCUSD", dec!(65100)), update("ETHUSD", dec!(3200))]);
        assert_eq!(book.get("BTCUSD"), Some(dec!(65100)));
        assert_eq!(book.get("ETHUSD"), Some(dec!(3200)));
        assert_eq!(book.snapshot().len(), 2);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let book = PriceBook::new();
        book.apply([update("BTCUSD", dec!(65000))]);
        let snap = book.snapshot();
        book.apply([update("BTCUSD", dec!(70000))]);
        assert_eq!(snap.get("BTCUSD"), Some(&dec!(65000)));
        assert_eq!(book.get("BTCUSD"), Some(dec!(70000)));
    }
}
