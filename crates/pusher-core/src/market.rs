//! Market definitions.
//!
//! A market is a named trio of price slots (spot/mark/external) published to
//! the venue under a single market name. Each slot resolves either from a
//! live Stork feed asset or from a random range drawn fresh at every flush.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where a price slot's value comes from.
///
/// Closed sum type: every resolution site matches exhaustively, so adding a
/// variant is a compile-time-visible change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AssetSource {
    /// A Stork feed asset identifier (e.g., "BTCUSD").
    Stork { identifier: String },
    /// A fresh uniform draw in `[min, max]`, independent per slot and flush.
    Random { min: Decimal, max: Decimal },
}

/// A market published to the venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDefinition {
    /// Market name, unique across the catalog (enforced at config load).
    pub name: String,
    /// Source for the oracle price set entry.
    pub spot: AssetSource,
    /// Source for the mark price set entry.
    pub mark: AssetSource,
    /// Source for the external price set entry.
    pub external: AssetSource,
}

impl MarketDefinition {
    /// The three slots in venue submission order.
    pub fn slots(&self) -> [&AssetSource; 3] {
        [&self.spot, &self.mark, &self.external]
    }
}

/// Collect the distinct Stork identifiers referenced anywhere in the catalog,
/// in first-seen order. The subscribe request must list each asset at most
/// once even when multiple markets or slots reference it.
pub fn feed_assets(markets: &[MarketDefinition]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut assets = Vec::new();
    for market in markets {
        for slot in market.slots() {
            if let AssetSource::Stork { identifier } = slot {
                if seen.insert(identifier.clone()) {
                    assets.push(identifier.clone());
                }
            }
        }
    }
    assets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stork(id: &str) -> AssetSource {
        AssetSource::Stork {
            identifier: id.to_string(),
        }
    }

    fn market(name: &str, spot: AssetSource, mark: AssetSource, external: AssetSource) -> MarketDefinition {
        MarketDefinition {
            name: name.to_string(),
            spot,
            mark,
            external,
        }
    }

    #[test]
    fn test_feed_assets_dedup_across_markets_and_slots() {
        let markets = vec![
            market("BTCX", stork("BTCUSD"), stork("BTCUSD"), stork("BTCUSD")),
            market(
                "ETHX",
                stork("ETHUSD"),
                stork("BTCUSD"),
                AssetSource::Random {
                    min: dec!(10),
                    max: dec!(20),
                },
            ),
        ];

        let assets = feed_assets(&markets);
        assert_eq!(assets, vec!["BTCUSD".to_string(), "ETHUSD".to_string()]);
    }

    #[test]
    fn test_feed_assets_empty_for_all_random() {
        let markets = vec![market(
            "RNDX",
            AssetSource::Random {
                min: dec!(1),
                max: dec!(2),
            },
            AssetSource::Random {
                min: dec!(1),
                max: dec!(2),
            },
            AssetSource::Random {
                min: dec!(1),
                max: dec!(2),
            },
        )];

        assert!(feed_assets(&markets).is_empty());
    }

    #[test]
    fn test_asset_source_toml_tagged() {
        let src: AssetSource = toml::from_str(
            r#"
            type = "stork"
            identifier = "BTCUSD"
            "#,
        )
        .unwrap();
        assert_eq!(src, stork("BTCUSD"));

        let src: AssetSource = toml::from_str(
            r#"
            type = "random"
            min = 10.0
            max = 20.0
            "#,
        )
        .unwrap();
        assert_eq!(
            src,
            AssetSource::Random {
                min: dec!(10.0),
                max: dec!(20.0),
            }
        );
    }
}
