//! Application configuration.
//!
//! Loaded from a TOML file; secrets (feed auth token, oracle signing key)
//! are referenced by environment variable name so they never live in the
//! config file itself.

use crate::error::{AppError, AppResult};
use alloy::primitives::Address;
use pusher_core::{AssetSource, MarketDefinition};
use pusher_feed::FRAME_QUEUE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Dex configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexSettings {
    /// Name of the builder-deployed dex.
    pub name: String,
    /// Whether to target testnet. Default: false (mainnet).
    #[serde(default)]
    pub testnet: bool,
}

/// Feed connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Websocket URL of the subscribe endpoint.
    #[serde(default = "default_feed_url")]
    pub url: String,
    /// Environment variable holding the pre-encoded Basic auth token.
    #[serde(default = "default_auth_token_env")]
    pub auth_token_env: String,
    /// Attempt budget for consecutive connection failures. Default: 100.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff delay (ms). Default: 1000.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum backoff delay (ms). Default: 5000.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Frame queue capacity. Default: 10000.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_feed_url() -> String {
    "wss://api.jp.stork-oracle.network/evm/subscribe".to_string()
}

fn default_auth_token_env() -> String {
    "STORK_WS_AUTH".to_string()
}

fn default_max_retries() -> u32 {
    100
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_queue_capacity() -> usize {
    FRAME_QUEUE_CAPACITY
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            auth_token_env: default_auth_token_env(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Oracle signing key settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerSettings {
    /// Environment variable holding the hex private key.
    #[serde(default = "default_key_env")]
    pub key_env: String,
    /// Key file path; takes precedence over `key_env` when set.
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    /// If set, the derived address must match this.
    #[serde(default)]
    pub expected_address: Option<String>,
}

fn default_key_env() -> String {
    "HIP3_ORACLE_KEY".to_string()
}

impl Default for SignerSettings {
    fn default() -> Self {
        Self {
            key_env: default_key_env(),
            key_file: None,
            expected_address: None,
        }
    }
}

impl SignerSettings {
    pub fn key_source(&self) -> pusher_venue::KeySource {
        match &self.key_file {
            Some(path) => pusher_venue::KeySource::File { path: path.clone() },
            None => pusher_venue::KeySource::EnvVar {
                var_name: self.key_env.clone(),
            },
        }
    }

    pub fn expected_address(&self) -> AppResult<Option<Address>> {
        self.expected_address
            .as_deref()
            .map(|s| {
                s.parse::<Address>()
                    .map_err(|e| AppError::Config(format!("bad expected_address {s:?}: {e}")))
            })
            .transpose()
    }
}

/// Complete pusher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub dex: DexSettings,

    #[serde(default)]
    pub feed: FeedSettings,

    #[serde(default)]
    pub signer: SignerSettings,

    /// Flush cadence (ms). Default: 3000.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Per-task join grace on shutdown (ms). Default: 5000.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    /// Market catalog.
    pub markets: Vec<MarketDefinition>,
}

fn default_flush_interval_ms() -> u64 {
    3000
}

fn default_shutdown_grace_ms() -> u64 {
    5000
}

impl AppConfig {
    /// Load from a specific file and validate.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would only fail later at flush time.
    fn validate(&self) -> AppResult<()> {
        if self.dex.name.trim().is_empty() {
            return Err(AppError::Config("dex.name must not be empty".to_string()));
        }
        if self.markets.is_empty() {
            return Err(AppError::Config(
                "at least one market must be configured".to_string(),
            ));
        }
        if self.flush_interval_ms == 0 {
            return Err(AppError::Config(
                "flush_interval_ms must be positive".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for market in &self.markets {
            if market.name.trim().is_empty() {
                return Err(AppError::Config(
                    "market name must not be empty".to_string(),
                ));
            }
            if !names.insert(market.name.as_str()) {
                return Err(AppError::Config(format!(
                    "duplicate market name: {}",
                    market.name
                )));
            }
            for slot in market.slots() {
                match slot {
                    AssetSource::Stork { identifier } => {
                        if identifier.trim().is_empty() {
                            return Err(AppError::Config(format!(
                                "market {}: stork identifier must not be empty",
                                market.name
                            )));
                        }
                    }
                    AssetSource::Random { min, max } => {
                        if max < min {
                            return Err(AppError::Config(format!(
                                "market {}: random max must be >= min",
                                market.name
                            )));
                        }
                    }
                }
            }
        }

        // Parse failure surfaces at load, not at key load time
        self.signer.expected_address()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        flush_interval_ms = 3000

        [dex]
        name = "xyz"
        testnet = true

        [feed]
        url = "wss://feed.example.com/evm/subscribe"

        [[markets]]
        name = "BTCX"
        spot = { type = "stork", identifier = "BTCUSD" }
        mark = { type = "stork", identifier = "BTCUSD" }
        external = { type = "random", min = 10.0, max = 20.0 }
    "#;

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.dex.name, "xyz");
        assert!(config.dex.testnet);
        assert_eq!(config.feed.url, "wss://feed.example.com/evm/subscribe");
        assert_eq!(config.markets.len(), 1);
        assert_eq!(
            config.markets[0].spot,
            AssetSource::Stork {
                identifier: "BTCUSD".to_string()
            }
        );
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.flush_interval_ms, 3000);
        assert_eq!(config.shutdown_grace_ms, 5000);
        assert_eq!(config.feed.max_retries, 100);
        assert_eq!(config.feed.base_delay_ms, 1000);
        assert_eq!(config.feed.max_delay_ms, 5000);
        assert_eq!(config.feed.queue_capacity, 10_000);
        assert_eq!(config.feed.auth_token_env, "STORK_WS_AUTH");
        assert_eq!(config.signer.key_env, "HIP3_ORACLE_KEY");
    }

    #[test]
    fn test_rejects_empty_markets() {
        let toml = r#"
            markets = []

            [dex]
            name = "xyz"
        "#;
        assert!(matches!(
            AppConfig::from_toml(toml),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_market_names() {
        let toml = r#"
            [dex]
            name = "xyz"

            [[markets]]
            name = "BTCX"
            spot = { type = "stork", identifier = "BTCUSD" }
            mark = { type = "stork", identifier = "BTCUSD" }
            external = { type = "stork", identifier = "BTCUSD" }

            [[markets]]
            name = "BTCX"
            spot = { type = "stork", identifier = "BTCUSD" }
            mark = { type = "stork", identifier = "BTCUSD" }
            external = { type = "stork", identifier = "BTCUSD" }
        "#;
        let err = AppConfig::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("duplicate market name"));
    }

    #[test]
    fn test_rejects_inverted_random_range() {
        let toml = r#"
            [dex]
            name = "xyz"

            [[markets]]
            name = "RNDX"
            spot = { type = "random", min = 20.0, max = 10.0 }
            mark = { type = "random", min = 1.0, max = 2.0 }
            external = { type = "random", min = 1.0, max = 2.0 }
        "#;
        let err = AppConfig::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("random max must be >= min"));
    }

    #[test]
    fn test_rejects_blank_identifier() {
        let toml = r#"
            [dex]
            name = "xyz"

            [[markets]]
            name = "BTCX"
            spot = { type = "stork", identifier = "  " }
            mark = { type = "stork", identifier = "BTCUSD" }
            external = { type = "stork", identifier = "BTCUSD" }
        "#;
        assert!(AppConfig::from_toml(toml).is_err());
    }

    #[test]
    fn test_rejects_bad_expected_address() {
        let toml = r#"
            [dex]
            name = "xyz"

            [signer]
            expected_address = "not-an-address"

            [[markets]]
            name = "BTCX"
            spot = { type = "stork", identifier = "BTCUSD" }
            mark = { type = "stork", identifier = "BTCUSD" }
            external = { type = "stork", identifier = "BTCUSD" }
        "#;
        assert!(AppConfig::from_toml(toml).is_err());
    }

    #[test]
    fn test_key_source_prefers_file() {
        let settings = SignerSettings {
            key_env: "SOME_KEY".to_string(),
            key_file: Some(PathBuf::from("/run/secrets/oracle.key")),
            expected_address: None,
        };
        assert!(matches!(
            settings.key_source(),
            pusher_venue::KeySource::File { .. }
        ));

        let settings = SignerSettings::default();
        assert!(matches!(
            settings.key_source(),
            pusher_venue::KeySource::EnvVar { ref var_name } if var_name == "HIP3_ORACLE_KEY"
        ));
    }
}
