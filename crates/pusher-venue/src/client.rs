//! Exchange submission client.
//!
//! `OracleSubmitter` is the seam the flush coordinator drives; it sees only
//! an assembled `OracleUpdate` and an opaque success/failure result.
//! `ExchangeClient` is the real implementation: sign the action and POST it
//! to the exchange endpoint.

use std::pin::Pin;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::action::{PerpDeployAction, PricePair, SigningInput};
use crate::error::{VenueError, VenueResult};
use crate::signer::Signer;

pub const MAINNET_EXCHANGE_URL: &str = "https://api.hyperliquid.xyz/exchange";
pub const TESTNET_EXCHANGE_URL: &str = "https://api.hyperliquid-testnet.xyz/exchange";

/// Submissions are useless once the next flush has passed them by.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// One flush's worth of prices for a single dex, ready for submission.
///
/// Pair values are already rendered as decimal strings; `mark_pxs` carries
/// one singleton pair list per market in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleUpdate {
    pub dex: String,
    pub oracle_pxs: Vec<PricePair>,
    pub mark_pxs: Vec<Vec<PricePair>>,
    pub external_pxs: Vec<PricePair>,
}

/// Venue submission seam.
///
/// Dyn-compatible via `BoxFuture` so the coordinator can hold a
/// `dyn OracleSubmitter` and tests can substitute a recording stub.
pub trait OracleSubmitter: Send + Sync {
    fn submit_oracle(&self, update: OracleUpdate) -> BoxFuture<'_, VenueResult<()>>;
}

#[derive(Debug, Serialize)]
struct ExchangeRequest {
    action: PerpDeployAction,
    nonce: u64,
    signature: SignatureWire,
}

/// `{"r":"0x..","s":"0x..","v":27|28}`
#[derive(Debug, Serialize)]
struct SignatureWire {
    r: String,
    s: String,
    v: u64,
}

impl SignatureWire {
    fn from_signature(sig: &alloy::primitives::PrimitiveSignature) -> Self {
        Self {
            r: format!("0x{}", hex::encode(sig.r().to_be_bytes::<32>())),
            s: format!("0x{}", hex::encode(sig.s().to_be_bytes::<32>())),
            v: if sig.v() { 28 } else { 27 },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    status: String,
    #[serde(default)]
    response: serde_json::Value,
}

/// Signs and posts oracle updates to the exchange HTTP API.
pub struct ExchangeClient {
    http: reqwest::Client,
    signer: Signer,
    endpoint: String,
}

impl ExchangeClient {
    /// Endpoint follows the signer's network selection.
    pub fn new(signer: Signer) -> Self {
        let endpoint = if signer.is_mainnet() {
            MAINNET_EXCHANGE_URL
        } else {
            TESTNET_EXCHANGE_URL
        };
        Self::with_endpoint(signer, endpoint.to_string())
    }

    pub fn with_endpoint(signer: Signer, endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            signer,
            endpoint,
        }
    }

    async fn post_action(&self, update: OracleUpdate) -> VenueResult<()> {
        let dex = update.dex.clone();
        let markets = update.oracle_pxs.len();

        let action = PerpDeployAction::set_oracle(
            update.dex,
            update.oracle_pxs,
            update.mark_pxs,
            update.external_pxs,
        );

        // Millisecond wall-clock nonce, same scheme the exchange SDKs use.
        let nonce = Utc::now().timestamp_millis() as u64;
        let input = SigningInput { action, nonce };
        let signature = self.signer.sign_action(&input).await?;

        let request = ExchangeRequest {
            action: input.action,
            nonce,
            signature: SignatureWire::from_signature(&signature),
        };

        debug!(%dex, markets, nonce, endpoint = %self.endpoint, "Posting setOracle action");

        let response = self
            .http
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(VenueError::Rejected(format!("HTTP {status}: {body}")));
        }

        let parsed: ExchangeResponse = serde_json::from_str(&body)
            .map_err(|e| VenueError::BadResponse(format!("{e}: {body}")))?;
        match parsed.status.as_str() {
            "ok" => {
                info!(%dex, markets, nonce, "Oracle update accepted");
                Ok(())
            }
            _ => {
                warn!(%dex, nonce, response = %parsed.response, "Oracle update rejected");
                Err(VenueError::Rejected(parsed.response.to_string()))
            }
        }
    }
}

impl OracleSubmitter for ExchangeClient {
    fn submit_oracle(&self, update: OracleUpdate) -> BoxFuture<'_, VenueResult<()>> {
        Box::pin(self.post_action(update))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::PrimitiveSignature;
    use alloy::primitives::U256;

    #[test]
    fn test_signature_wire_v_mapping() {
        let sig = PrimitiveSignature::new(U256::from(1), U256::from(2), false);
        let wire = SignatureWire::from_signature(&sig);
        assert_eq!(wire.v, 27);
        assert_eq!(
            wire.r,
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        );

        let sig = PrimitiveSignature::new(U256::from(1), U256::from(2), true);
        assert_eq!(SignatureWire::from_signature(&sig).v, 28);
    }

    #[test]
    fn test_exchange_request_shape() {
        let sig = PrimitiveSignature::new(U256::from(1), U256::from(2), false);
        let request = ExchangeRequest {
            action: PerpDeployAction::set_oracle(
                "xyz".to_string(),
                vec![("BTC".to_string(), "65000".to_string())],
                vec![vec![("BTC".to_string(), "65000".to_string())]],
                vec![("BTC".to_string(), "64990".to_string())],
            ),
            nonce: 1700000000000,
            signature: SignatureWire::from_signature(&sig),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["action"]["type"], "perpDeploy");
        assert_eq!(json["nonce"], 1700000000000u64);
        assert_eq!(json["signature"]["v"], 27);
        assert_eq!(json["action"]["setOracle"]["dex"], "xyz");
    }

    #[test]
    fn test_exchange_response_parsing() {
        let ok: ExchangeResponse =
            serde_json::from_str(r#"{"status":"ok","response":{"type":"default"}}"#).unwrap();
        assert_eq!(ok.status, "ok");

        let err: ExchangeResponse =
            serde_json::from_str(r#"{"status":"err","response":"Oracle update too old"}"#).unwrap();
        assert_eq!(err.status, "err");
        assert_eq!(err.response, "Oracle update too old");
    }

    #[test]
    fn test_endpoint_follows_network() {
        use crate::signer::{KeyManager, Signer};
        let key = hex::decode("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
            .unwrap();

        let mainnet = ExchangeClient::new(Signer::new(
            KeyManager::from_bytes(&key, None).unwrap(),
            true,
        ));
        assert_eq!(mainnet.endpoint, MAINNET_EXCHANGE_URL);

        let testnet = ExchangeClient::new(Signer::new(
            KeyManager::from_bytes(&key, None).unwrap(),
            false,
        ));
        assert_eq!(testnet.endpoint, TESTNET_EXCHANGE_URL);
    }
}
