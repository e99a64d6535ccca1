//! `perpDeploy.setOracle` wire format and action hashing.
//!
//! IMPORTANT: msgpack field order must match the exchange's reference SDK
//! exactly. Different order = different hash = signature verification failure.
//! Struct field order here is the wire order; `Option` fields do not appear.

use crate::signer::SignerError;
use alloy::primitives::{keccak256, B256};
use serde::Serialize;

/// A price pair as it appears on the wire: `["COIN", "123.45"]`.
pub type PricePair = (String, String);

/// Top-level L1 action: `{"type":"perpDeploy","setOracle":{...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct PerpDeployAction {
    #[serde(rename = "type")]
    pub action_type: String,

    #[serde(rename = "setOracle")]
    pub set_oracle: SetOracle,
}

/// The setOracle payload.
///
/// `oracle_pxs` and `external_perp_pxs` are sorted by coin; `mark_pxs` is a
/// list of per-market singleton pair lists in market catalog order.
#[derive(Debug, Clone, Serialize)]
pub struct SetOracle {
    pub dex: String,

    #[serde(rename = "oraclePxs")]
    pub oracle_pxs: Vec<PricePair>,

    #[serde(rename = "markPxs")]
    pub mark_pxs: Vec<Vec<PricePair>>,

    #[serde(rename = "externalPerpPxs")]
    pub external_perp_pxs: Vec<PricePair>,
}

impl PerpDeployAction {
    /// Build a setOracle action, enforcing the sort invariants the exchange
    /// expects regardless of the order the caller assembled the pairs in.
    pub fn set_oracle(
        dex: String,
        mut oracle_pxs: Vec<PricePair>,
        mut mark_pxs: Vec<Vec<PricePair>>,
        mut external_perp_pxs: Vec<PricePair>,
    ) -> Self {
        oracle_pxs.sort_by(|a, b| a.0.cmp(&b.0));
        external_perp_pxs.sort_by(|a, b| a.0.cmp(&b.0));
        for pairs in &mut mark_pxs {
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
        }
        Self {
            action_type: "perpDeploy".to_string(),
            set_oracle: SetOracle {
                dex,
                oracle_pxs,
                mark_pxs,
                external_perp_pxs,
            },
        }
    }
}

/// Signing input parameters.
#[derive(Debug, Clone)]
pub struct SigningInput {
    pub action: PerpDeployAction,
    pub nonce: u64,
}

impl SigningInput {
    /// Calculate the action hash: `keccak256(msgpack(action) || nonce_be || 0x00)`.
    ///
    /// The trailing byte is the empty vault-address tag; oracle pushes are
    /// never vault actions.
    pub fn action_hash(&self) -> Result<B256, SignerError> {
        let mut data = rmp_serde::to_vec_named(&self.action)
            .map_err(|e| SignerError::SerializationFailed(e.to_string()))?;
        data.extend_from_slice(&self.nonce.to_be_bytes());
        data.push(0x00);
        Ok(keccak256(&data))
    }
}
