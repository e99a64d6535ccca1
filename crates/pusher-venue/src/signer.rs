//! Hyperliquid L1 action signing.
//!
//! Two-stage scheme: compute the msgpack action hash, then sign a phantom
//! agent struct over it with EIP-712. The phantom agent's `source` field
//! selects mainnet ("a") or testnet ("b") verification.

use std::path::PathBuf;

use alloy::primitives::{Address, PrimitiveSignature, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as AlloySigner;
use alloy::sol;
use alloy::sol_types::eip712_domain;
use alloy::sol_types::SolStruct;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::action::SigningInput;

/// Source of the oracle private key.
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Load from environment variable (development).
    EnvVar { var_name: String },
    /// Load from file (production, recommend 0600 permissions).
    File { path: PathBuf },
}

/// Key management errors.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Failed to decode hex: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Address mismatch: expected {expected}, got {actual}")]
    AddressMismatch { expected: Address, actual: Address },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Holds the oracle signing key.
///
/// Security notes:
/// - The key is stored in `PrivateKeySigner`, which handles secure memory.
/// - Loaded once at startup; no runtime key rotation.
/// - Never log private key material.
pub struct KeyManager {
    signer: PrivateKeySigner,
    address: Address,
}

impl KeyManager {
    /// Load the key from the given source and verify the derived address
    /// against `expected_address` when one is configured.
    pub fn load(source: KeySource, expected_address: Option<Address>) -> Result<Self, KeyError> {
        // Supports 0x prefix and surrounding whitespace
        fn parse_hex_key(hex_str: &str) -> Result<Zeroizing<Vec<u8>>, KeyError> {
            let trimmed = hex_str.trim().trim_start_matches("0x");
            Ok(Zeroizing::new(hex::decode(trimmed)?))
        }

        let secret_bytes: Zeroizing<Vec<u8>> = match source {
            KeySource::EnvVar { ref var_name } => {
                let hex = std::env::var(var_name)
                    .map_err(|_| KeyError::EnvVarNotFound(var_name.clone()))?;
                parse_hex_key(&hex)?
            }
            KeySource::File { ref path } => {
                let content = std::fs::read_to_string(path)?;
                parse_hex_key(&content)?
            }
        };

        Self::from_bytes(&secret_bytes, expected_address)
    }

    /// Build from raw key bytes.
    pub fn from_bytes(
        secret_bytes: &[u8],
        expected_address: Option<Address>,
    ) -> Result<Self, KeyError> {
        let signer = PrivateKeySigner::from_slice(secret_bytes)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        if let Some(expected) = expected_address {
            if signer.address() != expected {
                return Err(KeyError::AddressMismatch {
                    expected,
                    actual: signer.address(),
                });
            }
        }

        Ok(Self {
            address: signer.address(),
            signer,
        })
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    /// The address derived from the loaded key.
    pub fn address(&self) -> Address {
        self.address
    }
}

/// EIP-712 domain constants.
pub const EIP712_DOMAIN_NAME: &str = "Exchange";
pub const EIP712_DOMAIN_VERSION: &str = "1";
pub const EIP712_CHAIN_ID: u64 = 1337;
pub const EIP712_VERIFYING_CONTRACT: Address = Address::ZERO;

sol! {
    #[derive(Debug)]
    struct Agent {
        string source;
        bytes32 connectionId;
    }
}

/// Phantom agent structure (EIP-712 signing target).
#[derive(Debug, Clone)]
pub struct PhantomAgent {
    /// "a" (mainnet) or "b" (testnet).
    pub source: String,
    /// The action hash.
    pub connection_id: B256,
}

impl PhantomAgent {
    pub fn new(action_hash: B256, is_mainnet: bool) -> Self {
        Self {
            source: if is_mainnet {
                "a".to_string()
            } else {
                "b".to_string()
            },
            connection_id: action_hash,
        }
    }

    /// Sign the phantom agent using EIP-712.
    ///
    /// Domain: `{name: "Exchange", version: "1", chainId: 1337,
    /// verifyingContract: 0x0}`, primary type `Agent`.
    pub async fn sign<S: AlloySigner + Send + Sync>(
        &self,
        signer: &S,
    ) -> Result<PrimitiveSignature, alloy::signers::Error> {
        let domain = eip712_domain! {
            name: EIP712_DOMAIN_NAME,
            version: EIP712_DOMAIN_VERSION,
            chain_id: EIP712_CHAIN_ID,
            verifying_contract: EIP712_VERIFYING_CONTRACT,
        };

        let agent = Agent {
            source: self.source.clone(),
            connectionId: self.connection_id,
        };

        let signing_hash = agent.eip712_signing_hash(&domain);
        signer.sign_hash(&signing_hash).await
    }
}

/// Signing errors.
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("Signing failed: {0}")]
    SigningFailed(#[from] alloy::signers::Error),

    #[error("Action serialization failed: {0}")]
    SerializationFailed(String),
}

/// Signer for oracle push actions.
pub struct Signer {
    key_manager: KeyManager,
    is_mainnet: bool,
}

impl Signer {
    pub fn new(key_manager: KeyManager, is_mainnet: bool) -> Self {
        Self {
            key_manager,
            is_mainnet,
        }
    }

    /// Sign an action: compute the action hash, then sign the phantom agent.
    pub async fn sign_action(&self, input: &SigningInput) -> Result<PrimitiveSignature, SignerError> {
        let action_hash = input.action_hash()?;
        let phantom_agent = PhantomAgent::new(action_hash, self.is_mainnet);
        // Do not log the signature, it is sensitive material
        let signature = phantom_agent.sign(self.key_manager.signer()).await?;
        Ok(signature)
    }

    pub fn address(&self) -> Address {
        self.key_manager.address()
    }

    pub fn is_mainnet(&self) -> bool {
        self.is_mainnet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (DO NOT use in production)
    const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn test_key_bytes() -> Vec<u8> {
        hex::decode(TEST_PRIVATE_KEY.trim_start_matches("0x")).unwrap()
    }

    #[test]
    fn test_key_manager_from_bytes() {
        let manager = KeyManager::from_bytes(&test_key_bytes(), None).unwrap();
        assert_eq!(
            format!("{:?}", manager.address()).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_key_manager_address_mismatch() {
        let result = KeyManager::from_bytes(&test_key_bytes(), Some(Address::ZERO));
        assert!(matches!(result, Err(KeyError::AddressMismatch { .. })));
    }

    #[test]
    fn test_key_manager_rejects_garbage() {
        assert!(matches!(
            KeyManager::from_bytes(&[0x01, 0x02], None),
            Err(KeyError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_phantom_agent_source() {
        let hash = B256::repeat_byte(0xab);
        assert_eq!(PhantomAgent::new(hash, true).source, "a");
        assert_eq!(PhantomAgent::new(hash, false).source, "b");
    }

    /// EIP-712 signature fixture cross-checked against the exchange's Python
    /// SDK: same key, same connection id, same expected r/s/v. ECDSA with
    /// RFC 6979 is deterministic, so these bytes are stable.
    #[tokio::test]
    async fn test_signature_matches_reference_sdk() {
        let signer = PrivateKeySigner::from_slice(&test_key_bytes()).unwrap();

        let action_hash = B256::from_slice(
            &hex::decode("f01fa6eaca0b8cbd2afe65f8852a2e00d35eae3d19560ece9b8a28614646e849")
                .unwrap(),
        );

        let phantom_agent = PhantomAgent::new(action_hash, false);
        let signature = phantom_agent.sign(&signer).await.unwrap();

        assert_eq!(
            hex::encode(signature.r().to_be_bytes::<32>()),
            "a9e728f2faea4febc0b6eb9c3dbbac04b375eb3869f051030d205318425faebc"
        );
        assert_eq!(
            hex::encode(signature.s().to_be_bytes::<32>()),
            "7b21be7030bb979352b71494708b99d789266f0d0e1242a21e74905b683e4698"
        );
        assert!(!signature.v());
    }

    #[tokio::test]
    async fn test_sign_action() {
        use crate::action::{PerpDeployAction, SigningInput};

        let manager = KeyManager::from_bytes(&test_key_bytes(), None).unwrap();
        let signer = Signer::new(manager, false);

        let input = SigningInput {
            action: PerpDeployAction::set_oracle(
                "xyz".to_string(),
                vec![("BTC".to_string(), "65000".to_string())],
                vec![vec![("BTC".to_string(), "65000".to_string())]],
                vec![("BTC".to_string(), "64990".to_string())],
            ),
            nonce: 1234567890,
        };

        let signature = signer.sign_action(&input).await.unwrap();
        assert!(!signature.r().is_zero());
        assert!(!signature.s().is_zero());
    }
}
