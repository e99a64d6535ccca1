//! Hyperliquid HIP-3 oracle submission.
//!
//! Builds, signs, and posts `perpDeploy.setOracle` actions for a
//! builder-deployed dex. Signing follows the exchange's L1 action scheme:
//! msgpack action hash, then an EIP-712 phantom agent signature.

pub mod action;
pub mod client;
pub mod error;
pub mod signer;

pub use action::{PerpDeployAction, SetOracle, SigningInput};
pub use client::{
    BoxFuture, ExchangeClient, OracleSubmitter, OracleUpdate, MAINNET_EXCHANGE_URL,
    TESTNET_EXCHANGE_URL,
};
pub use error::{VenueError, VenueResult};
pub use signer::{KeyError, KeyManager, KeySource, PhantomAgent, Signer, SignerError};
